//! Graph errors.

use bom_core::NodeId;
use bom_materials::MaterialError;
use bom_params::ParamError;

pub type GraphResult<T> = Result<T, GraphError>;

#[derive(thiserror::Error, Debug)]
pub enum GraphError {
    #[error("{reference} has already been used but instances are not the same")]
    DuplicateReference { reference: String },

    #[error("No record for '{reference}' in the skeleton")]
    MissingRecord { reference: String },

    #[error("'{reference}' is not a child of '{parent}'")]
    UnknownReference { reference: String, parent: String },

    #[error("Node {id} does not belong to this bill of materials")]
    UnknownNode { id: NodeId },

    #[error("'{reference}' is not an assembly and cannot hold children")]
    NotAnAssembly { reference: String },

    #[error("Attaching '{reference}' would make it its own ancestor")]
    HierarchyCycle { reference: String },

    #[error("Cannot attach '{current}' as '{requested}' while it has parents")]
    ReferenceMismatch { requested: String, current: String },

    #[error("No node class registered for {class_str}")]
    UnknownNodeClass { class_str: String },

    #[error("Invalid record for '{reference}': {what}")]
    InvalidRecord { reference: String, what: String },

    #[error("Parameter error: {0}")]
    Param(#[from] ParamError),

    #[error("Material error: {0}")]
    Material(#[from] MaterialError),
}
