//! bom-skeleton: template catalogs and the flat skeleton they resolve into.
//!
//! A catalog maps type names to templates. The builder expands a root part into
//! a flat `Skeleton` (reference -> record), resolving `inherits` chains and
//! grafting parameter sets. The mutator applies a settings document on top:
//! structural part changes, module requirements, defaults, material binding and
//! storage.

pub mod builder;
pub mod catalog;
pub mod document;
pub mod merge;
pub mod mutator;
pub mod settings;
pub mod validate;

pub use builder::{
    BuildOptions, add_bones, build_skeleton, graft_params, inherit, merge_child_definition, spine,
};
pub use catalog::{Catalog, ParameterSets, Skeleton};
pub use document::{load_and_merge, load_document};
pub use merge::{deep_merge, merge_records, merge_records_distinct};
pub use mutator::{Pools, SkeletonMutator};
pub use settings::{ConfigView, ModuleDef, Modules, Section, Settings, TopRef};
pub use validate::{CatalogIssue, validate_catalog};

use bom_materials::MaterialError;

pub type SkeletonResult<T> = Result<T, SkeletonError>;

#[derive(thiserror::Error, Debug)]
pub enum SkeletonError {
    #[error("Template '{name}' not found in catalog (needed by {needed_by})")]
    MissingTemplate { name: String, needed_by: String },

    #[error("Cyclic inheritance: {}", .chain.join(" -> "))]
    InheritanceCycle { chain: Vec<String> },

    #[error("Part '{reference}' is its own ancestor: {}", .path.join(" -> "))]
    HierarchyCycle { reference: String, path: Vec<String> },

    #[error("Parameter set '{name}' requested by '{reference}' does not exist")]
    UnknownParameterSet { name: String, reference: String },

    #[error("{reference} is not in the skeleton (required by module '{module}')")]
    ModuleRequirementMissing { module: String, reference: String },

    #[error("Configuration incomplete: {what}")]
    ConfigurationIncomplete { what: String },

    #[error("Invalid document: {what}")]
    InvalidDocument { what: String },

    #[error("Material error: {0}")]
    Material(#[from] MaterialError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
