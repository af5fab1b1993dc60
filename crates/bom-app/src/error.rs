//! Error types for the bom-app service layer.

use std::path::PathBuf;

/// Application error type wrapping the errors of the library crates.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Configuration incomplete: {what}")]
    ConfigurationIncomplete { what: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Failed to read configuration file: {path}")]
    ConfigFileRead {
        path: PathBuf,
        source: bom_skeleton::SkeletonError,
    },

    #[error("Failed to write {path}")]
    FileWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Skeleton error: {0}")]
    Skeleton(#[from] bom_skeleton::SkeletonError),

    #[error("Graph error: {0}")]
    Graph(#[from] bom_graph::GraphError),

    #[error("Material error: {0}")]
    Material(#[from] bom_materials::MaterialError),

    #[error("Parameter error: {0}")]
    Param(#[from] bom_params::ParamError),

    #[error("Serialization error: {0}")]
    Serialize(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for bom-app operations.
pub type AppResult<T> = Result<T, AppError>;

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialize(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialize(err.to_string())
    }
}
