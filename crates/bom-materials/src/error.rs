//! Material errors.

use thiserror::Error;

pub type MaterialResult<T> = Result<T, MaterialError>;

#[derive(Error, Debug)]
pub enum MaterialError {
    /// No backend in the priority order knows the material.
    #[error("{material} doesn't exist in any material database {searched:?}")]
    MaterialNotFound {
        material: String,
        searched: Vec<String>,
    },

    /// A backend knows the material but holds no value for the property.
    #[error("{material} {property} not in {backend}: {reason}")]
    DataAbsent {
        material: String,
        property: String,
        backend: String,
        reason: String,
    },

    /// Every candidate backend was tried.
    #[error("cannot find {property} for {material}")]
    PropertyNotFound { material: String, property: String },

    #[error("Unknown material backend '{class_str}'")]
    UnknownBackend { class_str: String },

    #[error("Invalid arguments for backend '{backend}': {what}")]
    InvalidArgs { backend: String, what: String },

    #[error("Invalid material record: {what}")]
    InvalidRecord { what: String },

    #[error("Backend error: {message}")]
    Backend { message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = MaterialError::PropertyNotFound {
            material: "Tungsten".into(),
            property: "density".into(),
        };
        assert_eq!(err.to_string(), "cannot find density for Tungsten");

        let err = MaterialError::UnknownBackend {
            class_str: "asme".into(),
        };
        assert!(err.to_string().contains("asme"));
    }
}
