//! Parameter frame errors.

use bom_core::UnitError;
use thiserror::Error;

pub type ParamResult<T> = Result<T, ParamError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParamError {
    /// Reading an undeclared parameter, or adding one to a restricted frame.
    #[error("Parameter '{var}' does not exist in parameters {available:?}")]
    MissingParameter { var: String, available: Vec<String> },

    #[error("Parameter '{var}' has no field '{field}'")]
    MissingField { var: String, field: String },

    /// A unit-checked parameter may not change its dimension class.
    #[error("Parameter '{var}' cannot change dimensionality from '{from}' to '{to}'")]
    DimensionalityViolation {
        var: String,
        from: String,
        to: String,
    },

    #[error("Parameter '{var}' has an unusable unit: {source}")]
    UnknownUnit { var: String, source: UnitError },

    #[error("Invalid parameter: {what}")]
    InvalidParameter { what: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = ParamError::DimensionalityViolation {
            var: "length".into(),
            from: "m".into(),
            to: "s".into(),
        };
        assert!(err.to_string().contains("length"));

        let err = ParamError::UnknownUnit {
            var: "mass".into(),
            source: UnitError::UnknownUnit {
                unit: "stone".into(),
            },
        };
        assert!(err.to_string().contains("stone"));
    }
}
