use thiserror::Error;

pub type UnitResult<T> = Result<T, UnitError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum UnitError {
    #[error("Could not parse quantity from '{text}'")]
    Parse { text: String },

    #[error("Unknown unit '{unit}'")]
    UnknownUnit { unit: String },

    #[error("Malformed unit expression '{expr}': {reason}")]
    Malformed { expr: String, reason: &'static str },

    #[error("Offset unit '{unit}' cannot be combined with other units")]
    OffsetInCompound { unit: String },

    #[error("Cannot convert '{from}' to '{to}': dimensions differ")]
    Incompatible { from: String, to: String },

    #[error("Non-finite numeric value for {what}: {value}")]
    NonFinite { what: &'static str, value: f64 },
}
