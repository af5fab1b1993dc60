//! Schema-flexible records.
//!
//! Templates, skeleton entries and parameter dumps all carry arbitrary literal
//! fields next to the structural ones, so they are kept as JSON objects.

pub use serde_json::Value;

/// A JSON object keyed by field name.
pub type Record = serde_json::Map<String, Value>;

/// Short name of a value's JSON type, used in merge warnings.
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "mapping",
    }
}
