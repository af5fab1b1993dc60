//! bom-core: stable foundation for the bill-of-materials workspace.
//!
//! Contains:
//! - units (uom SI types for material state + runtime dimension classes for unit strings)
//! - ids (compact arena identifiers for graph nodes and registries)
//! - record (schema-flexible JSON records shared by skeletons and templates)
//! - error (unit parsing errors)

pub mod error;
pub mod ids;
pub mod record;
pub mod units;

// Re-exports: nice ergonomics for downstream crates
pub use error::{UnitError, UnitResult};
pub use ids::*;
pub use record::{Record, Value, type_name};
pub use units::{Dimension, Quantity, Unit, parse_quantity, parse_unit};
