//! bom-materials: material records and the priority-ordered material selector.
//!
//! Provides:
//! - `MaterialRecord`: a named material at a temperature, pressure and irradiation
//! - `MaterialBackend` trait for pluggable property sources
//! - `table` backend (property x material table, inline or from JSON)
//! - `coolprop` backend for pure fluids (via `rfluids`)
//! - `MaterialSelector`: picks the first backend that knows a material and falls
//!   back along the priority order when a property is missing
//!
//! # Example
//!
//! ```
//! use bom_materials::{BackendDescriptor, MaterialSelector};
//! use serde_json::json;
//!
//! let mut selector = MaterialSelector::new();
//! selector
//!     .add_backend(BackendDescriptor::from_value(&json!({
//!         "class_str": ["table"],
//!         "data": {"table": {"Steel": {"density": 7800.0}, "units": {"density": "kg/m^3"}}}
//!     })).unwrap())
//!     .unwrap();
//!
//! let steel = selector.select("Steel").unwrap();
//! let rho = steel.extract("density", &selector).unwrap();
//! assert_eq!(rho.value, 7800.0);
//! ```

pub mod backend;
pub mod coolprop;
pub mod error;
pub mod record;
pub mod selector;
pub mod table;

pub use backend::{BackendDescriptor, BackendFactory, BackendRegistry, MaterialBackend};
pub use coolprop::CoolPropBackend;
pub use error::{MaterialError, MaterialResult};
pub use record::MaterialRecord;
pub use selector::{BoundMaterial, MaterialSelector};
pub use table::TableBackend;
