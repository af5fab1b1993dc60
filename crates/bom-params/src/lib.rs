//! bom-params: parameter frames for engineering objects.
//!
//! Every node of a bill of materials owns one `ParameterFrame`. A frame stores
//! named, immutable `Parameter` snapshots with a uniform set of descriptive
//! fields. Two kinds exist:
//! - `Flex`: values are stored as given
//! - `UnitChecked`: values carry a unit whose dimension class is fixed once known
//!
//! # Example
//!
//! ```
//! use bom_params::{FrameOptions, ParameterFrame};
//! use serde_json::json;
//!
//! let mut frame = ParameterFrame::new(FrameOptions::default());
//! frame.set("mass", json!("12 kg")).unwrap();
//! assert_eq!(frame.get("mass").unwrap(), &json!(12.0));
//! assert!(frame.set("mass", json!("3 m")).is_err());
//! ```

pub mod error;
pub mod frame;
pub mod parameter;

pub use error::{ParamError, ParamResult};
pub use frame::{FrameKind, FrameOptions, ParameterFrame};
pub use parameter::Parameter;
