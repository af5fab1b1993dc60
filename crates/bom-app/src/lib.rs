//! Shared application layer for bomflow.
//!
//! Ties the pieces together for the CLI: a `Configuration` read from a YAML or
//! JSON document, and a `Framework` that turns configuration, settings and
//! skeletons into a live bill of materials.

pub mod config;
pub mod error;
pub mod framework;

pub use config::{ConfigDef, Configuration, Locations};
pub use error::{AppError, AppResult};
pub use framework::Framework;
