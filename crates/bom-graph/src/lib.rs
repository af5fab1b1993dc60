//! bom-graph: the live engineering object graph of a bill of materials.
//!
//! Provides:
//! - `Bom`: an arena of nodes addressed by `NodeId`
//! - master registries shared by every node of a connected graph, so a reference
//!   names exactly one node
//! - attach/detach with multiplicity counts
//! - bidirectional conversion to the flat `Skeleton` form
//!
//! # Example
//!
//! ```
//! use bom_graph::Bom;
//!
//! let mut bom = Bom::default();
//! let car = bom.add_assembly("car");
//! let wheel = bom.add_component("wheel");
//! for _ in 0..4 {
//!     bom.attach(car, wheel, None).unwrap();
//! }
//!
//! assert_eq!(bom.count_ref(car, "wheel").unwrap(), 4);
//! let skeleton = bom.to_skeleton(car).unwrap();
//! assert_eq!(skeleton.get("car").unwrap()["children"]["wheel"]["count"], 4);
//! ```

pub mod bom;
pub mod construct;
pub mod error;
pub mod node;
pub mod query;
pub mod serialize;

pub use bom::{Bom, GraphOptions, Registry};
pub use error::{GraphError, GraphResult};
pub use node::{Node, NodeClasses, NodeFactory, NodeKind};
pub use query::Lookup;
