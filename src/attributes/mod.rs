//! Attribute namespace
//!
//! - [`ids`]: numeric IDs and the built-in ownership table
//! - [`registry`]: the checked routing table built from it

pub mod ids;
pub mod registry;

pub use registry::{AttributeKind, AttributeRegistry, Backend, NamedAttribute, RangeEntry};
