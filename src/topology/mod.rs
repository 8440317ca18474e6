//! Satellite topology registry
//!
//! Holds every relay node and the symmetric link table between them.
//! All reads and writes go through a single exclusive lock.

mod error;
mod registry;
mod types;

pub use error::{TopologyError, TopologyResult};
pub use registry::TopologyRegistry;
pub use types::{LinkParams, NeighborRoute, Node, NodeStatus};
