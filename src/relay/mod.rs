//! Store-and-forward relay module
//!
//! Each satellite runs a relay node that accepts one message per request
//! and floods it across the mesh toward its destination.
//!
//! Key features:
//! - Hop budget (TTL) decremented once per relay hop
//! - Per-link simulated latency and loss
//! - Direct hand-off to the ground station from up-linked nodes
//! - Fire-and-forget fan-out with a bounded number of concurrent sends

pub mod error;
pub mod flood;
pub mod node;
mod stats;
pub mod transport;
pub mod types;

pub use error::{RelayError, RelayResult};
pub use flood::{FloodController, FloodHandle};
pub use node::{RelayNode, RelayNodeBuilder};
pub use transport::{HttpTransport, LinkTransport};
pub use types::{Disposition, LinkOutcome, LinkStats, RelayConfig, RelayEvent, RelayStats};
