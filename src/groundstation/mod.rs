//! Ground station
//!
//! Terminal sink of the mesh: accepts relayed envelopes, appends them to a
//! line-delimited log and serves the stored position reports read-only.

mod error;
mod server;
mod storage;

pub use error::{GroundStationError, GroundStationResult};
pub use server::GroundStation;
pub use storage::MessageLog;
