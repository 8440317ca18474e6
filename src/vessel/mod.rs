//! Vessel simulator
//!
//! Vessels drift around and periodically push a position report to their
//! associated satellite. They sit outside the mesh and never relay.

mod simulator;

pub use simulator::{Vessel, VesselConfig};
