//! Simulation configuration
//!
//! Loaded once from a JSON file and handed to each component explicitly.

mod error;
mod types;

pub use error::{ConfigError, ConfigResult};
pub use types::{
    NeighborConfig, RelayTuning, SatelliteConfig, SimulationConfig, VesselDefaults,
    VesselEntry,
};
