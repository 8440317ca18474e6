//! Whole-mesh orchestration
//!
//! Builds the topology from a [`SimulationConfig`](crate::config::SimulationConfig)
//! and starts the ground station, every satellite and every vessel.

mod error;
mod runner;

pub use error::{SimulationError, SimulationResult};
pub use runner::{build_registry, RunningSimulation, Simulation};
