use crate::config::ConfigError;
use crate::relay::RelayError;
use crate::topology::TopologyError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimulationError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Topology error: {0}")]
    Topology(#[from] TopologyError),

    #[error("Relay error: {0}")]
    Relay(#[from] RelayError),

    #[error("Invalid address {addr}: {reason}")]
    InvalidAddress { addr: String, reason: String },

    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
}

pub type SimulationResult<T> = Result<T, SimulationError>;
