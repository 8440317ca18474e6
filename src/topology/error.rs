use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TopologyError {
    #[error("Node not found: {0}")]
    NodeNotFound(String),

    #[error("Loss probability {0} outside [0, 1]")]
    InvalidLossProbability(f64),

    #[error("Cannot link node {0} to itself")]
    SelfLink(String),
}

pub type TopologyResult<T> = Result<T, TopologyError>;
