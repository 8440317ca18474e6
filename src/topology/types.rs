use crate::topology::error::{TopologyError, TopologyResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

/// Simulated characteristics of one link
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinkParams {
    /// Transmission delay applied before every send across the link
    pub latency: Duration,

    /// Probability in [0, 1] that a send across the link is lost
    pub loss_probability: f64,
}

impl LinkParams {
    /// Create link parameters, rejecting a loss probability outside [0, 1]
    pub fn new(latency: Duration, loss_probability: f64) -> TopologyResult<Self> {
        if !(0.0..=1.0).contains(&loss_probability) {
            return Err(TopologyError::InvalidLossProbability(loss_probability));
        }
        Ok(Self {
            latency,
            loss_probability,
        })
    }

    /// A zero-latency, lossless link
    pub fn perfect() -> Self {
        Self {
            latency: Duration::ZERO,
            loss_probability: 0.0,
        }
    }

    /// Whether a uniform draw in [0, 1) makes it across this link
    pub fn survives(&self, draw: f64) -> bool {
        draw > self.loss_probability
    }
}

impl fmt::Display for LinkParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "latency {}ms, loss {:.2}",
            self.latency.as_millis(),
            self.loss_probability
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NodeStatus {
    #[default]
    Active,
    Failed,
}

/// A relay satellite as known to the registry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Unique identifier
    pub id: String,

    /// Address the node's ingress listens on
    pub addr: SocketAddr,

    /// Neighbor id -> link parameters. The keys are the adjacency list.
    pub links: BTreeMap<String, LinkParams>,

    pub status: NodeStatus,

    /// Whether the node can deliver straight to the ground station
    pub ground_uplink: bool,
}

impl Node {
    /// Create an active, up-linked node with no links
    pub fn new(id: impl Into<String>, addr: SocketAddr) -> Self {
        Self {
            id: id.into(),
            addr,
            links: BTreeMap::new(),
            status: NodeStatus::Active,
            ground_uplink: true,
        }
    }

    pub fn with_ground_uplink(mut self, uplink: bool) -> Self {
        self.ground_uplink = uplink;
        self
    }

    /// Pre-populate a link; the registry mirrors it when the node is added
    pub fn with_link(mut self, neighbor: impl Into<String>, params: LinkParams) -> Self {
        self.links.insert(neighbor.into(), params);
        self
    }
}

/// Snapshot of one outgoing edge, resolved under the registry lock
#[derive(Debug, Clone, PartialEq)]
pub struct NeighborRoute {
    pub neighbor_id: String,
    pub addr: SocketAddr,
    pub status: NodeStatus,
    pub link: LinkParams,
}
