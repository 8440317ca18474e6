//! Relay types and configuration

use crate::message::Message;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Configuration for a relay node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Identifier of this node in the topology registry
    pub node_id: String,

    /// Ground-station ingress as "host:port", if one is reachable at all
    pub ground_station: Option<String>,

    /// Upper bound on a single outbound HTTP send
    pub send_timeout: Duration,

    /// Maximum number of outbound sends in flight from this node
    pub max_outbound_sends: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            node_id: "satellite".to_string(),
            ground_station: None,
            send_timeout: Duration::from_secs(5),
            max_outbound_sends: 64,
        }
    }
}

/// What the ingress decided to do with an accepted message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// This node is the destination
    Delivered,

    /// Hop budget spent and handed to the flood controller
    Forwarding,

    /// Hop budget already exhausted on arrival
    Expired,
}

/// Result of one outbound send attempt across a link
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkOutcome {
    Delivered,

    /// Dropped by the simulated loss draw; nothing was sent
    Lost,

    /// Connection error or non-success response
    Failed(String),
}

/// Events emitted by a relay node
#[derive(Debug, Clone)]
pub enum RelayEvent {
    /// A message addressed to this node arrived
    Delivered { message: Message },

    /// A message arrived with no hop budget left
    Expired { message_id: i64, source: String },

    /// A neighbor accepted the message
    Forwarded {
        message_id: i64,
        to: String,
        ttl: i32,
    },

    /// The loss draw dropped the message on the way to a neighbor
    Lost { message_id: i64, to: String },

    /// An outbound send failed
    SendFailed {
        message_id: i64,
        to: String,
        reason: String,
    },

    /// The ground station accepted the message from this node
    GroundStationDelivered { message_id: i64, ttl: i32 },
}

/// Per-neighbor counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkStats {
    pub forwarded: u64,
    pub lost: u64,
    pub failed: u64,
}

impl LinkStats {
    pub fn attempts(&self) -> u64 {
        self.forwarded + self.lost + self.failed
    }
}

/// Statistics for a relay node
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RelayStats {
    /// Messages accepted at the ingress
    pub messages_received: u64,

    /// Malformed bodies rejected at the ingress
    pub messages_rejected: u64,

    /// Messages addressed to this node
    pub messages_delivered: u64,

    /// Messages dropped because their hop budget ran out
    pub messages_expired: u64,

    /// Sends accepted by a neighbor
    pub messages_forwarded: u64,

    /// Sends dropped by the loss draw
    pub messages_lost: u64,

    /// Sends that failed (connection error, non-success status)
    pub send_failures: u64,

    /// Messages accepted by the ground station from this node
    pub ground_station_deliveries: u64,

    /// Counters keyed by neighbor id
    pub links: BTreeMap<String, LinkStats>,
}

impl RelayStats {
    /// Share of link traversals that were not lost or failed
    pub fn link_success_rate(&self) -> f64 {
        let total = self.messages_forwarded + self.messages_lost + self.send_failures;
        if total == 0 {
            return 100.0;
        }
        self.messages_forwarded as f64 / total as f64 * 100.0
    }
}

impl std::fmt::Display for RelayStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Relay: {} recv, {} fwd, {} lost, {} failed ({:.1}% link success), {} expired, {} to ground",
            self.messages_received,
            self.messages_forwarded,
            self.messages_lost,
            self.send_failures,
            self.link_success_rate(),
            self.messages_expired,
            self.ground_station_deliveries
        )
    }
}
