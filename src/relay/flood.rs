//! Flood controller
//!
//! Fans a message out to every active neighbor of one node. Each link
//! traversal runs as its own task: it waits out the link latency, draws
//! against the link's loss probability and, if the draw survives, posts the
//! message to the neighbor's ingress, which floods again from there.
//!
//! The visited set only lives for one `forward` call and is never sent
//! along with the message, so a message can come back to a node through
//! another path. The hop budget is what bounds propagation.

use crate::message::Message;
use crate::metrics;
use crate::relay::error::{RelayError, RelayResult};
use crate::relay::stats::RelayCounters;
use crate::relay::transport::LinkTransport;
use crate::relay::types::{LinkOutcome, RelayEvent};
use crate::topology::{NeighborRoute, NodeStatus, TopologyRegistry};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinHandle;

/// Outbound sends started by one forwarding call
#[derive(Debug, Default)]
pub struct FloodHandle {
    sends: Vec<JoinHandle<LinkOutcome>>,
}

impl FloodHandle {
    pub fn is_empty(&self) -> bool {
        self.sends.is_empty()
    }

    /// Number of link traversals started
    pub fn len(&self) -> usize {
        self.sends.len()
    }

    /// Wait for every traversal. Dropping the handle instead leaves them running.
    pub async fn join(self) -> Vec<LinkOutcome> {
        let mut outcomes = Vec::with_capacity(self.sends.len());
        for send in self.sends {
            outcomes.push(
                send.await
                    .unwrap_or_else(|e| LinkOutcome::Failed(format!("send task failed: {e}"))),
            );
        }
        outcomes
    }
}

/// Per-node forwarding logic
#[derive(Clone)]
pub struct FloodController {
    node_id: String,
    registry: Arc<TopologyRegistry>,
    transport: Arc<dyn LinkTransport>,
    ground_station: Option<String>,
    send_permits: Arc<Semaphore>,
    counters: Arc<RelayCounters>,
    events: Option<mpsc::Sender<RelayEvent>>,
}

impl FloodController {
    pub fn new(
        node_id: impl Into<String>,
        registry: Arc<TopologyRegistry>,
        transport: Arc<dyn LinkTransport>,
        ground_station: Option<String>,
        max_outbound_sends: usize,
    ) -> Self {
        Self {
            node_id: node_id.into(),
            registry,
            transport,
            ground_station,
            send_permits: Arc::new(Semaphore::new(max_outbound_sends.max(1))),
            counters: Arc::new(RelayCounters::default()),
            events: None,
        }
    }

    pub(crate) fn with_counters(mut self, counters: Arc<RelayCounters>) -> Self {
        self.counters = counters;
        self
    }

    pub fn with_events(mut self, tx: mpsc::Sender<RelayEvent>) -> Self {
        self.events = Some(tx);
        self
    }

    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    /// Forward with a fresh visited set
    pub fn forward(&self, message: Message) -> FloodHandle {
        let mut visited = HashSet::new();
        self.forward_with(message, &mut visited)
    }

    /// Forward, marking this node in `visited`.
    ///
    /// Returns immediately; latency waits and sends happen in spawned tasks.
    pub fn forward_with(&self, message: Message, visited: &mut HashSet<String>) -> FloodHandle {
        if !visited.insert(self.node_id.clone()) {
            tracing::debug!(node = %self.node_id, id = message.id, "Already visited, not forwarding");
            return FloodHandle::default();
        }

        if !message.has_budget() {
            self.expire(&message);
            return FloodHandle::default();
        }

        if message.is_for_ground_station() {
            if let Some(endpoint) = self.uplink_endpoint() {
                return FloodHandle {
                    sends: vec![self.spawn_ground_station_delivery(endpoint, message)],
                };
            }
        }

        let Some(routes) = self.registry.routes_from(&self.node_id) else {
            tracing::warn!(node = %self.node_id, "Node missing from topology, cannot forward");
            return FloodHandle::default();
        };

        let message = Arc::new(message);
        let sends = routes
            .into_iter()
            .filter(|route| {
                if route.status == NodeStatus::Failed {
                    tracing::info!(
                        node = %self.node_id,
                        neighbor = %route.neighbor_id,
                        "Neighbor is down, skipping"
                    );
                    return false;
                }
                true
            })
            .map(|route| {
                let this = self.clone();
                let message = Arc::clone(&message);
                tokio::spawn(async move { this.traverse(route, message).await })
            })
            .collect();

        FloodHandle { sends }
    }

    /// Ground-station address, if this node is up-linked and one is configured
    fn uplink_endpoint(&self) -> Option<String> {
        let endpoint = self.ground_station.as_ref()?;
        match self.registry.ground_uplink(&self.node_id) {
            Some(true) => Some(endpoint.clone()),
            _ => None,
        }
    }

    fn spawn_ground_station_delivery(&self, endpoint: String, message: Message) -> JoinHandle<LinkOutcome> {
        let this = self.clone();
        tokio::spawn(async move {
            match this.send_bounded(&endpoint, &message).await {
                Ok(()) => {
                    tracing::info!(
                        node = %this.node_id,
                        id = message.id,
                        ttl = message.ttl,
                        "Message delivered to ground station"
                    );
                    RelayCounters::bump(&this.counters.ground_station);
                    metrics::record_ground_station_delivery(&this.node_id);
                    this.emit(RelayEvent::GroundStationDelivered {
                        message_id: message.id,
                        ttl: message.ttl,
                    });
                    LinkOutcome::Delivered
                }
                Err(e) => {
                    tracing::warn!(
                        node = %this.node_id,
                        id = message.id,
                        error = %e,
                        "Failed to deliver message to ground station"
                    );
                    RelayCounters::bump(&this.counters.send_failures);
                    metrics::record_send_failure(&this.node_id, crate::message::GROUND_STATION);
                    LinkOutcome::Failed(e.to_string())
                }
            }
        })
    }

    /// One link traversal: latency, loss draw, then a single send attempt
    async fn traverse(&self, route: NeighborRoute, message: Arc<Message>) -> LinkOutcome {
        let latency = route.link.latency;
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        metrics::record_link_latency(&self.node_id, latency);

        let draw: f64 = rand::random();
        if !route.link.survives(draw) {
            tracing::info!(
                from = %self.node_id,
                to = %route.neighbor_id,
                id = message.id,
                "Message lost in transit"
            );
            self.counters.link_lost(&route.neighbor_id);
            metrics::record_message_lost(&self.node_id, &route.neighbor_id);
            self.emit(RelayEvent::Lost {
                message_id: message.id,
                to: route.neighbor_id,
            });
            return LinkOutcome::Lost;
        }

        match self.send_bounded(&route.addr.to_string(), &message).await {
            Ok(()) => {
                tracing::debug!(
                    from = %self.node_id,
                    to = %route.neighbor_id,
                    id = message.id,
                    ttl = message.ttl,
                    "Message forwarded"
                );
                self.counters.link_forwarded(&route.neighbor_id);
                metrics::record_message_forwarded(&self.node_id, &route.neighbor_id);
                self.emit(RelayEvent::Forwarded {
                    message_id: message.id,
                    to: route.neighbor_id,
                    ttl: message.ttl,
                });
                LinkOutcome::Delivered
            }
            Err(e) => {
                tracing::warn!(
                    from = %self.node_id,
                    to = %route.neighbor_id,
                    id = message.id,
                    error = %e,
                    "Failed to forward message"
                );
                self.counters.link_failed(&route.neighbor_id);
                metrics::record_send_failure(&self.node_id, &route.neighbor_id);
                let reason = e.to_string();
                self.emit(RelayEvent::SendFailed {
                    message_id: message.id,
                    to: route.neighbor_id,
                    reason: reason.clone(),
                });
                LinkOutcome::Failed(reason)
            }
        }
    }

    /// Single send attempt holding one of the node's outbound permits
    async fn send_bounded(&self, endpoint: &str, message: &Message) -> RelayResult<()> {
        let _permit = self
            .send_permits
            .acquire()
            .await
            .map_err(|_| RelayError::Client("outbound send pool closed".to_string()))?;
        self.transport.send(endpoint, message).await
    }

    /// Drop a message whose hop budget is spent
    pub(crate) fn expire(&self, message: &Message) {
        tracing::info!(
            node = %self.node_id,
            id = message.id,
            source = %message.source,
            ttl = message.ttl,
            "Hop budget exhausted, dropping"
        );
        RelayCounters::bump(&self.counters.expired);
        metrics::record_message_expired(&self.node_id);
        self.emit(RelayEvent::Expired {
            message_id: message.id,
            source: message.source.clone(),
        });
    }

    pub(crate) fn emit(&self, event: RelayEvent) {
        if let Some(ref tx) = self.events {
            if tx.try_send(event).is_err() {
                tracing::debug!(node = %self.node_id, "Relay event dropped");
            }
        }
    }
}
