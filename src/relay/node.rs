//! Relay node implementation
//!
//! The ingress accepts one message per POST, acknowledges it straight away
//! and leaves propagation to the flood controller.

use crate::message::Message;
use crate::metrics;
use crate::relay::error::{RelayError, RelayResult};
use crate::relay::flood::{FloodController, FloodHandle};
use crate::relay::stats::RelayCounters;
use crate::relay::transport::{HttpTransport, LinkTransport};
use crate::relay::types::{Disposition, RelayConfig, RelayEvent, RelayStats};
use crate::topology::TopologyRegistry;
use axum::body::Bytes;
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tower_http::trace::TraceLayer;

/// A relay satellite
pub struct RelayNode {
    config: RelayConfig,
    flood: FloodController,
    counters: Arc<RelayCounters>,
}

impl RelayNode {
    /// Create a node; `config.node_id` must already be in `registry`
    pub fn new(
        config: RelayConfig,
        registry: Arc<TopologyRegistry>,
        transport: Arc<dyn LinkTransport>,
    ) -> RelayResult<Self> {
        if !registry.contains(&config.node_id) {
            return Err(RelayError::UnknownNode(config.node_id));
        }

        let counters = Arc::new(RelayCounters::default());
        let flood = FloodController::new(
            config.node_id.clone(),
            registry,
            transport,
            config.ground_station.clone(),
            config.max_outbound_sends,
        )
        .with_counters(Arc::clone(&counters));

        Ok(Self {
            config,
            flood,
            counters,
        })
    }

    /// Create with an event channel for monitoring
    pub fn with_events(mut self, tx: mpsc::Sender<RelayEvent>) -> Self {
        self.flood = self.flood.with_events(tx);
        self
    }

    pub fn node_id(&self) -> &str {
        &self.config.node_id
    }

    /// Decode an ingress body, counting malformed ones
    pub fn decode(&self, body: &[u8]) -> RelayResult<Message> {
        Message::from_json(body).map_err(|e| {
            tracing::warn!(node = %self.config.node_id, error = %e, "Failed to decode message");
            RelayCounters::bump(&self.counters.rejected);
            metrics::record_message_rejected(&self.config.node_id);
            RelayError::InvalidMessage(e.to_string())
        })
    }

    /// Handle an accepted message.
    ///
    /// The returned handle may be dropped; forwarding carries on regardless.
    pub fn receive(&self, message: Message) -> (Disposition, FloodHandle) {
        let node_id = self.config.node_id.as_str();
        RelayCounters::bump(&self.counters.received);
        metrics::record_message_received(node_id);
        tracing::info!(
            node = %node_id,
            id = message.id,
            source = %message.source,
            destination = %message.destination,
            ttl = message.ttl,
            "Message received"
        );

        if message.is_addressed_to(node_id) {
            tracing::info!(node = %node_id, id = message.id, "Message reached its destination");
            RelayCounters::bump(&self.counters.delivered);
            metrics::record_message_delivered(node_id);
            self.flood.emit(RelayEvent::Delivered { message });
            return (Disposition::Delivered, FloodHandle::default());
        }

        if !message.has_budget() {
            self.flood.expire(&message);
            return (Disposition::Expired, FloodHandle::default());
        }

        let handle = self.flood.forward(message.into_forwarded());
        (Disposition::Forwarding, handle)
    }

    pub fn stats(&self) -> RelayStats {
        self.counters.snapshot()
    }

    /// HTTP surface: POST `/` ingress, GET `/health` and `/stats`
    pub fn router(self: &Arc<Self>) -> Router {
        Router::new()
            .route("/", post(ingest))
            .route("/health", get(health_check))
            .route("/stats", get(get_stats))
            .layer(TraceLayer::new_for_http())
            .with_state(Arc::clone(self))
    }

    /// Serve the ingress on an already bound listener until the task is dropped
    pub async fn serve(self: Arc<Self>, listener: TcpListener) -> RelayResult<()> {
        let addr = listener.local_addr()?;
        tracing::info!(node = %self.config.node_id, %addr, "Satellite listening");
        axum::serve(listener, self.router()).await?;
        Ok(())
    }
}

async fn ingest(State(node): State<Arc<RelayNode>>, body: Bytes) -> RelayResult<&'static str> {
    let message = node.decode(&body)?;
    node.receive(message);
    Ok("Message received successfully")
}

async fn health_check() -> &'static str {
    "OK"
}

async fn get_stats(State(node): State<Arc<RelayNode>>) -> Json<RelayStats> {
    Json(node.stats())
}

/// Builder for relay nodes
pub struct RelayNodeBuilder {
    config: RelayConfig,
    registry: Arc<TopologyRegistry>,
    transport: Option<Arc<dyn LinkTransport>>,
    events: Option<mpsc::Sender<RelayEvent>>,
}

impl RelayNodeBuilder {
    pub fn new(node_id: impl Into<String>, registry: Arc<TopologyRegistry>) -> Self {
        Self {
            config: RelayConfig {
                node_id: node_id.into(),
                ..RelayConfig::default()
            },
            registry,
            transport: None,
            events: None,
        }
    }

    pub fn ground_station(mut self, endpoint: impl Into<String>) -> Self {
        self.config.ground_station = Some(endpoint.into());
        self
    }

    pub fn send_timeout(mut self, timeout: Duration) -> Self {
        self.config.send_timeout = timeout;
        self
    }

    pub fn max_outbound_sends(mut self, max: usize) -> Self {
        self.config.max_outbound_sends = max;
        self
    }

    /// Use a custom transport instead of HTTP
    pub fn transport(mut self, transport: Arc<dyn LinkTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn events(mut self, tx: mpsc::Sender<RelayEvent>) -> Self {
        self.events = Some(tx);
        self
    }

    pub fn build(self) -> RelayResult<RelayNode> {
        let transport = match self.transport {
            Some(transport) => transport,
            None => Arc::new(HttpTransport::new(self.config.send_timeout)?),
        };

        let node = RelayNode::new(self.config, self.registry, transport)?;
        Ok(match self.events {
            Some(tx) => node.with_events(tx),
            None => node,
        })
    }
}
