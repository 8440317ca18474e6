use crate::groundstation::error::{GroundStationError, GroundStationResult};
use crate::groundstation::storage::MessageLog;
use crate::message::{Message, PositionReport};
use crate::metrics;
use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

pub struct GroundStation {
    log: MessageLog,
    received: AtomicU64,
}

#[derive(Debug, Deserialize)]
struct VesselFilter {
    vessel: Option<String>,
}

impl GroundStation {
    pub fn new(log: MessageLog) -> Self {
        Self {
            log,
            received: AtomicU64::new(0),
        }
    }

    pub fn log(&self) -> &MessageLog {
        &self.log
    }

    /// Messages persisted since start
    pub fn received(&self) -> u64 {
        self.received.load(Ordering::Relaxed)
    }

    /// Decode and persist one relayed envelope. Duplicates are kept.
    pub async fn ingest(&self, body: &[u8]) -> GroundStationResult<Message> {
        let message = Message::from_json(body).map_err(|e| {
            tracing::warn!(error = %e, "Ground station failed to decode message");
            GroundStationError::InvalidMessage(e.to_string())
        })?;

        self.log.append(&message).await.map_err(|e| {
            tracing::warn!(error = %e, id = message.id, "Failed to persist message");
            e
        })?;

        self.received.fetch_add(1, Ordering::Relaxed);
        metrics::record_message_stored(&message.content.vessel_id);
        tracing::info!(
            id = message.id,
            source = %message.source,
            vessel = %message.content.vessel_id,
            ttl = message.ttl,
            "Ground station stored message"
        );
        Ok(message)
    }

    /// Stored position reports, oldest first
    pub async fn reports(&self, vessel: Option<&str>) -> GroundStationResult<Vec<PositionReport>> {
        let reports = self
            .log
            .load_all()
            .await?
            .into_iter()
            .map(|message| message.content)
            .filter(|report| vessel.map_or(true, |v| report.vessel_id == v))
            .collect();
        Ok(reports)
    }

    /// Ingestion endpoint: POST `/`
    pub fn ingest_router(self: &Arc<Self>) -> Router {
        Router::new()
            .route("/", post(ingest_message))
            .layer(TraceLayer::new_for_http())
            .with_state(Arc::clone(self))
    }

    /// Read-only API: GET `/vessels`, GET `/health`
    pub fn api_router(self: &Arc<Self>) -> Router {
        Router::new()
            .route("/vessels", get(list_vessels))
            .route("/health", get(health_check))
            .layer(TraceLayer::new_for_http())
            .with_state(Arc::clone(self))
    }

    pub async fn serve_ingest(self: Arc<Self>, listener: TcpListener) -> std::io::Result<()> {
        tracing::info!(addr = %listener.local_addr()?, "Ground station listening");
        axum::serve(listener, self.ingest_router()).await
    }

    pub async fn serve_api(self: Arc<Self>, listener: TcpListener) -> std::io::Result<()> {
        tracing::info!(addr = %listener.local_addr()?, "API server listening");
        axum::serve(listener, self.api_router()).await
    }
}

async fn ingest_message(
    State(station): State<Arc<GroundStation>>,
    body: Bytes,
) -> GroundStationResult<&'static str> {
    station.ingest(&body).await?;
    Ok("Message received and processed")
}

async fn list_vessels(
    State(station): State<Arc<GroundStation>>,
    Query(filter): Query<VesselFilter>,
) -> GroundStationResult<Json<Vec<PositionReport>>> {
    Ok(Json(station.reports(filter.vessel.as_deref()).await?))
}

async fn health_check() -> &'static str {
    "OK"
}
