//! Metrics and observability module
//!
//! Prometheus-compatible counters for the relay mesh:
//! - Messages received, delivered and expired per node
//! - Per-link forwards, simulated losses and send failures
//! - Ground-station deliveries and stored messages

pub mod exporter;
pub mod recorder;

pub use exporter::{start_metrics_server, MetricsConfig, MetricsError};
pub use recorder::{
    init_metrics, record_ground_station_delivery, record_link_latency, record_message_delivered,
    record_message_expired, record_message_forwarded, record_message_lost,
    record_message_received, record_message_rejected, record_message_stored, record_send_failure,
};
