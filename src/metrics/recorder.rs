//! Metrics recorder for relay mesh operations

use metrics::{counter, describe_counter, describe_histogram, histogram};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

static METRICS_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Initialize metric descriptions (call once at startup)
pub fn init_metrics() {
    if METRICS_INITIALIZED.swap(true, Ordering::SeqCst) {
        return;
    }

    describe_counter!(
        "satmesh_messages_received_total",
        "Messages accepted by a relay node ingress"
    );
    describe_counter!(
        "satmesh_messages_rejected_total",
        "Malformed messages rejected by a relay node ingress"
    );
    describe_counter!(
        "satmesh_messages_delivered_total",
        "Messages that reached their destination node"
    );
    describe_counter!(
        "satmesh_messages_expired_total",
        "Messages dropped because the hop budget ran out"
    );
    describe_counter!(
        "satmesh_messages_forwarded_total",
        "Messages accepted by a neighbor after crossing a link"
    );
    describe_counter!(
        "satmesh_messages_lost_total",
        "Messages dropped by simulated link loss"
    );
    describe_counter!(
        "satmesh_send_failures_total",
        "Outbound sends that failed or were refused"
    );
    describe_counter!(
        "satmesh_ground_station_deliveries_total",
        "Messages handed to the ground station by a relay node"
    );
    describe_counter!(
        "satmesh_messages_stored_total",
        "Messages persisted by the ground station"
    );

    describe_histogram!(
        "satmesh_link_latency_ms",
        "Simulated transmission delay applied per link traversal"
    );
}

// ============== Relay ingress ==============

pub fn record_message_received(node: &str) {
    counter!("satmesh_messages_received_total", "node" => node.to_string()).increment(1);
}

pub fn record_message_rejected(node: &str) {
    counter!("satmesh_messages_rejected_total", "node" => node.to_string()).increment(1);
}

pub fn record_message_delivered(node: &str) {
    counter!("satmesh_messages_delivered_total", "node" => node.to_string()).increment(1);
}

pub fn record_message_expired(node: &str) {
    counter!("satmesh_messages_expired_total", "node" => node.to_string()).increment(1);
}

// ============== Links ==============

pub fn record_message_forwarded(from: &str, to: &str) {
    counter!("satmesh_messages_forwarded_total", "from" => from.to_string(), "to" => to.to_string())
        .increment(1);
}

pub fn record_message_lost(from: &str, to: &str) {
    counter!("satmesh_messages_lost_total", "from" => from.to_string(), "to" => to.to_string())
        .increment(1);
}

pub fn record_send_failure(from: &str, to: &str) {
    counter!("satmesh_send_failures_total", "from" => from.to_string(), "to" => to.to_string())
        .increment(1);
}

pub fn record_link_latency(from: &str, latency: Duration) {
    histogram!("satmesh_link_latency_ms", "from" => from.to_string())
        .record(latency.as_millis() as f64);
}

// ============== Ground station ==============

pub fn record_ground_station_delivery(node: &str) {
    counter!("satmesh_ground_station_deliveries_total", "node" => node.to_string()).increment(1);
}

pub fn record_message_stored(vessel: &str) {
    counter!("satmesh_messages_stored_total", "vessel" => vessel.to_string()).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_metrics() {
        // Safe to call repeatedly
        init_metrics();
        init_metrics();
    }

    #[test]
    fn test_recording_without_recorder() {
        record_message_received("sat-1");
        record_message_forwarded("sat-1", "sat-2");
        record_link_latency("sat-1", Duration::from_millis(25));
    }
}
