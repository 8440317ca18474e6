//! Lock-free counters shared by a node's ingress and its flood controller

use crate::relay::types::{LinkStats, RelayStats};
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub(crate) struct RelayCounters {
    pub received: AtomicU64,
    pub rejected: AtomicU64,
    pub delivered: AtomicU64,
    pub expired: AtomicU64,
    pub forwarded: AtomicU64,
    pub lost: AtomicU64,
    pub send_failures: AtomicU64,
    pub ground_station: AtomicU64,
    links: DashMap<String, LinkStats>,
}

impl RelayCounters {
    pub fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn link_forwarded(&self, neighbor: &str) {
        Self::bump(&self.forwarded);
        self.links.entry(neighbor.to_string()).or_default().forwarded += 1;
    }

    pub fn link_lost(&self, neighbor: &str) {
        Self::bump(&self.lost);
        self.links.entry(neighbor.to_string()).or_default().lost += 1;
    }

    pub fn link_failed(&self, neighbor: &str) {
        Self::bump(&self.send_failures);
        self.links.entry(neighbor.to_string()).or_default().failed += 1;
    }

    pub fn snapshot(&self) -> RelayStats {
        RelayStats {
            messages_received: self.received.load(Ordering::Relaxed),
            messages_rejected: self.rejected.load(Ordering::Relaxed),
            messages_delivered: self.delivered.load(Ordering::Relaxed),
            messages_expired: self.expired.load(Ordering::Relaxed),
            messages_forwarded: self.forwarded.load(Ordering::Relaxed),
            messages_lost: self.lost.load(Ordering::Relaxed),
            send_failures: self.send_failures.load(Ordering::Relaxed),
            ground_station_deliveries: self.ground_station.load(Ordering::Relaxed),
            links: self
                .links
                .iter()
                .map(|entry| (entry.key().clone(), entry.value().clone()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_counters() {
        let counters = RelayCounters::default();
        counters.link_forwarded("b");
        counters.link_forwarded("b");
        counters.link_lost("b");
        counters.link_failed("c");
        RelayCounters::bump(&counters.received);

        let stats = counters.snapshot();
        assert_eq!(stats.messages_received, 1);
        assert_eq!(stats.messages_forwarded, 2);
        assert_eq!(stats.messages_lost, 1);
        assert_eq!(stats.send_failures, 1);
        assert_eq!(stats.links["b"].attempts(), 3);
        assert_eq!(stats.links["c"].failed, 1);
    }
}
