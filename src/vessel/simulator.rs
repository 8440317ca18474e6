use crate::message::{Message, PositionReport};
use crate::relay::LinkTransport;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;

/// Largest per-report drift on each axis, in degrees
const MAX_DRIFT: f64 = 0.05;

#[derive(Debug, Clone)]
pub struct VesselConfig {
    pub vessel_id: String,

    /// Ingress of the satellite this vessel reports to, "host:port"
    pub satellite: String,

    pub report_interval: Duration,

    /// Hop budget stamped on every report
    pub initial_ttl: i32,
}

/// A simulated vessel with a random-walk position
#[derive(Debug, Clone)]
pub struct Vessel {
    config: VesselConfig,
    latitude: f64,
    longitude: f64,
    next_id: i64,
}

impl Vessel {
    /// Start at a uniformly random position
    pub fn new(config: VesselConfig) -> Self {
        let mut rng = rand::thread_rng();
        let latitude = rng.gen_range(-90.0..=90.0);
        let longitude = rng.gen_range(-180.0..=180.0);
        Self::at(config, latitude, longitude)
    }

    pub fn at(config: VesselConfig, latitude: f64, longitude: f64) -> Self {
        Self {
            config,
            latitude: latitude.clamp(-90.0, 90.0),
            longitude: longitude.clamp(-180.0, 180.0),
            next_id: 1,
        }
    }

    pub fn id(&self) -> &str {
        &self.config.vessel_id
    }

    pub fn position(&self) -> (f64, f64) {
        (self.latitude, self.longitude)
    }

    /// Drift, then build the next report addressed to the ground station
    pub fn next_report<R: Rng>(&mut self, rng: &mut R) -> Message {
        self.latitude = (self.latitude + rng.gen_range(-MAX_DRIFT..MAX_DRIFT)).clamp(-90.0, 90.0);
        self.longitude =
            (self.longitude + rng.gen_range(-MAX_DRIFT..MAX_DRIFT)).clamp(-180.0, 180.0);

        let report = PositionReport::new(&self.config.vessel_id, self.latitude, self.longitude);
        let message = Message::to_ground_station(
            self.next_id,
            report,
            rng.gen_range(0..10),
            self.config.initial_ttl,
        );
        self.next_id += 1;
        message
    }

    /// Report forever at the configured interval. Send failures are logged.
    pub async fn run(mut self, transport: Arc<dyn LinkTransport>) {
        tracing::info!(
            vessel = %self.config.vessel_id,
            satellite = %self.config.satellite,
            "Vessel reporting started"
        );

        let mut ticker = tokio::time::interval(self.config.report_interval);
        loop {
            ticker.tick().await;
            let message = self.next_report(&mut rand::thread_rng());

            match transport.send(&self.config.satellite, &message).await {
                Ok(()) => tracing::debug!(
                    vessel = %self.config.vessel_id,
                    id = message.id,
                    "Position report sent"
                ),
                Err(e) => tracing::warn!(
                    vessel = %self.config.vessel_id,
                    id = message.id,
                    error = %e,
                    "Failed to send position report"
                ),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{ReportKind, GROUND_STATION};
    use crate::relay::RelayResult;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn config() -> VesselConfig {
        VesselConfig {
            vessel_id: "vessel-7".into(),
            satellite: "127.0.0.1:7001".into(),
            report_interval: Duration::from_millis(10),
            initial_ttl: 5,
        }
    }

    #[test]
    fn test_reports_are_sequenced() {
        let mut vessel = Vessel::at(config(), 10.0, 20.0);
        let mut rng = StdRng::seed_from_u64(7);

        let first = vessel.next_report(&mut rng);
        let second = vessel.next_report(&mut rng);

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert_eq!(first.destination, GROUND_STATION);
        assert_eq!(first.source, "vessel-7");
        assert_eq!(first.ttl, 5);
        assert_eq!(first.content.kind, ReportKind::Position);
        assert!((0..10).contains(&first.priority));
    }

    #[test]
    fn test_drift_is_bounded_and_clamped() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut vessel = Vessel::at(config(), 89.99, -179.99);

        for _ in 0..500 {
            let (lat, lon) = vessel.position();
            let report = vessel.next_report(&mut rng);
            assert!((report.content.latitude - lat).abs() <= MAX_DRIFT + 1e-9);
            assert!((report.content.longitude - lon).abs() <= MAX_DRIFT + 1e-9);
            assert!((-90.0..=90.0).contains(&report.content.latitude));
            assert!((-180.0..=180.0).contains(&report.content.longitude));
        }
    }

    #[derive(Default)]
    struct RecordingTransport {
        sent: Mutex<Vec<(String, Message)>>,
    }

    #[async_trait]
    impl LinkTransport for RecordingTransport {
        async fn send(&self, endpoint: &str, message: &Message) -> RelayResult<()> {
            self.sent.lock().push((endpoint.to_string(), message.clone()));
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_run_sends_to_satellite() {
        let transport = Arc::new(RecordingTransport::default());
        let task = tokio::spawn(Vessel::new(config()).run(transport.clone()));

        tokio::time::sleep(Duration::from_millis(60)).await;
        task.abort();

        let sent = transport.sent.lock();
        assert!(sent.len() >= 2);
        assert!(sent.iter().all(|(endpoint, _)| endpoint == "127.0.0.1:7001"));
        assert_eq!(sent[0].1.id, 1);
        assert_eq!(sent[1].1.id, 2);
    }
}
