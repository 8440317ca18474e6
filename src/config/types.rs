use crate::config::error::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

/// Top-level simulation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Ground-station ingress, "host:port"
    pub ground_station_address: String,

    /// Read-only listing API, "host:port"
    #[serde(default = "default_api_address")]
    pub api_address: String,

    /// Append-only message log written by the ground station
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Host satellites bind their ingress on
    #[serde(default = "default_bind_host")]
    pub bind_host: String,

    pub satellites: Vec<SatelliteConfig>,

    #[serde(default)]
    pub vessels: Vec<VesselEntry>,

    #[serde(default)]
    pub relay: RelayTuning,

    #[serde(default)]
    pub vessel_defaults: VesselDefaults,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SatelliteConfig {
    pub id: String,
    pub port: u16,

    #[serde(default)]
    pub neighbors: Vec<NeighborConfig>,

    /// Whether this satellite can reach the ground station directly
    #[serde(default = "default_true")]
    pub ground_uplink: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NeighborConfig {
    pub id: String,

    /// Link latency in milliseconds
    #[serde(default)]
    pub latency: u64,

    #[serde(default)]
    pub packet_loss: f64,
}

impl NeighborConfig {
    pub fn latency(&self) -> Duration {
        Duration::from_millis(self.latency)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VesselEntry {
    pub id: String,

    /// Id of the satellite the vessel reports to
    pub satellite: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayTuning {
    #[serde(default = "default_send_timeout_ms")]
    pub send_timeout_ms: u64,

    #[serde(default = "default_max_outbound_sends")]
    pub max_outbound_sends: usize,
}

impl Default for RelayTuning {
    fn default() -> Self {
        Self {
            send_timeout_ms: default_send_timeout_ms(),
            max_outbound_sends: default_max_outbound_sends(),
        }
    }
}

impl RelayTuning {
    pub fn send_timeout(&self) -> Duration {
        Duration::from_millis(self.send_timeout_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VesselDefaults {
    #[serde(default = "default_report_interval_ms")]
    pub report_interval_ms: u64,

    #[serde(default = "default_initial_ttl")]
    pub initial_ttl: i32,
}

impl Default for VesselDefaults {
    fn default() -> Self {
        Self {
            report_interval_ms: default_report_interval_ms(),
            initial_ttl: default_initial_ttl(),
        }
    }
}

impl VesselDefaults {
    pub fn report_interval(&self) -> Duration {
        Duration::from_millis(self.report_interval_ms)
    }
}

fn default_api_address() -> String {
    "127.0.0.1:12345".to_string()
}

fn default_database_path() -> String {
    "database.json".to_string()
}

fn default_bind_host() -> String {
    "127.0.0.1".to_string()
}

fn default_true() -> bool {
    true
}

fn default_send_timeout_ms() -> u64 {
    5_000
}

fn default_max_outbound_sends() -> usize {
    64
}

fn default_report_interval_ms() -> u64 {
    5_000
}

fn default_initial_ttl() -> i32 {
    5
}

impl SimulationConfig {
    /// Read and parse a configuration file (no validation)
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json(&data)?;
        tracing::info!(path = %path.display(), "Configuration loaded");
        Ok(config)
    }

    pub fn from_json(data: &str) -> ConfigResult<Self> {
        Ok(serde_json::from_str(data)?)
    }

    /// Look up a satellite definition by id
    pub fn satellite(&self, id: &str) -> Option<&SatelliteConfig> {
        self.satellites.iter().find(|s| s.id == id)
    }

    /// Check the configuration is complete and self-consistent
    pub fn validate(&self) -> ConfigResult<()> {
        if self.ground_station_address.trim().is_empty() {
            return Err(invalid("ground station address is missing"));
        }
        if self.satellites.is_empty() {
            return Err(invalid("no satellites configured"));
        }
        if self.relay.max_outbound_sends == 0 {
            return Err(invalid("relay.max_outbound_sends must be at least 1"));
        }
        if self.relay.send_timeout_ms == 0 {
            return Err(invalid("relay.send_timeout_ms must be non-zero"));
        }
        if self.vessel_defaults.report_interval_ms == 0 {
            return Err(invalid("vessel_defaults.report_interval_ms must be non-zero"));
        }

        let mut ids = HashSet::new();
        let mut ports = HashSet::new();
        for satellite in &self.satellites {
            if satellite.id.is_empty() {
                return Err(invalid("a satellite is missing an ID"));
            }
            if !ids.insert(satellite.id.as_str()) {
                return Err(invalid(format!("duplicate satellite ID {}", satellite.id)));
            }
            if satellite.port == 0 {
                return Err(invalid(format!("satellite {} is missing a port", satellite.id)));
            }
            if !ports.insert(satellite.port) {
                return Err(invalid(format!(
                    "satellite {} reuses port {}",
                    satellite.id, satellite.port
                )));
            }
        }

        for satellite in &self.satellites {
            for neighbor in &satellite.neighbors {
                if neighbor.id.is_empty() {
                    return Err(invalid(format!(
                        "satellite {} has a neighbor with a missing ID",
                        satellite.id
                    )));
                }
                if neighbor.id == satellite.id {
                    return Err(invalid(format!(
                        "satellite {} lists itself as a neighbor",
                        satellite.id
                    )));
                }
                if !ids.contains(neighbor.id.as_str()) {
                    return Err(invalid(format!(
                        "satellite {} references unknown neighbor {}",
                        satellite.id, neighbor.id
                    )));
                }
                if !(0.0..=1.0).contains(&neighbor.packet_loss) {
                    return Err(invalid(format!(
                        "invalid packet loss rate between satellite {} and neighbor {}",
                        satellite.id, neighbor.id
                    )));
                }
                let mirror = self
                    .satellite(&neighbor.id)
                    .and_then(|peer| peer.neighbors.iter().find(|n| n.id == satellite.id));
                if let Some(mirror) = mirror {
                    if mirror.latency != neighbor.latency
                        || mirror.packet_loss != neighbor.packet_loss
                    {
                        return Err(invalid(format!(
                            "link between satellite {} and {} is declared twice with different parameters",
                            satellite.id, neighbor.id
                        )));
                    }
                }
            }
        }

        if self.vessels.is_empty() {
            return Err(invalid("no vessels configured"));
        }
        for vessel in &self.vessels {
            if vessel.id.is_empty() {
                return Err(invalid("a vessel is missing an ID"));
            }
            if vessel.satellite.is_empty() {
                return Err(invalid(format!(
                    "vessel {} is missing an associated satellite",
                    vessel.id
                )));
            }
            if !ids.contains(vessel.satellite.as_str()) {
                return Err(invalid(format!(
                    "vessel {} is associated with unknown satellite {}",
                    vessel.id, vessel.satellite
                )));
            }
        }

        Ok(())
    }
}

fn invalid(reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid(reason.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SAMPLE: &str = r#"{
        "ground_station_address": "127.0.0.1:8080",
        "satellites": [
            { "id": "sat-1", "port": 7001,
              "neighbors": [ { "id": "sat-2", "latency": 50, "packet_loss": 0.1 } ] },
            { "id": "sat-2", "port": 7002, "ground_uplink": false,
              "neighbors": [ { "id": "sat-1", "latency": 50, "packet_loss": 0.1 } ] }
        ],
        "vessels": [ { "id": "vessel-1", "satellite": "sat-2" } ]
    }"#;

    fn sample() -> SimulationConfig {
        SimulationConfig::from_json(SAMPLE).unwrap()
    }

    fn assert_invalid(config: &SimulationConfig, fragment: &str) {
        match config.validate() {
            Err(ConfigError::Invalid(reason)) => {
                assert!(reason.contains(fragment), "unexpected reason: {reason}")
            }
            other => panic!("expected invalid config, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_with_defaults() {
        let config = sample();
        assert!(config.validate().is_ok());
        assert_eq!(config.api_address, "127.0.0.1:12345");
        assert_eq!(config.database_path, "database.json");
        assert_eq!(config.relay.send_timeout(), Duration::from_secs(5));
        assert_eq!(config.vessel_defaults.initial_ttl, 5);
        assert!(config.satellite("sat-1").unwrap().ground_uplink);
        assert!(!config.satellite("sat-2").unwrap().ground_uplink);
        assert_eq!(
            config.satellites[0].neighbors[0].latency(),
            Duration::from_millis(50)
        );
    }

    #[test]
    fn test_one_sided_link_is_accepted() {
        let mut config = sample();
        config.satellites[1].neighbors.clear();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let config = SimulationConfig::load(file.path()).unwrap();
        assert_eq!(config.satellites.len(), 2);
    }

    #[test]
    fn test_load_errors() {
        assert!(matches!(
            SimulationConfig::load("/nonexistent/config.json"),
            Err(ConfigError::Read { .. })
        ));
        assert!(matches!(
            SimulationConfig::from_json("{"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_validation_failures() {
        let mut config = sample();
        config.ground_station_address.clear();
        assert_invalid(&config, "ground station");

        let mut config = sample();
        config.satellites[1].port = 7001;
        assert_invalid(&config, "reuses port");

        let mut config = sample();
        config.satellites[1].id = "sat-1".into();
        assert_invalid(&config, "duplicate");

        let mut config = sample();
        config.satellites[0].neighbors[0].packet_loss = 1.2;
        assert_invalid(&config, "packet loss");

        let mut config = sample();
        config.satellites[0].neighbors[0].id = "sat-9".into();
        assert_invalid(&config, "unknown neighbor");

        let mut config = sample();
        config.vessels.clear();
        assert_invalid(&config, "no vessels");

        let mut config = sample();
        config.vessels[0].satellite = "sat-9".into();
        assert_invalid(&config, "unknown satellite");

        let mut config = sample();
        config.vessel_defaults.report_interval_ms = 0;
        assert_invalid(&config, "report_interval_ms");

        let mut config = sample();
        config.relay.send_timeout_ms = 0;
        assert_invalid(&config, "send_timeout_ms");

        let mut config = sample();
        config.satellites[1].neighbors[0].latency = 75;
        assert_invalid(&config, "declared twice");

        let mut config = sample();
        config.satellites[1].neighbors[0].packet_loss = 0.3;
        assert_invalid(&config, "declared twice");
    }
}
