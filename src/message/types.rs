use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Destination sentinel for the terminal ground-station sink
pub const GROUND_STATION: &str = "GroundStation";

/// Whether a report comes straight from a vessel or has been relayed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportKind {
    #[serde(rename = "position")]
    Position,

    #[serde(rename = "forwarded_position")]
    ForwardedPosition,
}

/// A single vessel position fix
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionReport {
    #[serde(rename = "type")]
    pub kind: ReportKind,

    #[serde(rename = "vesselID")]
    pub vessel_id: String,

    pub latitude: f64,

    pub longitude: f64,

    pub timestamp: DateTime<Utc>,
}

impl PositionReport {
    /// Create a fresh report stamped with the current time
    pub fn new(vessel_id: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            kind: ReportKind::Position,
            vessel_id: vessel_id.into(),
            latitude,
            longitude,
            timestamp: Utc::now(),
        }
    }
}

/// Relay envelope.
///
/// `id` is only unique per sender, so two vessels may emit the same id.
/// `priority` is carried for information and never affects scheduling.
/// `ttl` is the hop budget; relays decrement it once per hop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    pub source: String,
    pub destination: String,
    pub content: PositionReport,
    pub priority: i32,
    pub ttl: i32,
}

impl Message {
    /// Build an envelope addressed to the ground station
    pub fn to_ground_station(id: i64, content: PositionReport, priority: i32, ttl: i32) -> Self {
        Self {
            id,
            source: content.vessel_id.clone(),
            destination: GROUND_STATION.to_string(),
            content,
            priority,
            ttl,
        }
    }

    /// Decode an envelope from a JSON body
    pub fn from_json(body: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(body)
    }

    pub fn is_for_ground_station(&self) -> bool {
        self.destination == GROUND_STATION
    }

    pub fn is_addressed_to(&self, node_id: &str) -> bool {
        self.destination == node_id
    }

    pub fn has_budget(&self) -> bool {
        self.ttl > 0
    }

    /// Copy sent onward by a relay: one hop spent, report tagged as forwarded
    pub fn into_forwarded(mut self) -> Self {
        self.ttl -= 1;
        self.content.kind = ReportKind::ForwardedPosition;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Message {
        Message::to_ground_station(7, PositionReport::new("vessel-1", 12.5, -45.25), 3, 5)
    }

    #[test]
    fn test_wire_field_names() {
        let json = serde_json::to_value(sample()).unwrap();

        assert_eq!(json["destination"], "GroundStation");
        assert_eq!(json["source"], "vessel-1");
        assert_eq!(json["ttl"], 5);
        assert_eq!(json["content"]["type"], "position");
        assert_eq!(json["content"]["vesselID"], "vessel-1");
        assert!(json["content"]["timestamp"].is_string());
    }

    #[test]
    fn test_decode_envelope() {
        let body = br#"{
            "id": 1,
            "source": "vessel-9",
            "destination": "sat-2",
            "content": {
                "type": "forwarded_position",
                "vesselID": "vessel-9",
                "latitude": 10.0,
                "longitude": 20.0,
                "timestamp": "2024-05-01T12:00:00Z"
            },
            "priority": 4,
            "ttl": 0
        }"#;

        let msg = Message::from_json(body).unwrap();
        assert_eq!(msg.content.kind, ReportKind::ForwardedPosition);
        assert!(msg.is_addressed_to("sat-2"));
        assert!(!msg.is_for_ground_station());
        assert!(!msg.has_budget());
    }

    #[test]
    fn test_decode_rejects_malformed() {
        assert!(Message::from_json(b"{not json").is_err());
        assert!(Message::from_json(br#"{"id": 1, "source": "x"}"#).is_err());
        assert!(Message::from_json(br#"{"id":1,"source":"a","destination":"b","content":{"type":"teleport","vesselID":"v","latitude":0,"longitude":0,"timestamp":"2024-05-01T12:00:00Z"},"priority":0,"ttl":1}"#).is_err());
    }

    #[test]
    fn test_into_forwarded() {
        let forwarded = sample().into_forwarded();
        assert_eq!(forwarded.ttl, 4);
        assert_eq!(forwarded.content.kind, ReportKind::ForwardedPosition);
        assert_eq!(forwarded.id, 7);
    }
}
