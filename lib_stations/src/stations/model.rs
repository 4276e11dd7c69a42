use serde::{Deserialize, Serialize};

use super::wait_time::WaitTime;
use crate::geo::{haversine_km, Location};

/// Occupancy of a station. Only these two values exist on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StationStatus {
    Available,
    Busy,
}

impl StationStatus {
    pub fn flipped(self) -> Self {
        match self {
            StationStatus::Available => StationStatus::Busy,
            StationStatus::Busy => StationStatus::Available,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StationStatus::Available => "available",
            StationStatus::Busy => "busy",
        }
    }
}

impl std::fmt::Display for StationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A charging station. Coordinates never change after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    pub id: String,
    pub lat: f64,
    pub lng: f64,
    pub status: StationStatus,
}

impl Station {
    pub fn new(id: impl Into<String>, lat: f64, lng: f64, status: StationStatus) -> Self {
        Self {
            id: id.into(),
            lat,
            lng,
            status,
        }
    }

    pub fn distance_from(&self, center: Location) -> f64 {
        haversine_km(center.lat, center.lng, self.lat, self.lng)
    }

    pub fn annotate(self, wait_time: WaitTime) -> AnnotatedStation {
        AnnotatedStation {
            id: self.id,
            lat: self.lat,
            lng: self.lng,
            status: self.status,
            wait_time,
        }
    }
}

/// A station plus its predicted wait, as pushed to clients. Never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedStation {
    pub id: String,
    pub lat: f64,
    pub lng: f64,
    pub status: StationStatus,
    pub wait_time: WaitTime,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn flipping_twice_is_identity() {
        for status in [StationStatus::Available, StationStatus::Busy] {
            assert_ne!(status.flipped(), status);
            assert_eq!(status.flipped().flipped(), status);
        }
    }

    #[test]
    fn annotated_station_json_shape() {
        let annotated = Station::new("3", 9.977, 76.291, StationStatus::Busy).annotate(WaitTime::Peak);
        assert_eq!(
            serde_json::to_value(&annotated).unwrap(),
            json!({
                "id": "3",
                "lat": 9.977,
                "lng": 76.291,
                "status": "busy",
                "wait_time": "25 mins"
            })
        );
    }

    #[test]
    fn unknown_status_is_rejected() {
        let parsed = serde_json::from_value::<Station>(json!({
            "id": "9", "lat": 1.0, "lng": 2.0, "status": "charging"
        }));
        assert!(parsed.is_err());
    }
}
