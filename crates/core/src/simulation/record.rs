//! Outbound records and their topics
//!
//! Payloads are JSON. A PUT carries a GeoJSON polygon whose ring is closed
//! explicitly (first position repeated last, positions as `[lon, lat]`).

use crate::storm::polygon::Geometry;
use crate::storm::state::{BandReading, StormTick};
use crate::storm::{LevelId, WindLevel};
use serde::Serialize;

/// Default topic prefix
pub const DEFAULT_TOPIC_PREFIX: &str = "producers/hurricane";

/// Why a CLEAR was emitted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClearReason {
    /// The band weakened below existence
    Ceased,
    /// The cycle ended
    CycleEnd,
    /// The loop was cancelled
    Shutdown,
}

/// Metadata attached to a PUT
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BandProperties {
    /// Storm name
    pub storm: String,
    /// Band level
    pub wind_level: WindLevel,
    /// Band label
    pub label: String,
    /// Band wind speed, mph, one decimal
    pub wind_speed_mph: f64,
    /// Storm category
    pub category: u8,
    /// Storm central pressure, hPa, one decimal
    pub pressure_hpa: f64,
    /// Band radius, km, one decimal
    pub radius_km: f64,
    /// Storm centre latitude
    pub center_lat: f64,
    /// Storm centre longitude
    pub center_lon: f64,
    /// Tick index within the cycle
    pub tick: u64,
    /// Simulated seconds since the cycle started
    pub timestamp: f64,
    /// Cycle number, starting at 0
    pub cycle: u64,
}

/// Upsert of a band outline
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PutRecord {
    /// Level identity
    pub id: LevelId,
    /// Outline
    pub geometry: Geometry,
    /// Metadata
    pub properties: BandProperties,
}

/// Retraction of a band
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClearRecord {
    /// Level identity
    pub id: LevelId,
    /// Storm name
    pub storm: String,
    /// Band level
    pub wind_level: WindLevel,
    /// Why the band is retracted
    pub reason: ClearReason,
    /// Tick index within the cycle
    pub tick: u64,
    /// Simulated seconds since the cycle started
    pub timestamp: f64,
    /// Cycle number, starting at 0
    pub cycle: u64,
}

/// Message handed to a publisher
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action")]
pub enum OutboundRecord {
    /// Band exists; replace its outline
    #[serde(rename = "PUT")]
    Put(PutRecord),
    /// Band no longer exists; remove it
    #[serde(rename = "CLEAR")]
    Clear(ClearRecord),
    /// Drop every band from earlier runs
    #[serde(rename = "PURGE")]
    Purge,
}

impl OutboundRecord {
    /// Action string as it appears in the payload
    pub fn action(&self) -> &'static str {
        match self {
            OutboundRecord::Put(_) => "PUT",
            OutboundRecord::Clear(_) => "CLEAR",
            OutboundRecord::Purge => "PURGE",
        }
    }

    /// Level identity, if the record targets one band
    pub fn level_id(&self) -> Option<&LevelId> {
        match self {
            OutboundRecord::Put(put) => Some(&put.id),
            OutboundRecord::Clear(clear) => Some(&clear.id),
            OutboundRecord::Purge => None,
        }
    }
}

/// Topic layout under a prefix
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topics {
    prefix: String,
}

impl Default for Topics {
    fn default() -> Self {
        Self::new(DEFAULT_TOPIC_PREFIX)
    }
}

impl Topics {
    /// Topics under `prefix` (trailing slashes ignored)
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.trim_end_matches('/').to_string(),
        }
    }

    /// `{prefix}/data/{id}`
    pub fn data(&self, id: &LevelId) -> String {
        format!("{}/data/{id}", self.prefix)
    }

    /// `{prefix}/control`
    pub fn control(&self) -> String {
        format!("{}/control", self.prefix)
    }

    /// Topic a record belongs on
    pub fn for_record(&self, record: &OutboundRecord) -> String {
        match record.level_id() {
            Some(id) => self.data(id),
            None => self.control(),
        }
    }
}

/// A record addressed to its topic
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    /// Destination topic
    pub topic: String,
    /// Record to publish
    pub record: OutboundRecord,
}

impl Envelope {
    /// Address `record` using `topics`
    pub fn new(topics: &Topics, record: OutboundRecord) -> Self {
        Self {
            topic: topics.for_record(&record),
            record,
        }
    }

    /// JSON payload
    ///
    /// # Errors
    /// Propagates `serde_json` failures.
    pub fn payload(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(&self.record)
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// PUT for a band that has an outline
pub fn put_record(tick: &StormTick, band: &BandReading, geometry: Geometry, cycle: u64) -> PutRecord {
    PutRecord {
        id: band.id.clone(),
        geometry,
        properties: BandProperties {
            storm: tick.storm.clone(),
            wind_level: band.level,
            label: band.label.clone(),
            wind_speed_mph: round1(*band.snapshot.wind_speed),
            category: tick.category,
            pressure_hpa: round1(tick.pressure_hpa),
            radius_km: round1(*band.snapshot.radius),
            center_lat: tick.center.lat,
            center_lon: tick.center.lon,
            tick: tick.time.tick,
            timestamp: tick.time.elapsed.as_secs_f64(),
            cycle,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clear(id: &str) -> OutboundRecord {
        OutboundRecord::Clear(ClearRecord {
            id: LevelId::new(id, WindLevel::L5),
            storm: "Marie".to_string(),
            wind_level: WindLevel::L5,
            reason: ClearReason::Ceased,
            tick: 45,
            timestamp: 450.0,
            cycle: 0,
        })
    }

    #[test]
    fn test_clear_payload_shape() {
        let envelope = Envelope::new(&Topics::default(), clear("M"));
        assert_eq!(envelope.topic, "producers/hurricane/data/M5");

        let value: serde_json::Value = serde_json::from_slice(&envelope.payload().unwrap()).unwrap();
        assert_eq!(value["action"], "CLEAR");
        assert_eq!(value["id"], "M5");
        assert_eq!(value["wind_level"], "L5");
        assert_eq!(value["reason"], "ceased");
        assert!(value.get("geometry").is_none());
    }

    #[test]
    fn test_purge_goes_to_control() {
        let topics = Topics::new("sim/storms/");
        let envelope = Envelope::new(&topics, OutboundRecord::Purge);
        assert_eq!(envelope.topic, "sim/storms/control");

        let value: serde_json::Value = serde_json::from_slice(&envelope.payload().unwrap()).unwrap();
        assert_eq!(value, serde_json::json!({ "action": "PURGE" }));
    }

    #[test]
    fn test_round1() {
        assert_eq!(round1(74.26), 74.3);
        assert_eq!(round1(-0.04), -0.0);
    }
}
