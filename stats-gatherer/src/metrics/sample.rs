use super::ServerInventoryRecord;
use chrono::{
    DateTime,
    Utc,
};
use serde::{
    Deserialize,
    Serialize,
};

pub const UNKNOWN: &str = "unknown";

/// Occupancy snapshot reported by a provider.
///
/// Every field has a default so a server without provider data still yields a complete sample.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichmentSample {
    pub mode: String,
    pub map: String,
    pub players: u32,
    pub queue: u32,
    pub favorites: u32,
}

impl Default for EnrichmentSample {
    fn default() -> Self {
        Self {
            mode: UNKNOWN.to_string(),
            map: UNKNOWN.to_string(),
            players: 0,
            queue: 0,
            favorites: 0,
        }
    }
}

impl EnrichmentSample {
    /// Builds a sample from optional provider fields, falling back to the defaults per field.
    pub fn from_parts(
        mode: Option<String>,
        map: Option<String>,
        players: Option<u32>,
        queue: Option<u32>,
        favorites: Option<u32>,
    ) -> Self {
        let defaults = Self::default();
        Self {
            mode: mode.filter(|m| !m.is_empty()).unwrap_or(defaults.mode),
            map: map.filter(|m| !m.is_empty()).unwrap_or(defaults.map),
            players: players.unwrap_or(defaults.players),
            queue: queue.unwrap_or(defaults.queue),
            favorites: favorites.unwrap_or(defaults.favorites),
        }
    }
}

/// The point written to the sink: inventory capacity plus provider occupancy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergedMetricSample {
    pub server_id: u64,
    pub used_slots: u32,
    pub max_slots: u32,
    pub players: u32,
    pub queue: u32,
    pub mode: String,
    pub map: String,
    pub favorites: u32,
    pub captured_at: DateTime<Utc>,
}

impl MergedMetricSample {
    pub fn merge(record: &ServerInventoryRecord, enrichment: EnrichmentSample, captured_at: DateTime<Utc>) -> Self {
        Self {
            server_id: record.server_id,
            used_slots: record.used_slots,
            max_slots: record.max_slots,
            players: enrichment.players,
            queue: enrichment.queue,
            mode: enrichment.mode,
            map: enrichment.map,
            favorites: enrichment.favorites,
            captured_at,
        }
    }

    pub fn enrichment(&self) -> EnrichmentSample {
        EnrichmentSample {
            mode: self.mode.clone(),
            map: self.map.clone(),
            players: self.players,
            queue: self.queue,
            favorites: self.favorites,
        }
    }
}
