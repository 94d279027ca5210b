//! Track export formats
//!
//! CSV for the raw position trail plus a JSON status snapshot, shaped the
//! way status displays and offline analysis expect them.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::core::{Coordinate, PositionEstimate, PositionHistoryPoint};

use super::runtime::TrackingRuntime;

/// CSV rendering for the raw position trail
#[derive(Debug, Clone, Default)]
pub struct TrackCsvFormatter;

impl TrackCsvFormatter {
    pub fn new() -> Self {
        TrackCsvFormatter
    }

    /// Header row of the export
    pub fn header(&self) -> &'static str {
        "timestamp,x,y"
    }

    /// One trail point as a CSV row
    pub fn row(&self, point: &PositionHistoryPoint) -> String {
        format!(
            "{},{},{}",
            point.timestamp_ms, point.position.x, point.position.y
        )
    }

    /// Renders the header plus one row per trail point
    pub fn render<'a, I>(&self, history: I) -> String
    where
        I: IntoIterator<Item = &'a PositionHistoryPoint>,
    {
        let rows: Vec<String> = history.into_iter().map(|p| self.row(p)).collect();
        if rows.is_empty() {
            format!("{}\n", self.header())
        } else {
            format!("{}\n{}", self.header(), rows.join("\n"))
        }
    }
}

/// One anchor's latest reading as shown on status displays
#[derive(Debug, Clone, Serialize)]
pub struct AnchorReadingView {
    pub label: String,
    pub distance_cm: f64,
    pub rssi_dbm: f64,
    pub received_ms: u64,
    pub online: bool,
    pub strong_signal: bool,
}

/// Point-in-time summary of the whole tracking system
#[derive(Debug, Clone, Serialize)]
pub struct TrackSnapshot {
    pub connection: String,
    pub position: Option<PositionEstimate>,
    pub server_position: Option<Coordinate>,
    pub active_anchors: usize,
    pub last_sync_ms: Option<u64>,
    pub anchors: BTreeMap<String, AnchorReadingView>,
}

impl TrackSnapshot {
    /// Captures the runtime state, judging anchor freshness at `now_ms`
    pub fn capture(runtime: &TrackingRuntime, now_ms: u64) -> Self {
        let mut anchors = BTreeMap::new();
        for (id, reading) in runtime.readings() {
            anchors.insert(
                id.to_string(),
                AnchorReadingView {
                    label: runtime.geometry().anchor(*id).label.clone(),
                    distance_cm: reading.distance_cm,
                    rssi_dbm: reading.rssi_dbm,
                    received_ms: reading.received_ms,
                    online: reading.is_fresh(now_ms),
                    strong_signal: reading.is_strong(),
                },
            );
        }
        TrackSnapshot {
            connection: runtime.connection().to_string(),
            position: runtime.position(),
            server_position: runtime.server_position(),
            active_anchors: anchors.values().filter(|a| a.online).count(),
            last_sync_ms: runtime.last_sync_ms(),
            anchors,
        }
    }

    /// Pretty JSON rendering of the snapshot
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}
