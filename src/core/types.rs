//! Core data types for the tracking system

use std::fmt;

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

use super::constants::{
    ANCHOR_COUNT, ANCHOR_STALE_AFTER_MS, DEFAULT_ANCHOR_COLORS, DEFAULT_ANCHOR_LABELS,
    STRONG_RSSI_DBM,
};

/// Identifier of one of the four corner anchors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AnchorId {
    A1,
    A2,
    A3,
    A4,
}

impl AnchorId {
    /// All anchors in layout order (BL, BR, TR, TL)
    pub const ALL: [AnchorId; ANCHOR_COUNT] = [AnchorId::A1, AnchorId::A2, AnchorId::A3, AnchorId::A4];

    /// Wire number of the anchor (1..=4)
    pub fn number(self) -> u8 {
        match self {
            AnchorId::A1 => 1,
            AnchorId::A2 => 2,
            AnchorId::A3 => 3,
            AnchorId::A4 => 4,
        }
    }

    /// Zero-based index into layout-ordered arrays
    pub fn index(self) -> usize {
        self.number() as usize - 1
    }

    pub fn from_number(n: u64) -> Option<AnchorId> {
        match n {
            1 => Some(AnchorId::A1),
            2 => Some(AnchorId::A2),
            3 => Some(AnchorId::A3),
            4 => Some(AnchorId::A4),
            _ => None,
        }
    }

    /// Parses a wire identifier, tolerating surrounding whitespace
    pub fn parse(text: &str) -> Option<AnchorId> {
        text.trim().parse::<u64>().ok().and_then(AnchorId::from_number)
    }
}

impl fmt::Display for AnchorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number())
    }
}

/// Planar position in field coordinates (cm)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub x: f64,
    pub y: f64,
}

impl Coordinate {
    pub fn new(x: f64, y: f64) -> Self {
        Coordinate { x, y }
    }

    /// Euclidean distance to another field coordinate (cm)
    pub fn distance_to(self, other: Coordinate) -> f64 {
        (Vector2::new(self.x, self.y) - Vector2::new(other.x, other.y)).norm()
    }
}

/// One distance reading received from an anchor
#[derive(Debug, Clone, PartialEq)]
pub struct AnchorReading {
    pub anchor_id: AnchorId,
    /// Measured tag-to-anchor distance (cm); 0 marks an unusable reading
    pub distance_cm: f64,
    /// Received signal strength (dBm)
    pub rssi_dbm: f64,
    /// Receipt timestamp (epoch ms), assigned when the reading enters the system
    pub received_ms: u64,
}

impl AnchorReading {
    /// True when the distance can participate in a solve
    pub fn is_valid(&self) -> bool {
        self.distance_cm > 0.0
    }

    /// True when the reading is young enough for its anchor to count as online
    pub fn is_fresh(&self, now_ms: u64) -> bool {
        now_ms.saturating_sub(self.received_ms) < ANCHOR_STALE_AFTER_MS
    }

    /// True when signal strength is above the strong threshold
    pub fn is_strong(&self) -> bool {
        self.rssi_dbm > STRONG_RSSI_DBM
    }
}

/// Solver output: clamped field position with mean absolute residual
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PositionEstimate {
    pub position: Coordinate,
    /// Mean absolute range residual over the valid anchors (cm)
    pub error_cm: f64,
}

/// Raw (pre-smoothing) estimate retained for the track trail
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PositionHistoryPoint {
    pub position: Coordinate,
    pub timestamp_ms: u64,
}

/// Per-anchor distances captured at one ingest
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DistanceSnapshot {
    /// Latest known distance per anchor in layout order, if any reading exists
    pub distances_cm: [Option<f64>; ANCHOR_COUNT],
    pub timestamp_ms: u64,
}

impl DistanceSnapshot {
    pub fn distance(&self, id: AnchorId) -> Option<f64> {
        self.distances_cm[id.index()]
    }
}

/// Static description of one installed anchor
#[derive(Debug, Clone, PartialEq)]
pub struct AnchorConfig {
    pub id: AnchorId,
    pub label: String,
    pub color: String,
    pub position: Coordinate,
}

/// Rectangular field with one anchor at each corner
#[derive(Debug, Clone, PartialEq)]
pub struct FieldGeometry {
    pub width_cm: f64,
    pub height_cm: f64,
    pub anchors: [AnchorConfig; ANCHOR_COUNT],
}

impl FieldGeometry {
    /// Builds the standard layout: anchors 1..4 at BL, BR, TR, TL
    pub fn new(width_cm: f64, height_cm: f64) -> Self {
        let corners = [
            Coordinate::new(0.0, 0.0),
            Coordinate::new(width_cm, 0.0),
            Coordinate::new(width_cm, height_cm),
            Coordinate::new(0.0, height_cm),
        ];
        let anchors = std::array::from_fn(|i| AnchorConfig {
            id: AnchorId::ALL[i],
            label: DEFAULT_ANCHOR_LABELS[i].to_string(),
            color: DEFAULT_ANCHOR_COLORS[i].to_string(),
            position: corners[i],
        });
        FieldGeometry {
            width_cm,
            height_cm,
            anchors,
        }
    }

    pub fn anchor(&self, id: AnchorId) -> &AnchorConfig {
        &self.anchors[id.index()]
    }

    pub fn anchor_position(&self, id: AnchorId) -> Coordinate {
        self.anchors[id.index()].position
    }

    /// Clamps a point to the field bounds
    pub fn clamp(&self, x: f64, y: f64) -> Coordinate {
        Coordinate::new(x.clamp(0.0, self.width_cm), y.clamp(0.0, self.height_cm))
    }
}

impl Default for FieldGeometry {
    fn default() -> Self {
        FieldGeometry::new(
            super::constants::DEFAULT_FIELD_WIDTH_CM,
            super::constants::DEFAULT_FIELD_HEIGHT_CM,
        )
    }
}
