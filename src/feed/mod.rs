//! Reading sources and wire payload decoding
//!
//! Sources deliver `FeedEvent`s through the polled `ReadingSource` trait.
//! Inbound JSON payloads are decoded tolerantly: numeric fields may arrive
//! as numbers or strings, distances may be in centimeters (`distance_cm`)
//! or meters (`distance`), and malformed values normalize to 0 rather than
//! rejecting the event.

pub mod channel;
pub mod error;
pub mod simulator;
pub mod source;

pub use channel::ChannelFeed;
pub use error::{FeedError, FeedResult};
pub use simulator::SimulatedFeed;
pub use source::{ConnectionState, ReadingSource};

use serde::Deserialize;
use serde_json::Value;

use crate::core::{AnchorId, AnchorReading, Coordinate};

/// Normalized range measurement before receipt stamping
#[derive(Debug, Clone, PartialEq)]
pub struct RawReading {
    pub anchor_id: AnchorId,
    pub distance_cm: f64,
    pub rssi_dbm: f64,
}

impl RawReading {
    /// Stamps the measurement with its receipt time
    pub fn into_reading(self, received_ms: u64) -> AnchorReading {
        AnchorReading {
            anchor_id: self.anchor_id,
            distance_cm: self.distance_cm,
            rssi_dbm: self.rssi_dbm,
            received_ms,
        }
    }
}

/// One notification delivered by a reading source
#[derive(Debug, Clone, PartialEq)]
pub enum FeedEvent {
    /// One anchor range measurement
    Reading(RawReading),
    /// Fix computed independently upstream, displayed as-is
    ServerFix(Coordinate),
}

/// Reading row as it appears on the wire, before normalization
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReadingPayload {
    #[serde(default)]
    pub anchor_id: Option<Value>,
    #[serde(default)]
    pub distance_cm: Option<Value>,
    #[serde(default)]
    pub distance: Option<Value>,
    #[serde(default)]
    pub rssi: Option<Value>,
}

impl ReadingPayload {
    /// Normalizes the row into a measurement.
    ///
    /// `distance_cm` wins over `distance` (meters, scaled by 100); either
    /// may be numeric or a numeric string. Returns `None` when the anchor
    /// id does not name one of the four anchors.
    pub fn normalize(&self) -> Option<RawReading> {
        let anchor_id = match &self.anchor_id {
            Some(Value::Number(n)) => n.as_u64().and_then(AnchorId::from_number),
            Some(Value::String(s)) => AnchorId::parse(s),
            _ => None,
        }?;

        let distance_cm = match (&self.distance_cm, &self.distance) {
            (Some(cm), _) if !cm.is_null() => numeric_or_zero(cm),
            (_, Some(m)) if !m.is_null() => numeric_or_zero(m) * 100.0,
            _ => 0.0,
        };

        let rssi_dbm = self.rssi.as_ref().map(numeric_or_zero).unwrap_or(0.0);

        Some(RawReading {
            anchor_id,
            distance_cm,
            rssi_dbm,
        })
    }
}

/// Decodes one JSON line into a feed event.
///
/// Rows carrying both `est_x` and `est_y` are server fixes; everything else
/// is treated as a reading row.
pub fn parse_event(line: &str) -> FeedResult<FeedEvent> {
    let value: Value = serde_json::from_str(line).map_err(|e| FeedError::Payload {
        details: e.to_string(),
    })?;

    if let (Some(x), Some(y)) = (value.get("est_x"), value.get("est_y")) {
        return Ok(FeedEvent::ServerFix(Coordinate::new(
            numeric_or_zero(x),
            numeric_or_zero(y),
        )));
    }

    let payload: ReadingPayload =
        serde_json::from_value(value).map_err(|e| FeedError::Payload {
            details: e.to_string(),
        })?;
    match payload.normalize() {
        Some(raw) => Ok(FeedEvent::Reading(raw)),
        None => Err(FeedError::Payload {
            details: format!("unrecognized anchor id in: {line}"),
        }),
    }
}

/// Numeric field tolerance: numbers pass through, numeric strings parse,
/// everything else (and non-finite text) becomes 0
fn numeric_or_zero(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .unwrap_or(0.0),
        _ => 0.0,
    }
}
