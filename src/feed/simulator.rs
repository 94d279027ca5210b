//! Synthetic reading source driving a figure-8 demo track

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use rand::Rng;

use crate::core::{Coordinate, FieldGeometry, DEFAULT_DEMO_INTERVAL_MS};

use super::error::{FeedError, FeedResult};
use super::source::{ConnectionState, ReadingSource};
use super::{FeedEvent, RawReading};

/// Phase advance per generated batch (rad)
const PHASE_STEP: f64 = 0.05;

/// Orbit radius as a fraction of the shorter field edge
const RADIUS_FACTOR: f64 = 0.4;

/// Peak-to-peak distance noise (cm)
const NOISE_SPAN_CM: f64 = 10.0;

/// Demo source emitting noisy ranges for a tag tracing a Lissajous curve.
///
/// One batch of four readings (one per anchor) is produced per interval
/// tick; the batch drains one event per poll so the consumer ingests
/// readings individually, the way a live feed delivers them.
pub struct SimulatedFeed {
    geometry: FieldGeometry,
    interval: Duration,
    phase: f64,
    last_batch: Option<Instant>,
    pending: VecDeque<RawReading>,
    closed: bool,
}

impl SimulatedFeed {
    pub fn new(geometry: FieldGeometry) -> Self {
        Self::with_interval(geometry, Duration::from_millis(DEFAULT_DEMO_INTERVAL_MS))
    }

    pub fn with_interval(geometry: FieldGeometry, interval: Duration) -> Self {
        SimulatedFeed {
            geometry,
            interval,
            phase: 0.0,
            last_batch: None,
            pending: VecDeque::new(),
            closed: false,
        }
    }

    /// Phase the next batch will be generated at
    pub fn phase(&self) -> f64 {
        self.phase
    }

    /// Ground-truth tag position on the demo path at `phase`
    pub fn truth_at(geometry: &FieldGeometry, phase: f64) -> Coordinate {
        let center_x = geometry.width_cm / 2.0;
        let center_y = geometry.height_cm / 2.0;
        let radius = RADIUS_FACTOR * geometry.width_cm.min(geometry.height_cm);
        Coordinate::new(
            center_x + radius * phase.cos(),
            center_y + radius * (2.0 * phase).sin() / 2.0,
        )
    }

    fn batch_due(&self) -> bool {
        match self.last_batch {
            None => true,
            Some(at) => at.elapsed() >= self.interval,
        }
    }

    fn generate_batch(&mut self) {
        let truth = Self::truth_at(&self.geometry, self.phase);
        self.phase += PHASE_STEP;

        let mut rng = rand::thread_rng();
        for anchor in &self.geometry.anchors {
            let true_dist = truth.distance_to(anchor.position);
            let noise = (rng.gen::<f64>() - 0.5) * NOISE_SPAN_CM;
            self.pending.push_back(RawReading {
                anchor_id: anchor.id,
                distance_cm: (true_dist + noise).max(0.0),
                // Simple path-loss shape with a little jitter
                rssi_dbm: -40.0 - true_dist * 0.2 + rng.gen::<f64>() * 5.0,
            });
        }
        self.last_batch = Some(Instant::now());
    }
}

impl ReadingSource for SimulatedFeed {
    fn poll(&mut self) -> FeedResult<Option<FeedEvent>> {
        if self.closed {
            return Err(FeedError::Closed {
                source: self.describe().to_string(),
                reason: "simulation stopped".to_string(),
            });
        }
        if self.pending.is_empty() && self.batch_due() {
            self.generate_batch();
        }
        Ok(self.pending.pop_front().map(FeedEvent::Reading))
    }

    fn describe(&self) -> &str {
        "simulation"
    }

    fn connection_state(&self) -> ConnectionState {
        if self.closed {
            ConnectionState::Disconnected {
                reason: "simulation stopped".to_string(),
            }
        } else {
            ConnectionState::Simulation
        }
    }

    fn close(&mut self) {
        self.closed = true;
        self.pending.clear();
    }
}
