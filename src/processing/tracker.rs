//! Stateful aggregation of anchor readings into a smoothed tag track

use std::collections::{HashMap, VecDeque};

use nalgebra::Vector2;

use crate::algorithms::RectangularTrilateration;
use crate::core::{
    AnchorId, AnchorReading, Coordinate, DistanceSnapshot, FieldGeometry, PositionEstimate,
    PositionHistoryPoint, DISTANCE_HISTORY_LIMIT, ERROR_SMOOTHING_ALPHA, POSITION_HISTORY_LIMIT,
    POSITION_SMOOTHING_ALPHA,
};

use super::lowpass::{low_pass, low_pass_point};

/// Aggregates per-anchor readings and maintains the smoothed tag state.
///
/// Each ingested reading replaces its anchor's table entry, triggers a solve
/// over the whole table, folds a successful result into the smoothed position
/// and error channels, and records the bounded histories. All state advances
/// in that single call; no other method mutates the track.
pub struct TagTracker {
    solver: RectangularTrilateration,
    readings: HashMap<AnchorId, AnchorReading>,
    smoothed_position: Option<Vector2<f64>>,
    smoothed_error_cm: f64,
    position_history: VecDeque<PositionHistoryPoint>,
    distance_history: VecDeque<DistanceSnapshot>,
    server_position: Option<Coordinate>,
}

impl TagTracker {
    pub fn new(geometry: FieldGeometry) -> Self {
        TagTracker {
            solver: RectangularTrilateration::new(geometry),
            readings: HashMap::new(),
            smoothed_position: None,
            smoothed_error_cm: 0.0,
            position_history: VecDeque::with_capacity(POSITION_HISTORY_LIMIT),
            distance_history: VecDeque::with_capacity(DISTANCE_HISTORY_LIMIT),
            server_position: None,
        }
    }

    pub fn geometry(&self) -> &FieldGeometry {
        &self.solver.geometry
    }

    /// Ingests one reading and runs the full update cycle.
    ///
    /// Returns the raw (unsmoothed) estimate when the table solved. A `None`
    /// leaves the smoothed channels and the position history untouched; the
    /// distance snapshot is recorded either way.
    pub fn ingest(&mut self, reading: AnchorReading) -> Option<PositionEstimate> {
        let stamp = reading.received_ms;
        self.readings.insert(reading.anchor_id, reading);

        let raw = self.solver.solve(&self.readings);
        if let Some(estimate) = raw {
            self.fold_estimate(estimate);
            self.position_history.push_back(PositionHistoryPoint {
                position: estimate.position,
                timestamp_ms: stamp,
            });
            if self.position_history.len() > POSITION_HISTORY_LIMIT {
                self.position_history.pop_front();
            }
        }

        self.distance_history.push_back(self.table_snapshot(stamp));
        if self.distance_history.len() > DISTANCE_HISTORY_LIMIT {
            self.distance_history.pop_front();
        }

        raw
    }

    /// Smoothed tag position with the smoothed fit error, once any solve
    /// has succeeded
    pub fn position(&self) -> Option<PositionEstimate> {
        self.smoothed_position.map(|p| PositionEstimate {
            position: Coordinate::new(p.x, p.y),
            error_cm: self.smoothed_error_cm,
        })
    }

    /// Latest reading per anchor
    pub fn readings(&self) -> &HashMap<AnchorId, AnchorReading> {
        &self.readings
    }

    pub fn reading(&self, id: AnchorId) -> Option<&AnchorReading> {
        self.readings.get(&id)
    }

    /// Raw estimates retained for the track trail, oldest first
    pub fn position_history(&self) -> &VecDeque<PositionHistoryPoint> {
        &self.position_history
    }

    /// Distance snapshots retained for charting, oldest first
    pub fn distance_history(&self) -> &VecDeque<DistanceSnapshot> {
        &self.distance_history
    }

    /// Stores the externally computed fix for display next to the local track
    pub fn set_server_position(&mut self, position: Coordinate) {
        self.server_position = Some(position);
    }

    pub fn server_position(&self) -> Option<Coordinate> {
        self.server_position
    }

    /// Number of anchors whose latest reading is still fresh at `now_ms`
    pub fn active_anchor_count(&self, now_ms: u64) -> usize {
        self.readings.values().filter(|r| r.is_fresh(now_ms)).count()
    }

    /// Receipt stamp of the newest reading in the table
    pub fn last_sync_ms(&self) -> Option<u64> {
        self.readings.values().map(|r| r.received_ms).max()
    }

    fn fold_estimate(&mut self, raw: PositionEstimate) {
        let raw_point = Vector2::new(raw.position.x, raw.position.y);
        self.smoothed_position = Some(match self.smoothed_position {
            // First fix snaps straight to the raw estimate
            None => raw_point,
            Some(prev) => low_pass_point(prev, raw_point, POSITION_SMOOTHING_ALPHA),
        });
        // The error channel always smooths from its 0 seed
        self.smoothed_error_cm = low_pass(self.smoothed_error_cm, raw.error_cm, ERROR_SMOOTHING_ALPHA);
    }

    fn table_snapshot(&self, stamp: u64) -> DistanceSnapshot {
        DistanceSnapshot {
            distances_cm: AnchorId::ALL.map(|id| self.readings.get(&id).map(|r| r.distance_cm)),
            timestamp_ms: stamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn reading(id: AnchorId, distance_cm: f64, received_ms: u64) -> AnchorReading {
        AnchorReading {
            anchor_id: id,
            distance_cm,
            rssi_dbm: -58.0,
            received_ms,
        }
    }

    /// Three readings whose triple solves exactly to (10, 10)
    fn prime_at_ten_ten(tracker: &mut TagTracker) -> PositionEstimate {
        assert!(tracker.ingest(reading(AnchorId::A1, 200.0f64.sqrt(), 1)).is_none());
        assert!(tracker.ingest(reading(AnchorId::A2, 1000.0f64.sqrt(), 2)).is_none());
        tracker
            .ingest(reading(AnchorId::A3, 1000.0f64.sqrt(), 3))
            .unwrap()
    }

    #[test]
    fn first_solve_snaps_position_but_smooths_error_from_zero() {
        let mut tracker = TagTracker::new(FieldGeometry::default());
        let raw = prime_at_ten_ten(&mut tracker);

        let smoothed = tracker.position().unwrap();
        assert_abs_diff_eq!(smoothed.position.x, raw.position.x, epsilon = 1e-12);
        assert_abs_diff_eq!(smoothed.position.y, raw.position.y, epsilon = 1e-12);
        // Position adopted the raw fix outright; the error channel did not
        assert_abs_diff_eq!(smoothed.error_cm, 0.1 * raw.error_cm, epsilon = 1e-12);
        assert!(smoothed.error_cm < raw.error_cm);
    }

    #[test]
    fn later_solves_move_a_fixed_fraction_of_the_gap() {
        let mut tracker = TagTracker::new(FieldGeometry::default());
        prime_at_ten_ten(&mut tracker);
        let err_after_first = tracker.position().unwrap().error_cm;

        // Updating anchor 3 to match anchor 1 moves the raw fix to (10, 20)
        let raw2 = tracker
            .ingest(reading(AnchorId::A3, 200.0f64.sqrt(), 4))
            .unwrap();
        assert_abs_diff_eq!(raw2.position.x, 10.0, epsilon = 1e-9);
        assert_abs_diff_eq!(raw2.position.y, 20.0, epsilon = 1e-9);

        let smoothed = tracker.position().unwrap();
        assert_abs_diff_eq!(smoothed.position.x, 10.0, epsilon = 1e-9);
        assert_abs_diff_eq!(smoothed.position.y, 11.5, epsilon = 1e-9);
        assert_abs_diff_eq!(
            smoothed.error_cm,
            err_after_first + 0.1 * (raw2.error_cm - err_after_first),
            epsilon = 1e-12
        );
    }

    #[test]
    fn repeated_identical_reading_holds_the_position() {
        let mut tracker = TagTracker::new(FieldGeometry::default());
        prime_at_ten_ten(&mut tracker);
        let before = tracker.position().unwrap();

        tracker
            .ingest(reading(AnchorId::A3, 1000.0f64.sqrt(), 4))
            .unwrap();
        let after = tracker.position().unwrap();

        assert_abs_diff_eq!(after.position.x, before.position.x, epsilon = 1e-12);
        assert_abs_diff_eq!(after.position.y, before.position.y, epsilon = 1e-12);
        assert_eq!(tracker.position_history().len(), 2);
    }

    #[test]
    fn failed_solve_keeps_smoothed_state_and_still_snapshots() {
        let mut tracker = TagTracker::new(FieldGeometry::default());
        prime_at_ten_ten(&mut tracker);
        let before = tracker.position().unwrap();
        let history_before = tracker.position_history().len();

        // Anchor 2 dropping to zero leaves only two usable ranges
        assert!(tracker.ingest(reading(AnchorId::A2, 0.0, 4)).is_none());

        assert_eq!(tracker.position(), Some(before));
        assert_eq!(tracker.position_history().len(), history_before);
        let snapshot = tracker.distance_history().back().unwrap();
        assert_eq!(snapshot.distance(AnchorId::A2), Some(0.0));
        assert_eq!(snapshot.timestamp_ms, 4);
    }

    #[test]
    fn reading_table_is_last_write_wins() {
        let mut tracker = TagTracker::new(FieldGeometry::default());
        tracker.ingest(reading(AnchorId::A1, 11.0, 1));
        tracker.ingest(reading(AnchorId::A1, 22.0, 2));

        assert_eq!(tracker.readings().len(), 1);
        let current = tracker.reading(AnchorId::A1).unwrap();
        assert_abs_diff_eq!(current.distance_cm, 22.0, epsilon = 1e-12);
        assert_eq!(current.received_ms, 2);
    }

    #[test]
    fn histories_are_bounded_fifo() {
        let mut tracker = TagTracker::new(FieldGeometry::default());
        tracker.ingest(reading(AnchorId::A2, 1000.0f64.sqrt(), 0));
        tracker.ingest(reading(AnchorId::A3, 1000.0f64.sqrt(), 1));
        // Every following ingest solves the {1,2,3} triple
        for i in 0..200u64 {
            tracker
                .ingest(reading(AnchorId::A1, 200.0f64.sqrt(), 2 + i))
                .unwrap();
        }

        assert_eq!(tracker.position_history().len(), POSITION_HISTORY_LIMIT);
        assert_eq!(tracker.distance_history().len(), DISTANCE_HISTORY_LIMIT);
        // Oldest entries were evicted first
        assert_eq!(tracker.position_history().front().unwrap().timestamp_ms, 102);
        assert_eq!(tracker.position_history().back().unwrap().timestamp_ms, 201);
        assert_eq!(tracker.distance_history().front().unwrap().timestamp_ms, 152);
        assert_eq!(tracker.distance_history().back().unwrap().timestamp_ms, 201);
    }

    #[test]
    fn server_position_is_never_blended() {
        let mut tracker = TagTracker::new(FieldGeometry::default());
        tracker.set_server_position(Coordinate::new(5.0, 7.0));
        prime_at_ten_ten(&mut tracker);

        assert_eq!(tracker.server_position(), Some(Coordinate::new(5.0, 7.0)));
        let local = tracker.position().unwrap().position;
        assert_abs_diff_eq!(local.x, 10.0, epsilon = 1e-9);
        assert_abs_diff_eq!(local.y, 10.0, epsilon = 1e-9);
    }

    #[test]
    fn liveness_views_follow_reading_stamps() {
        let mut tracker = TagTracker::new(FieldGeometry::default());
        assert_eq!(tracker.last_sync_ms(), None);
        assert_eq!(tracker.active_anchor_count(0), 0);

        tracker.ingest(reading(AnchorId::A1, 15.0, 1_000));
        tracker.ingest(reading(AnchorId::A2, 15.0, 40_000));

        assert_eq!(tracker.last_sync_ms(), Some(40_000));
        // At 40.5s the anchor stamped 1s ago is stale, the other is not
        assert_eq!(tracker.active_anchor_count(40_500), 1);
        assert_eq!(tracker.active_anchor_count(41_000), 1);
        assert_eq!(tracker.active_anchor_count(70_000), 0);
    }
}
