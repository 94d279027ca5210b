//! Tracking runtime facade
//!
//! `TrackingRuntime` owns the tracker and the active reading source and is
//! the single mutation point of the system: callers install a source, call
//! `process` on their schedule, and read the track through the borrowed
//! views. Readings are stamped here, at receipt.

use log::{debug, info, warn};

use crate::core::{
    AnchorReading, Coordinate, DistanceSnapshot, FieldGeometry, PositionEstimate,
    PositionHistoryPoint,
};
use crate::feed::{ConnectionState, FeedEvent, ReadingSource, SimulatedFeed};
use crate::processing::TagTracker;
use crate::utils::time::epoch_ms;

use super::export::{TrackCsvFormatter, TrackSnapshot};

/// Cap on events consumed per `process` call, so a hot source cannot
/// starve the caller
const MAX_EVENTS_PER_PROCESS: usize = 64;

pub struct TrackingRuntime {
    tracker: TagTracker,
    source: Option<Box<dyn ReadingSource>>,
    /// Connection surfaced after the source is gone
    resting_state: ConnectionState,
    readings_ingested: u64,
    solve_count: u64,
}

impl TrackingRuntime {
    pub fn new(geometry: FieldGeometry) -> Self {
        TrackingRuntime {
            tracker: TagTracker::new(geometry),
            source: None,
            resting_state: ConnectionState::Idle,
            readings_ingested: 0,
            solve_count: 0,
        }
    }

    /// Installs a reading source, tearing down the previous one first.
    ///
    /// Track state (reading table, histories, smoothed channels) survives
    /// the switch; only the event producer changes.
    pub fn set_source(&mut self, source: Box<dyn ReadingSource>) {
        self.drop_source();
        info!("feed '{}' active", source.describe());
        self.source = Some(source);
    }

    /// Switches to the synthetic demo feed over the configured field
    pub fn start_simulation(&mut self) {
        let geometry = self.tracker.geometry().clone();
        self.set_source(Box::new(SimulatedFeed::new(geometry)));
    }

    /// Closes the active source and goes idle
    pub fn disconnect(&mut self) {
        self.drop_source();
        self.resting_state = ConnectionState::Idle;
    }

    fn drop_source(&mut self) {
        if let Some(mut old) = self.source.take() {
            info!("closing feed '{}'", old.describe());
            old.close();
            self.resting_state = ConnectionState::Idle;
        }
    }

    /// Drains pending events from the active source.
    ///
    /// Returns the number of events consumed. Undecodable payloads are
    /// logged and skipped; a fatal source error tears the source down and
    /// leaves the disconnect reason in the connection state.
    pub fn process(&mut self) -> usize {
        let mut consumed = 0;
        while consumed < MAX_EVENTS_PER_PROCESS {
            let polled = match self.source.as_mut() {
                None => break,
                Some(source) => source.poll(),
            };
            match polled {
                Ok(Some(event)) => {
                    self.dispatch(event);
                    consumed += 1;
                }
                Ok(None) => break,
                Err(err) if err.is_fatal() => {
                    warn!("feed lost: {err}");
                    self.resting_state = ConnectionState::Disconnected {
                        reason: err.to_string(),
                    };
                    if let Some(mut dead) = self.source.take() {
                        dead.close();
                    }
                    break;
                }
                Err(err) => {
                    warn!("skipping event: {err}");
                    consumed += 1;
                }
            }
        }
        consumed
    }

    fn dispatch(&mut self, event: FeedEvent) {
        match event {
            FeedEvent::Reading(raw) => {
                let reading = raw.into_reading(epoch_ms());
                let anchor = reading.anchor_id;
                self.readings_ingested += 1;
                match self.tracker.ingest(reading) {
                    Some(raw_fix) => {
                        self.solve_count += 1;
                        debug!(
                            "anchor {anchor}: raw fix x={:.2} y={:.2} err={:.2}",
                            raw_fix.position.x, raw_fix.position.y, raw_fix.error_cm
                        );
                    }
                    None => debug!("anchor {anchor}: reading stored, no fix"),
                }
            }
            FeedEvent::ServerFix(position) => {
                debug!("server fix x={:.2} y={:.2}", position.x, position.y);
                self.tracker.set_server_position(position);
            }
        }
    }

    /// Connection as surfaced to operators
    pub fn connection(&self) -> ConnectionState {
        match &self.source {
            Some(source) => source.connection_state(),
            None => self.resting_state.clone(),
        }
    }

    pub fn geometry(&self) -> &FieldGeometry {
        self.tracker.geometry()
    }

    /// Smoothed tag position, once any solve has succeeded
    pub fn position(&self) -> Option<PositionEstimate> {
        self.tracker.position()
    }

    pub fn server_position(&self) -> Option<Coordinate> {
        self.tracker.server_position()
    }

    pub fn reading(&self, id: crate::core::AnchorId) -> Option<&AnchorReading> {
        self.tracker.reading(id)
    }

    pub fn readings(&self) -> &std::collections::HashMap<crate::core::AnchorId, AnchorReading> {
        self.tracker.readings()
    }

    pub fn position_history(&self) -> &std::collections::VecDeque<PositionHistoryPoint> {
        self.tracker.position_history()
    }

    pub fn distance_history(&self) -> &std::collections::VecDeque<DistanceSnapshot> {
        self.tracker.distance_history()
    }

    /// Anchors whose latest reading is younger than the staleness window
    pub fn active_anchor_count(&self) -> usize {
        self.tracker.active_anchor_count(epoch_ms())
    }

    pub fn last_sync_ms(&self) -> Option<u64> {
        self.tracker.last_sync_ms()
    }

    pub fn readings_ingested(&self) -> u64 {
        self.readings_ingested
    }

    pub fn solve_count(&self) -> u64 {
        self.solve_count
    }

    /// Track trail as a CSV document
    pub fn export_history_csv(&self) -> String {
        TrackCsvFormatter::new().render(self.tracker.position_history())
    }

    /// Point-in-time status summary
    pub fn snapshot(&self) -> TrackSnapshot {
        TrackSnapshot::capture(self, epoch_ms())
    }
}

impl Drop for TrackingRuntime {
    fn drop(&mut self) {
        self.drop_source();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::AnchorId;
    use crate::feed::{ChannelFeed, FeedResult, RawReading};
    use std::cell::Cell;
    use std::collections::VecDeque;
    use std::rc::Rc;

    /// Source with a fixed script of events, recording whether it was closed
    struct ScriptedSource {
        events: VecDeque<FeedResult<FeedEvent>>,
        closed: Rc<Cell<bool>>,
    }

    impl ScriptedSource {
        fn new(events: Vec<FeedResult<FeedEvent>>) -> (Self, Rc<Cell<bool>>) {
            let closed = Rc::new(Cell::new(false));
            (
                ScriptedSource {
                    events: events.into(),
                    closed: closed.clone(),
                },
                closed,
            )
        }
    }

    impl ReadingSource for ScriptedSource {
        fn poll(&mut self) -> FeedResult<Option<FeedEvent>> {
            match self.events.pop_front() {
                Some(next) => next.map(Some),
                None => Ok(None),
            }
        }

        fn describe(&self) -> &str {
            "scripted"
        }

        fn connection_state(&self) -> ConnectionState {
            ConnectionState::Connected
        }

        fn close(&mut self) {
            self.closed.set(true);
        }
    }

    fn reading_event(id: AnchorId, distance_cm: f64) -> FeedResult<FeedEvent> {
        Ok(FeedEvent::Reading(RawReading {
            anchor_id: id,
            distance_cm,
            rssi_dbm: -60.0,
        }))
    }

    #[test]
    fn simulation_mode_fills_the_track() {
        let mut runtime = TrackingRuntime::new(FieldGeometry::default());
        assert_eq!(runtime.connection(), ConnectionState::Idle);

        runtime.start_simulation();
        assert_eq!(runtime.connection(), ConnectionState::Simulation);

        // The first demo batch is due immediately
        assert_eq!(runtime.process(), 4);
        assert_eq!(runtime.readings().len(), 4);
        assert_eq!(runtime.readings_ingested(), 4);

        let fix = runtime.position().expect("four anchors must solve");
        let geometry = runtime.geometry();
        assert!(fix.position.x >= 0.0 && fix.position.x <= geometry.width_cm);
        assert!(fix.position.y >= 0.0 && fix.position.y <= geometry.height_cm);
    }

    #[test]
    fn switching_sources_closes_the_old_one() {
        let mut runtime = TrackingRuntime::new(FieldGeometry::default());
        let (scripted, closed) = ScriptedSource::new(vec![]);
        runtime.set_source(Box::new(scripted));
        assert!(!closed.get());

        runtime.start_simulation();
        assert!(closed.get());
        assert_eq!(runtime.connection(), ConnectionState::Simulation);
    }

    #[test]
    fn disconnect_goes_idle_and_closes() {
        let mut runtime = TrackingRuntime::new(FieldGeometry::default());
        let (scripted, closed) = ScriptedSource::new(vec![reading_event(AnchorId::A1, 10.0)]);
        runtime.set_source(Box::new(scripted));
        runtime.process();

        runtime.disconnect();
        assert!(closed.get());
        assert_eq!(runtime.connection(), ConnectionState::Idle);
        // Track state survives the teardown
        assert_eq!(runtime.readings().len(), 1);
    }

    #[test]
    fn live_feed_events_reach_the_tracker() {
        let mut runtime = TrackingRuntime::new(FieldGeometry::default());
        let (feed, tx) = ChannelFeed::new("live");
        runtime.set_source(Box::new(feed));
        assert_eq!(runtime.connection(), ConnectionState::Connected);

        tx.send(r#"{"anchor_id": 1, "distance_cm": 14.142135623730951}"#.to_string())
            .unwrap();
        tx.send(r#"{"anchor_id": 2, "distance_cm": 31.622776601683793}"#.to_string())
            .unwrap();
        tx.send(r#"{"anchor_id": 3, "distance_cm": 31.622776601683793}"#.to_string())
            .unwrap();
        tx.send(r#"{"est_x": 9.5, "est_y": 10.5}"#.to_string()).unwrap();

        assert_eq!(runtime.process(), 4);
        assert_eq!(runtime.readings_ingested(), 3);
        assert_eq!(runtime.solve_count(), 1);

        let fix = runtime.position().expect("triple 1-2-3 solves");
        assert!((fix.position.x - 10.0).abs() < 1e-6);
        assert!((fix.position.y - 10.0).abs() < 1e-6);
        assert_eq!(runtime.server_position(), Some(Coordinate::new(9.5, 10.5)));

        // Receipt stamps come from the wall clock at ingest
        let stamped = runtime.reading(AnchorId::A1).unwrap().received_ms;
        assert!(stamped > 1_600_000_000_000);
        assert_eq!(runtime.active_anchor_count(), 3);
    }

    #[test]
    fn undecodable_payloads_are_skipped() {
        let mut runtime = TrackingRuntime::new(FieldGeometry::default());
        let (feed, tx) = ChannelFeed::new("live");
        runtime.set_source(Box::new(feed));

        tx.send("{broken json".to_string()).unwrap();
        tx.send(r#"{"anchor_id": 2, "distance_cm": 20}"#.to_string())
            .unwrap();

        assert_eq!(runtime.process(), 2);
        assert_eq!(runtime.readings_ingested(), 1);
        assert_eq!(runtime.connection(), ConnectionState::Connected);
        assert!(runtime.reading(AnchorId::A2).is_some());
    }

    #[test]
    fn fatal_feed_errors_surface_as_disconnection() {
        let mut runtime = TrackingRuntime::new(FieldGeometry::default());
        let (feed, tx) = ChannelFeed::new("live");
        runtime.set_source(Box::new(feed));
        drop(tx);

        assert_eq!(runtime.process(), 0);
        assert!(matches!(
            runtime.connection(),
            ConnectionState::Disconnected { .. }
        ));
        // The dead source is gone; further processing is a no-op
        assert_eq!(runtime.process(), 0);
    }

    #[test]
    fn csv_export_covers_the_whole_trail() {
        let mut runtime = TrackingRuntime::new(FieldGeometry::default());
        let (scripted, _closed) = ScriptedSource::new(vec![
            reading_event(AnchorId::A1, 200.0f64.sqrt()),
            reading_event(AnchorId::A2, 1000.0f64.sqrt()),
            reading_event(AnchorId::A3, 1000.0f64.sqrt()),
            reading_event(AnchorId::A3, 200.0f64.sqrt()),
        ]);
        runtime.set_source(Box::new(scripted));
        runtime.process();

        let csv = runtime.export_history_csv();
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("timestamp,x,y"));
        assert_eq!(lines.count(), runtime.position_history().len());
    }
}
