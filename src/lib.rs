//! UWB Tag Tracking
//!
//! 2D position tracking for a single tag inside a rectangular field with an
//! ultra-wideband anchor in each corner. Anchor distance readings arrive over
//! a pluggable feed, a closed-form trilateration pass turns them into a fix,
//! and a low-pass stage smooths the published position and error figure.

pub mod algorithms;
pub mod api;
pub mod core;
pub mod feed;
pub mod processing;
pub mod utils;

// Re-export commonly used types
pub use algorithms::RectangularTrilateration;
pub use api::{TrackCsvFormatter, TrackSnapshot, TrackingRuntime};
pub use core::{
    AnchorConfig, AnchorId, AnchorReading, Coordinate, DistanceSnapshot, FieldGeometry,
    PositionEstimate, PositionHistoryPoint,
};
pub use feed::{
    ChannelFeed, ConnectionState, FeedError, FeedEvent, FeedResult, RawReading, ReadingSource,
    SimulatedFeed,
};
pub use processing::TagTracker;
pub use utils::{ConfigError, TrackerConfig};
