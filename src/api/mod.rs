//! Application-facing surface
//!
//! [`TrackingRuntime`] owns one reading source at a time and drives the
//! tracker from it; the export types render its state for files and
//! status displays.

pub mod export;
pub mod runtime;

pub use export::{AnchorReadingView, TrackCsvFormatter, TrackSnapshot};
pub use runtime::TrackingRuntime;
