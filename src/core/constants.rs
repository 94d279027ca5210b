//! Fixed design parameters for the tracking system

/// Default field width (cm)
pub const DEFAULT_FIELD_WIDTH_CM: f64 = 40.0;

/// Default field height (cm)
pub const DEFAULT_FIELD_HEIGHT_CM: f64 = 40.0;

/// Number of anchors in the fixed corner layout
pub const ANCHOR_COUNT: usize = 4;

/// Smoothing coefficient for the position channel
pub const POSITION_SMOOTHING_ALPHA: f64 = 0.15;

/// Smoothing coefficient for the fit-error channel
pub const ERROR_SMOOTHING_ALPHA: f64 = 0.1;

/// Maximum retained raw position estimates
pub const POSITION_HISTORY_LIMIT: usize = 100;

/// Maximum retained distance snapshots
pub const DISTANCE_HISTORY_LIMIT: usize = 50;

/// Reading age beyond which an anchor counts as offline (ms)
pub const ANCHOR_STALE_AFTER_MS: u64 = 30_000;

/// Signal strength above which a reading counts as strong (dBm)
pub const STRONG_RSSI_DBM: f64 = -80.0;

/// Interval between simulated reading batches (ms)
pub const DEFAULT_DEMO_INTERVAL_MS: u64 = 200;

/// Display labels for the corner anchors, in anchor order
pub const DEFAULT_ANCHOR_LABELS: [&str; ANCHOR_COUNT] = [
    "Anchor 1 (BL)",
    "Anchor 2 (BR)",
    "Anchor 3 (TR)",
    "Anchor 4 (TL)",
];

/// Display colors for the corner anchors, in anchor order
pub const DEFAULT_ANCHOR_COLORS: [&str; ANCHOR_COUNT] = [
    "#3b82f6",
    "#a855f7",
    "#f59e0b",
    "#ef4444",
];
