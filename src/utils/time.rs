//! Wall-clock helpers
//!
//! Readings are stamped at receipt with the host clock. Only this module
//! touches `SystemTime`, so tests elsewhere can pass explicit timestamps.

use std::time::{SystemTime, UNIX_EPOCH};

/// Milliseconds since the Unix epoch, 0 if the clock is misconfigured
pub fn epoch_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or(0)
}
