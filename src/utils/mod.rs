//! Configuration and clock utilities

pub mod config;
pub mod time;

pub use config::{ConfigError, TrackerConfig};
