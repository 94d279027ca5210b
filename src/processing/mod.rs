//! Reading aggregation and smoothing

pub mod lowpass;
pub mod tracker;

pub use lowpass::{low_pass, low_pass_point};
pub use tracker::TagTracker;
