//! Core types and constants for the tag tracking system

pub mod constants;
pub mod types;

pub use constants::*;
pub use types::*;
