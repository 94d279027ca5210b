//! Exponential low-pass smoothing primitives

use nalgebra::Vector2;

/// One smoothing step from `previous` toward `raw` with coefficient `alpha`.
///
/// `alpha` = 0 ignores the new sample, `alpha` = 1 adopts it outright.
pub fn low_pass(previous: f64, raw: f64, alpha: f64) -> f64 {
    previous + alpha * (raw - previous)
}

/// Component-wise smoothing step for planar positions
pub fn low_pass_point(previous: Vector2<f64>, raw: Vector2<f64>, alpha: f64) -> Vector2<f64> {
    previous + (raw - previous) * alpha
}
