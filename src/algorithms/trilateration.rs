//! Closed-form position solving for the rectangular anchor field
//!
//! The solver exploits the corner layout: each anchor pair sharing a field
//! edge yields a one-axis estimate from the range difference, so no iterative
//! least-squares pass is needed. Output is clamped to the field and annotated
//! with a mean absolute range residual as the goodness-of-fit metric.

use std::collections::HashMap;

use crate::core::{AnchorId, AnchorReading, FieldGeometry, PositionEstimate, ANCHOR_COUNT};

/// Axis coordinate from one anchor pair spanning `extent` along that axis
fn axis_estimate(r_near: f64, r_far: f64, extent: f64) -> f64 {
    (r_near.powi(2) - r_far.powi(2) + extent.powi(2)) / (2.0 * extent)
}

/// Position solver for a fixed rectangular 4-anchor layout
#[derive(Debug, Clone)]
pub struct RectangularTrilateration {
    pub geometry: FieldGeometry,
}

impl RectangularTrilateration {
    pub fn new(geometry: FieldGeometry) -> Self {
        RectangularTrilateration { geometry }
    }

    /// Solves the current reading table for a tag position.
    ///
    /// Readings with a non-positive distance are excluded. Returns `None`
    /// when fewer than three anchors are usable, and for any three-anchor
    /// combination other than anchors 1, 2 and 3.
    pub fn solve(&self, readings: &HashMap<AnchorId, AnchorReading>) -> Option<PositionEstimate> {
        // Range per anchor in layout order; 0 marks missing or unusable
        let mut ranges = [0.0f64; ANCHOR_COUNT];
        for reading in readings.values() {
            if reading.is_valid() {
                ranges[reading.anchor_id.index()] = reading.distance_cm;
            }
        }

        let valid_count = ranges.iter().filter(|r| **r > 0.0).count();
        if valid_count < 3 {
            return None;
        }

        let w = self.geometry.width_cm;
        let h = self.geometry.height_cm;
        let [r1, r2, r3, r4] = ranges;

        let (x, y) = if valid_count == ANCHOR_COUNT {
            // Full fix: both pair estimates per axis, averaged
            let x_front = axis_estimate(r1, r2, w);
            let x_rear = axis_estimate(r3, r4, w);
            let y_left = axis_estimate(r1, r3, h);
            let y_right = axis_estimate(r2, r4, h);
            ((x_front + x_rear) / 2.0, (y_left + y_right) / 2.0)
        } else if r4 <= 0.0 {
            // Exactly three usable ranges; only the 1-2-3 triple is solvable
            (axis_estimate(r1, r2, w), axis_estimate(r1, r3, h))
        } else {
            return None;
        };

        let position = self.geometry.clamp(x, y);
        let error_cm = self.residual_error(position, &ranges);

        Some(PositionEstimate { position, error_cm })
    }

    /// Mean absolute difference between solved-position ranges and measured
    /// ranges over the usable anchors, 0 when none are usable
    fn residual_error(&self, position: crate::core::Coordinate, ranges: &[f64; ANCHOR_COUNT]) -> f64 {
        let mut total = 0.0;
        let mut count = 0usize;
        for id in AnchorId::ALL {
            let measured = ranges[id.index()];
            if measured > 0.0 {
                let solved = position.distance_to(self.geometry.anchor_position(id));
                total += (solved - measured).abs();
                count += 1;
            }
        }
        if count == 0 {
            0.0
        } else {
            total / count as f64
        }
    }
}

impl Default for RectangularTrilateration {
    fn default() -> Self {
        RectangularTrilateration::new(FieldGeometry::default())
    }
}
