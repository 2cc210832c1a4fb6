//! Radar Projection
//!
//! Maps (display angle, distance) pairs onto screen space. Angle 0 points
//! up (straight ahead) and grows clockwise; screen `y` grows downwards.
//!
//! Nearer landmarks get longer lines:
//!
//! ```text
//! ratio  = max(min_ratio, 1 - min(d, max_d) / max_d)
//! length = max(min_length, max_length * ratio)
//! ```

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// Smallest fraction of the maximum line length a landmark is drawn with
pub const DEFAULT_MIN_LENGTH_RATIO: f64 = 0.05;

/// Lines never get shorter than this (display units)
pub const DEFAULT_MIN_LINE_LENGTH: f64 = 40.0;

/// Default longest line (display units)
pub const DEFAULT_MAX_LINE_LENGTH: f64 = 260.0;

/// Default distance at which lines reach their minimum length (km)
pub const DEFAULT_MAX_DISPLAY_DISTANCE_KM: f64 = 200.0;

/// Labels sit at this fraction of the line length
pub const LABEL_POSITION_RATIO: f64 = 0.6;

/// Geometry of the drawing area
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RadarBounds {
    /// Origin of every line
    pub center: Point2<f64>,
    pub max_line_length: f64,
    pub min_line_length: f64,
    pub min_length_ratio: f64,
    /// Distances below this are drawn as if they were this far (km)
    pub min_distance_km: f64,
    /// Distances at or beyond this get the shortest line (km)
    pub max_distance_km: f64,
}

impl Default for RadarBounds {
    fn default() -> Self {
        RadarBounds {
            center: Point2::new(300.0, 300.0),
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
            min_line_length: DEFAULT_MIN_LINE_LENGTH,
            min_length_ratio: DEFAULT_MIN_LENGTH_RATIO,
            min_distance_km: 0.0,
            max_distance_km: DEFAULT_MAX_DISPLAY_DISTANCE_KM,
        }
    }
}

/// Screen geometry of one landmark line
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Projection {
    pub start: Point2<f64>,
    pub end: Point2<f64>,
    /// Where the distance label is anchored
    pub label_anchor: Point2<f64>,
    pub length: f64,
}

/// Converts display angles and distances to screen segments
#[derive(Debug, Clone, Copy, Default)]
pub struct RadarProjector {
    bounds: RadarBounds,
}

impl RadarProjector {
    pub fn new(bounds: RadarBounds) -> Self {
        RadarProjector { bounds }
    }

    pub fn bounds(&self) -> &RadarBounds {
        &self.bounds
    }

    /// Line length for a landmark `distance_km` away
    pub fn line_length(&self, distance_km: f64) -> f64 {
        let b = &self.bounds;
        let clamped = distance_km.max(b.min_distance_km).min(b.max_distance_km);
        let ratio = (1.0 - clamped / b.max_distance_km).max(b.min_length_ratio);
        (b.max_line_length * ratio).max(b.min_line_length)
    }

    /// Point `length` units from the center in direction `angle_deg`
    #[inline]
    pub fn point_at(&self, angle_deg: f64, length: f64) -> Point2<f64> {
        let theta = angle_deg.to_radians();
        Point2::new(
            self.bounds.center.x + theta.sin() * length,
            self.bounds.center.y - theta.cos() * length,
        )
    }

    /// Project one landmark. Returns `None` when the input is degenerate
    /// (NaN or infinite), so that the segment is hidden instead of drawn
    /// at garbage coordinates.
    pub fn project(&self, display_angle: f64, distance_km: f64) -> Option<Projection> {
        if !display_angle.is_finite() || !distance_km.is_finite() || distance_km < 0.0 {
            return None;
        }

        let length = self.line_length(distance_km);
        let end = self.point_at(display_angle, length);
        let label_anchor = self.point_at(display_angle, length * LABEL_POSITION_RATIO);

        if !(length.is_finite() && end.x.is_finite() && end.y.is_finite()) {
            return None;
        }

        Some(Projection {
            start: self.bounds.center,
            end,
            label_anchor,
            length,
        })
    }
}
