//! Radar Configuration
//!
//! Every tunable of the layout engine in one serializable value. All fields
//! have defaults, so a partial JSON document is a valid configuration:
//!
//! ```json
//! { "alignmentToleranceDeg": 8, "refreshIntervalMs": 100 }
//! ```

use nalgebra::Point2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::alignment::{AlignmentPolicy, DEFAULT_ALIGNMENT_TOLERANCE_DEG};
use crate::cluster::ClusterStrategy;
use crate::projector::{
    RadarBounds, DEFAULT_MAX_DISPLAY_DISTANCE_KM, DEFAULT_MAX_LINE_LENGTH,
    DEFAULT_MIN_LENGTH_RATIO, DEFAULT_MIN_LINE_LENGTH,
};
use crate::state::FixPolicy;

/// Default spacing between landmarks of one cluster in degrees
pub const DEFAULT_CLUSTER_SPACING_DEG: f64 = 3.0;

/// Default minimum time between two frame rebuilds
pub const DEFAULT_REFRESH_INTERVAL_MS: u64 = 60;

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("invalid {parameter} = {value}: {reason}")]
    InvalidParameter {
        parameter: &'static str,
        value: f64,
        reason: &'static str,
    },

    #[error("cannot parse configuration: {0}")]
    Parse(String),
}

/// Layout engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RadarConfig {
    /// Half-width of the forward band in degrees
    pub alignment_tolerance_deg: f64,

    /// Which group is surfaced when several clusters are aligned
    pub alignment_policy: AlignmentPolicy,

    /// Join threshold and fan-out spacing for clusters in degrees
    pub cluster_spacing_deg: f64,

    pub cluster_strategy: ClusterStrategy,

    /// Distance at which lines reach their shortest length (km)
    pub max_display_distance_km: f64,

    /// Distances below this are drawn as if they were this far (km)
    pub min_display_distance_km: f64,

    /// Longest line in display units
    pub max_line_length: f64,

    /// Shortest line in display units
    pub min_line_length: f64,

    /// Lower bound of the distance-to-length ratio
    pub min_length_ratio: f64,

    /// Minimum time between two rebuilds
    pub refresh_interval_ms: u64,

    /// Origin of all lines in display coordinates
    pub canvas_center: Point2<f64>,

    /// Position fix acquisition and staleness windows
    pub fix: FixPolicy,
}

impl Default for RadarConfig {
    fn default() -> Self {
        RadarConfig {
            alignment_tolerance_deg: DEFAULT_ALIGNMENT_TOLERANCE_DEG,
            alignment_policy: AlignmentPolicy::default(),
            cluster_spacing_deg: DEFAULT_CLUSTER_SPACING_DEG,
            cluster_strategy: ClusterStrategy::default(),
            max_display_distance_km: DEFAULT_MAX_DISPLAY_DISTANCE_KM,
            min_display_distance_km: 0.0,
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
            min_line_length: DEFAULT_MIN_LINE_LENGTH,
            min_length_ratio: DEFAULT_MIN_LENGTH_RATIO,
            refresh_interval_ms: DEFAULT_REFRESH_INTERVAL_MS,
            canvas_center: Point2::new(300.0, 300.0),
            fix: FixPolicy::default(),
        }
    }
}

fn invalid(parameter: &'static str, value: f64, reason: &'static str) -> ConfigError {
    ConfigError::InvalidParameter {
        parameter,
        value,
        reason,
    }
}

impl RadarConfig {
    /// Parse and validate a JSON configuration
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: RadarConfig =
            serde_json::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Projector geometry derived from this configuration
    pub fn bounds(&self) -> RadarBounds {
        RadarBounds {
            center: self.canvas_center,
            max_line_length: self.max_line_length,
            min_line_length: self.min_line_length,
            min_length_ratio: self.min_length_ratio,
            min_distance_km: self.min_display_distance_km,
            max_distance_km: self.max_display_distance_km,
        }
    }

    /// Check every parameter. Returns the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let tolerance = self.alignment_tolerance_deg;
        if !tolerance.is_finite() || !(0.0..=180.0).contains(&tolerance) {
            return Err(invalid("alignmentToleranceDeg", tolerance, "must be within 0..=180"));
        }

        let spacing = self.cluster_spacing_deg;
        if !spacing.is_finite() || spacing <= 0.0 || spacing > 180.0 {
            return Err(invalid("clusterSpacingDeg", spacing, "must be within (0, 180]"));
        }

        let max_distance = self.max_display_distance_km;
        if !max_distance.is_finite() || max_distance <= 0.0 {
            return Err(invalid("maxDisplayDistanceKm", max_distance, "must be positive"));
        }

        let min_distance = self.min_display_distance_km;
        if !min_distance.is_finite() || min_distance < 0.0 || min_distance >= max_distance {
            return Err(invalid(
                "minDisplayDistanceKm",
                min_distance,
                "must be at least 0 and below maxDisplayDistanceKm",
            ));
        }

        let max_length = self.max_line_length;
        if !max_length.is_finite() || max_length <= 0.0 {
            return Err(invalid("maxLineLength", max_length, "must be positive"));
        }

        let min_length = self.min_line_length;
        if !min_length.is_finite() || min_length < 0.0 || min_length > max_length {
            return Err(invalid(
                "minLineLength",
                min_length,
                "must be within 0..=maxLineLength",
            ));
        }

        let ratio = self.min_length_ratio;
        if !ratio.is_finite() || !(0.0..=1.0).contains(&ratio) {
            return Err(invalid("minLengthRatio", ratio, "must be within 0..=1"));
        }

        if self.refresh_interval_ms == 0 {
            return Err(invalid("refreshIntervalMs", 0.0, "must be positive"));
        }

        if !self.canvas_center.x.is_finite() || !self.canvas_center.y.is_finite() {
            return Err(invalid("canvasCenter", f64::NAN, "must be finite"));
        }

        Ok(())
    }
}
