//! Landmark Types
//!
//! Landmarks are loaded once from the catalog and never change afterwards.
//! Observations and relative angles are derived from them every time the
//! user's position or heading changes.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::geo;

/// Stable identity of a landmark (its index in catalog order)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LandmarkId(pub u32);

impl fmt::Display for LandmarkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Geographic point in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        GeoPoint {
            latitude,
            longitude,
        }
    }

    /// Both coordinates finite and within their valid ranges
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }

    /// Great-circle distance to another point in kilometers
    pub fn distance_to(&self, other: &GeoPoint) -> f64 {
        geo::distance_km(self.latitude, self.longitude, other.latitude, other.longitude)
    }

    /// Initial bearing towards another point in degrees `[0, 360)`
    pub fn bearing_to(&self, other: &GeoPoint) -> f64 {
        geo::bearing_deg(self.latitude, self.longitude, other.latitude, other.longitude)
    }
}

/// A known point of interest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Landmark {
    pub id: LandmarkId,

    /// Display title
    pub title: String,

    /// Playable audio reference (path or URL)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio: Option<String>,

    /// Source citation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    pub location: GeoPoint,

    /// At least one coordinate was missing or invalid in the catalog and
    /// was replaced by 0. The landmark is drawn, but probably in the wrong
    /// place.
    #[serde(default, skip_serializing_if = "is_false")]
    pub location_defaulted: bool,
}

fn is_false(b: &bool) -> bool {
    !*b
}

impl Landmark {
    pub fn new(id: LandmarkId, title: impl Into<String>, location: GeoPoint) -> Self {
        Landmark {
            id,
            title: title.into(),
            audio: None,
            source: None,
            location,
            location_defaulted: false,
        }
    }

    pub fn with_audio(mut self, audio: impl Into<String>) -> Self {
        self.audio = Some(audio.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Distance and bearing of this landmark as seen from `from`
    pub fn observe(&self, from: &GeoPoint) -> Observation {
        Observation {
            landmark: self.id,
            distance_km: from.distance_to(&self.location),
            bearing_deg: from.bearing_to(&self.location),
        }
    }
}

/// Distance and bearing of one landmark from the current user position
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Observation {
    pub landmark: LandmarkId,
    /// Kilometers, never negative
    pub distance_km: f64,
    /// Degrees clockwise from north `[0, 360)`
    pub bearing_deg: f64,
}

impl Observation {
    /// Angle of this observation relative to the given heading
    pub fn relative_to(&self, heading_deg: f64) -> RelativeAngle {
        RelativeAngle {
            landmark: self.landmark,
            angle: geo::normalize_angle_diff(self.bearing_deg - heading_deg),
        }
    }
}

/// Bearing minus heading, normalized to `(-180, 180]`. Zero is straight ahead.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RelativeAngle {
    pub landmark: LandmarkId,
    pub angle: f64,
}

impl RelativeAngle {
    pub fn new(landmark: LandmarkId, angle: f64) -> Self {
        RelativeAngle { landmark, angle }
    }
}

/// Compute observations for every landmark from one user position
pub fn observe_all(landmarks: &[Landmark], from: &GeoPoint) -> Vec<Observation> {
    landmarks.iter().map(|l| l.observe(from)).collect()
}
