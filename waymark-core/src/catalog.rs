//! Landmark Catalog Parsing
//!
//! Turns catalog JSON into [`Landmark`]s. Parsing never fails: problems are
//! reported as [`CatalogWarning`]s next to whatever could be salvaged.
//!
//! Accepted layouts:
//!
//! ```json
//! [ { "title": "Old Lighthouse", "audio": "lighthouse.mp3",
//!     "location": { "latitude": 52.1, "longitude": 4.2 } } ]
//! ```
//!
//! or the same array under a top-level `"landmarks"` key. Longitude may be
//! spelled `longitude`, `lng`, `lon` or `long`; latitude `latitude` or
//! `lat`. Coordinates may be numbers or numeric strings.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::landmark::{GeoPoint, Landmark, LandmarkId};

const LATITUDE_KEYS: [&str; 2] = ["latitude", "lat"];
const LONGITUDE_KEYS: [&str; 4] = ["longitude", "lng", "lon", "long"];
const TITLE_KEYS: [&str; 2] = ["title", "name"];
const AUDIO_KEYS: [&str; 2] = ["audio", "sound"];
const SOURCE_KEYS: [&str; 1] = ["source"];

/// Non-fatal problems found while loading a catalog
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CatalogWarning {
    /// The document could not be used at all; no landmarks were loaded
    #[error("malformed catalog, continuing without landmarks: {0}")]
    Malformed(String),

    /// A record was not an object and was dropped
    #[error("catalog record {index} is not an object, skipped")]
    SkippedRecord { index: usize },

    /// A coordinate was missing or invalid and was replaced by 0
    #[error("landmark {landmark} '{title}' has no valid {field}, using 0")]
    DefaultedCoordinate {
        landmark: LandmarkId,
        title: String,
        field: &'static str,
    },
}

/// Result of loading a catalog
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub landmarks: Vec<Landmark>,
    pub warnings: Vec<CatalogWarning>,
}

impl Catalog {
    pub fn is_empty(&self) -> bool {
        self.landmarks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.landmarks.len()
    }
}

/// First usable text among `keys`. Strings and numbers are accepted,
/// anything else counts as absent.
fn text(record: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|k| record.get(*k))
        .find_map(|value| match value {
            Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
}

/// Read one coordinate from a location object, trying every accepted key
fn coordinate(location: Option<&Value>, keys: &[&str], limit: f64) -> Option<f64> {
    let object = location?.as_object()?;
    let value = keys.iter().find_map(|k| object.get(*k))?;

    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;

    if number.is_finite() && number.abs() <= limit {
        Some(number)
    } else {
        None
    }
}

/// Parse catalog text. Never fails; see [`CatalogWarning`].
pub fn parse_catalog(text: &str) -> Catalog {
    match serde_json::from_str::<Value>(text) {
        Ok(value) => catalog_from_value(value),
        Err(e) => Catalog {
            landmarks: Vec::new(),
            warnings: vec![CatalogWarning::Malformed(e.to_string())],
        },
    }
}

/// Build a catalog from an already parsed JSON document
pub fn catalog_from_value(value: Value) -> Catalog {
    let records = match value {
        Value::Array(records) => records,
        Value::Object(mut map) => match map.remove("landmarks") {
            Some(Value::Array(records)) => records,
            _ => {
                return Catalog {
                    landmarks: Vec::new(),
                    warnings: vec![CatalogWarning::Malformed(
                        "expected a 'landmarks' array".to_string(),
                    )],
                }
            }
        },
        _ => {
            return Catalog {
                landmarks: Vec::new(),
                warnings: vec![CatalogWarning::Malformed(
                    "expected an array of landmarks".to_string(),
                )],
            }
        }
    };

    let mut catalog = Catalog::default();

    for (index, record) in records.into_iter().enumerate() {
        let Value::Object(record) = record else {
            catalog.warnings.push(CatalogWarning::SkippedRecord { index });
            continue;
        };

        let id = LandmarkId(catalog.landmarks.len() as u32);
        let title = text(&record, &TITLE_KEYS).unwrap_or_else(|| format!("Landmark {}", id.0 + 1));
        let location = record.get("location");

        let latitude = coordinate(location, &LATITUDE_KEYS, 90.0);
        let longitude = coordinate(location, &LONGITUDE_KEYS, 180.0);

        for (field, value) in [("latitude", latitude), ("longitude", longitude)] {
            if value.is_none() {
                catalog.warnings.push(CatalogWarning::DefaultedCoordinate {
                    landmark: id,
                    title: title.clone(),
                    field,
                });
            }
        }

        let mut landmark = Landmark::new(
            id,
            title,
            GeoPoint::new(latitude.unwrap_or(0.0), longitude.unwrap_or(0.0)),
        );
        landmark.audio = text(&record, &AUDIO_KEYS);
        landmark.source = text(&record, &SOURCE_KEYS);
        landmark.location_defaulted = latitude.is_none() || longitude.is_none();

        catalog.landmarks.push(landmark);
    }

    catalog
}
