//! Waymark Core
//!
//! Platform-independent layout engine that turns a position and a heading
//! into a radial set of pointers toward known landmarks, and decides which
//! landmark is currently pointed at.
//!
//! This crate does no I/O and does not log. Sensor acquisition, timers,
//! drawing and audio playback belong to the embedding application, which
//! drives a [`PointerEngine`] and renders the resulting [`Frame`]s.
//!
//! # Pipeline
//!
//! ```text
//! Landmark + position ──► Observation (distance, bearing)
//!            heading ──► RelativeAngle
//!                          │
//!                 CircularClusterer ──► Cluster
//!                          │
//!                   ClusterLayout ──► DisplayAssignment
//!                          │
//!                  RadarProjector ──► ProjectedSegment
//!                          │
//!               AlignmentDetector ──► Frame
//! ```

pub mod alignment;
pub mod audio;
pub mod catalog;
pub mod cluster;
pub mod config;
pub mod engine;
pub mod frame;
pub mod geo;
pub mod landmark;
pub mod layout;
pub mod projector;
pub mod state;

pub use alignment::{AlignedGroup, AlignmentDetector, AlignmentPolicy};
pub use audio::{AudioAction, AudioCueTracker};
pub use catalog::{parse_catalog, Catalog, CatalogWarning};
pub use cluster::{CircularClusterer, Cluster, ClusterStrategy};
pub use config::{ConfigError, RadarConfig};
pub use engine::{PointerEngine, TickOutcome};
pub use frame::{DrawCommand, Frame, FrameBuilder, ProjectedSegment, SegmentStyle};
pub use landmark::{GeoPoint, Landmark, LandmarkId, Observation, RelativeAngle};
pub use layout::{ClusterLayout, DisplayAssignment};
pub use projector::{Projection, RadarBounds, RadarProjector};
pub use state::{FixPolicy, PositionFix, SensorChange, SensorError, SensorUpdate};
