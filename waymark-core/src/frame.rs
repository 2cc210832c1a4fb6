//! Frame Building
//!
//! A [`Frame`] is everything the renderer needs for one refresh: the
//! projected segments in cluster/member order, the aligned selection, and
//! a flat list of [`DrawCommand`]s. Frames are immutable values and are
//! rebuilt from scratch on every tick.
//!
//! # Pipeline
//!
//! ```text
//! observations -> relative angles -> clusters -> display angles
//!              -> projected segments -> alignment -> Frame
//! ```

use nalgebra::Point2;
use serde::Serialize;
use std::collections::HashMap;

use crate::alignment::{AlignedGroup, AlignmentDetector};
use crate::cluster::CircularClusterer;
use crate::config::RadarConfig;
use crate::landmark::{Landmark, LandmarkId, Observation, RelativeAngle};
use crate::layout::ClusterLayout;
use crate::projector::RadarProjector;

/// Radius of the dot drawn at the end of each line
pub const MARKER_RADIUS: f64 = 4.0;

/// Human readable distance for labels.
///
/// Below 1 km in whole meters, below 10 km with one decimal, otherwise in
/// whole kilometers.
pub fn format_distance(distance_km: f64) -> String {
    if !distance_km.is_finite() {
        return String::from("?");
    }
    if distance_km < 1.0 {
        format!("{:.0} m", distance_km * 1000.0)
    } else if distance_km < 10.0 {
        format!("{:.1} km", distance_km)
    } else {
        format!("{:.0} km", distance_km)
    }
}

/// How a segment is drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentStyle {
    /// Bold and dark: the landmark is pointed at
    Highlighted,
    /// Thin and gray
    Muted,
}

impl SegmentStyle {
    pub fn for_alignment(aligned: bool) -> Self {
        if aligned {
            SegmentStyle::Highlighted
        } else {
            SegmentStyle::Muted
        }
    }

    pub fn stroke_width(&self) -> f64 {
        match self {
            SegmentStyle::Highlighted => 3.0,
            SegmentStyle::Muted => 1.0,
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            SegmentStyle::Highlighted => "#202020",
            SegmentStyle::Muted => "#9e9e9e",
        }
    }
}

/// One drawing primitive for the renderer
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum DrawCommand {
    Line {
        from: Point2<f64>,
        to: Point2<f64>,
        style: SegmentStyle,
    },
    Marker {
        at: Point2<f64>,
        radius: f64,
        style: SegmentStyle,
    },
    Label {
        at: Point2<f64>,
        text: String,
    },
}

/// A landmark line as it will be drawn this frame
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectedSegment {
    pub landmark: LandmarkId,
    /// Index of the cluster this landmark belongs to
    pub cluster: usize,
    pub relative_angle: f64,
    pub display_angle: f64,
    pub distance_km: f64,
    pub start: Point2<f64>,
    pub end: Point2<f64>,
    pub label_anchor: Point2<f64>,
    pub length: f64,
    pub aligned: bool,
    pub label: String,
}

impl ProjectedSegment {
    pub fn style(&self) -> SegmentStyle {
        SegmentStyle::for_alignment(self.aligned)
    }
}

/// Immutable result of one refresh
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Frame {
    pub timestamp_ms: u64,
    /// Heading the frame was built for
    pub heading_deg: f64,
    pub segments: Vec<ProjectedSegment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aligned: Option<AlignedGroup>,
    /// Landmarks left out because their geometry was degenerate
    pub hidden: usize,
}

impl Frame {
    /// Whether any landmark is currently pointed at
    pub fn is_aligned(&self) -> bool {
        self.aligned.is_some()
    }

    /// Line, marker and label for every segment, in segment order
    pub fn draw_commands(&self) -> Vec<DrawCommand> {
        let mut commands = Vec::with_capacity(self.segments.len() * 3);
        for segment in &self.segments {
            let style = segment.style();
            commands.push(DrawCommand::Line {
                from: segment.start,
                to: segment.end,
                style,
            });
            commands.push(DrawCommand::Marker {
                at: segment.end,
                radius: MARKER_RADIUS,
                style,
            });
            commands.push(DrawCommand::Label {
                at: segment.label_anchor,
                text: segment.label.clone(),
            });
        }
        commands
    }
}

/// Builds frames from observations and a heading
#[derive(Debug, Clone)]
pub struct FrameBuilder {
    clusterer: CircularClusterer,
    layout: ClusterLayout,
    projector: RadarProjector,
    detector: AlignmentDetector,
}

impl FrameBuilder {
    pub fn new(config: &RadarConfig) -> Self {
        FrameBuilder {
            clusterer: CircularClusterer::new(config.cluster_spacing_deg)
                .with_strategy(config.cluster_strategy),
            layout: ClusterLayout::new(config.cluster_spacing_deg),
            projector: RadarProjector::new(config.bounds()),
            detector: AlignmentDetector::new(
                config.alignment_tolerance_deg,
                config.alignment_policy,
            ),
        }
    }

    pub fn projector(&self) -> &RadarProjector {
        &self.projector
    }

    pub fn detector(&self) -> &AlignmentDetector {
        &self.detector
    }

    /// Build one frame. Pure: the same inputs always give the same frame.
    pub fn build(
        &self,
        landmarks: &[Landmark],
        observations: &[Observation],
        heading_deg: f64,
        timestamp_ms: u64,
    ) -> Frame {
        let distances: HashMap<LandmarkId, f64> = observations
            .iter()
            .map(|o| (o.landmark, o.distance_km))
            .collect();

        let relative: Vec<RelativeAngle> = observations
            .iter()
            .map(|o| o.relative_to(heading_deg))
            .collect();

        let clusters = self.clusterer.cluster(&relative);

        let mut segments = Vec::with_capacity(observations.len());
        for (index, cluster) in clusters.iter().enumerate() {
            for assignment in self.layout.assign(cluster) {
                let distance_km = distances
                    .get(&assignment.landmark)
                    .copied()
                    .unwrap_or(f64::NAN);

                let Some(projection) = self.projector.project(assignment.display_angle, distance_km)
                else {
                    continue;
                };

                segments.push(ProjectedSegment {
                    landmark: assignment.landmark,
                    cluster: index,
                    relative_angle: assignment.relative_angle,
                    display_angle: assignment.display_angle,
                    distance_km,
                    start: projection.start,
                    end: projection.end,
                    label_anchor: projection.label_anchor,
                    length: projection.length,
                    aligned: self.detector.is_aligned(assignment.display_angle),
                    label: format_distance(distance_km),
                });
            }
        }

        let aligned = self.detector.detect(&segments, landmarks);

        Frame {
            timestamp_ms,
            heading_deg,
            hidden: observations.len() - segments.len(),
            segments,
            aligned,
        }
    }
}
