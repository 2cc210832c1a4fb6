//! Alignment Detection
//!
//! Decides which landmark the user is currently pointing at. A segment is
//! aligned when its display angle is within the tolerance of straight
//! ahead, boundary included.
//!
//! Aligned segments of the same cluster form one candidate group. When more
//! than one cluster has aligned members in the same frame, the
//! [`AlignmentPolicy`] picks the group that is surfaced.

use serde::{Deserialize, Serialize};

use crate::frame::ProjectedSegment;
use crate::landmark::{Landmark, LandmarkId};

/// Default half-width of the forward band in degrees
pub const DEFAULT_ALIGNMENT_TOLERANCE_DEG: f64 = 5.0;

/// Which aligned group wins when several clusters are aligned at once
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AlignmentPolicy {
    /// The group visited last in cluster order supersedes earlier ones
    #[default]
    LastWins,
    /// The group whose nearest member is closest to the user
    Nearest,
}

/// The landmarks currently pointed at
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlignedGroup {
    /// Index of the cluster in the frame
    pub cluster: usize,
    /// Aligned members in member order
    pub members: Vec<LandmarkId>,
    /// Titles of the aligned members, same order as `members`
    pub titles: Vec<String>,
    /// Closest aligned member
    pub nearest: LandmarkId,
    pub nearest_distance_km: f64,
    /// Audio of the closest aligned member
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio: Option<String>,
}

/// Find a landmark by id; ids are catalog indices
pub(crate) fn lookup(landmarks: &[Landmark], id: LandmarkId) -> Option<&Landmark> {
    landmarks
        .get(id.0 as usize)
        .filter(|l| l.id == id)
        .or_else(|| landmarks.iter().find(|l| l.id == id))
}

/// Forward hit-test
#[derive(Debug, Clone, Copy)]
pub struct AlignmentDetector {
    tolerance: f64,
    policy: AlignmentPolicy,
}

impl AlignmentDetector {
    pub fn new(tolerance: f64, policy: AlignmentPolicy) -> Self {
        AlignmentDetector { tolerance, policy }
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    pub fn policy(&self) -> AlignmentPolicy {
        self.policy
    }

    /// `|display_angle| <= tolerance`. NaN is never aligned.
    #[inline]
    pub fn is_aligned(&self, display_angle: f64) -> bool {
        display_angle.abs() <= self.tolerance
    }

    /// Group the aligned segments per cluster and select one group.
    ///
    /// `segments` must be in cluster/member order, as produced by the
    /// frame builder.
    pub fn detect(
        &self,
        segments: &[ProjectedSegment],
        landmarks: &[Landmark],
    ) -> Option<AlignedGroup> {
        let mut groups: Vec<Vec<&ProjectedSegment>> = Vec::new();

        for segment in segments.iter().filter(|s| s.aligned) {
            match groups.last_mut() {
                Some(group) if group[0].cluster == segment.cluster => group.push(segment),
                _ => groups.push(vec![segment]),
            }
        }

        let chosen = match self.policy {
            AlignmentPolicy::LastWins => groups.pop(),
            AlignmentPolicy::Nearest => groups.into_iter().min_by(|a, b| {
                nearest_of(a)
                    .distance_km
                    .total_cmp(&nearest_of(b).distance_km)
            }),
        }?;

        let nearest = nearest_of(&chosen);
        let titles = chosen
            .iter()
            .map(|s| {
                lookup(landmarks, s.landmark)
                    .map(|l| l.title.clone())
                    .unwrap_or_default()
            })
            .collect();

        Some(AlignedGroup {
            cluster: nearest.cluster,
            members: chosen.iter().map(|s| s.landmark).collect(),
            titles,
            nearest: nearest.landmark,
            nearest_distance_km: nearest.distance_km,
            audio: lookup(landmarks, nearest.landmark).and_then(|l| l.audio.clone()),
        })
    }
}

/// Closest segment of a non-empty group
fn nearest_of<'a>(group: &[&'a ProjectedSegment]) -> &'a ProjectedSegment {
    group
        .iter()
        .copied()
        .min_by(|a, b| a.distance_km.total_cmp(&b.distance_km))
        .unwrap_or(group[0])
}
