//! Cluster Layout
//!
//! Spreads the members of a cluster so that their lines do not overlap.
//!
//! A cluster of `n > 1` members is fanned out around its center with
//! exactly `spacing` degrees between neighbours:
//!
//! ```text
//! span = (n - 1) * spacing
//! base = center - span / 2
//! display[i] = base + i * spacing
//! ```
//!
//! Display angles follow the cluster's member order. Only members of the
//! same cluster are kept apart; two neighbouring clusters can still fan out
//! into each other.

use serde::Serialize;

use crate::cluster::Cluster;
use crate::geo::normalize_angle_diff;
use crate::landmark::LandmarkId;

/// Display angle assigned to one landmark
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayAssignment {
    pub landmark: LandmarkId,
    /// True heading-relative angle `(-180, 180]`
    pub relative_angle: f64,
    /// Angle the landmark is drawn at `(-180, 180]`
    pub display_angle: f64,
}

/// Assigns display angles to clustered landmarks
#[derive(Debug, Clone, Copy)]
pub struct ClusterLayout {
    spacing: f64,
}

impl ClusterLayout {
    pub fn new(spacing: f64) -> Self {
        ClusterLayout { spacing }
    }

    /// Display angles for every member of `cluster`, in member order
    pub fn assign(&self, cluster: &Cluster) -> Vec<DisplayAssignment> {
        if let [only] = cluster.members.as_slice() {
            return vec![DisplayAssignment {
                landmark: only.landmark,
                relative_angle: only.angle,
                display_angle: only.angle,
            }];
        }

        let span = (cluster.len().saturating_sub(1)) as f64 * self.spacing;
        let base = cluster.center - span / 2.0;

        cluster
            .members
            .iter()
            .enumerate()
            .map(|(i, member)| DisplayAssignment {
                landmark: member.landmark,
                relative_angle: member.angle,
                display_angle: normalize_angle_diff(base + i as f64 * self.spacing),
            })
            .collect()
    }
}
