//! Circular Clustering
//!
//! Groups landmarks whose heading-relative angles are close enough to be
//! drawn on top of each other.
//!
//! # Algorithm
//!
//! [`ClusterStrategy::GreedyFirstFit`] is a single greedy pass:
//!
//! 1. Sort the angles ascending.
//! 2. For each angle, scan the clusters in creation order and join the
//!    *first* one whose current center is within `spacing` degrees
//!    (inclusive). The joined cluster's center is immediately recomputed as
//!    the circular mean of all its members.
//! 3. If no cluster matches, start a new one centered on the angle.
//!
//! The result depends on processing order and is not globally optimal.
//! Because centers move as members join, a member may end up further than
//! `spacing` from the final center of its cluster.

use serde::{Deserialize, Serialize};

use crate::geo::{angular_distance, circular_mean, normalize_angle_diff};
use crate::landmark::RelativeAngle;

/// Slack on the join threshold so that members exactly `spacing` apart
/// are not split by floating point noise.
pub const SPACING_EPSILON_DEG: f64 = 1e-9;

/// How relative angles are grouped into clusters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ClusterStrategy {
    /// Sorted single pass, first matching cluster wins, live recentering
    #[default]
    GreedyFirstFit,
}

/// A group of landmarks that share roughly the same direction
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cluster {
    /// Circular mean of the members in degrees `(-180, 180]`
    pub center: f64,
    /// Members in insertion order
    pub members: Vec<RelativeAngle>,
}

impl Cluster {
    /// Start a cluster with a single member
    pub fn new(first: RelativeAngle) -> Self {
        Cluster {
            center: normalize_angle_diff(first.angle),
            members: vec![first],
        }
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Whether `angle` is close enough to the current center to join
    pub fn accepts(&self, angle: f64, spacing: f64) -> bool {
        angular_distance(angle, self.center) <= spacing + SPACING_EPSILON_DEG
    }

    /// Add a member and recenter on the circular mean of all members
    pub fn push(&mut self, member: RelativeAngle) {
        self.members.push(member);
        if let Some(mean) = circular_mean(self.members.iter().map(|m| m.angle)) {
            self.center = normalize_angle_diff(mean);
        }
    }
}

/// Groups relative angles into [`Cluster`]s
#[derive(Debug, Clone)]
pub struct CircularClusterer {
    spacing: f64,
    strategy: ClusterStrategy,
}

impl CircularClusterer {
    /// Create a clusterer joining angles within `spacing` degrees
    pub fn new(spacing: f64) -> Self {
        CircularClusterer {
            spacing,
            strategy: ClusterStrategy::default(),
        }
    }

    pub fn with_strategy(mut self, strategy: ClusterStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn spacing(&self) -> f64 {
        self.spacing
    }

    pub fn strategy(&self) -> ClusterStrategy {
        self.strategy
    }

    /// Cluster the given angles. Non-finite angles are dropped.
    ///
    /// Clusters are returned in creation order.
    pub fn cluster(&self, angles: &[RelativeAngle]) -> Vec<Cluster> {
        let mut sorted: Vec<RelativeAngle> = angles
            .iter()
            .filter(|a| a.angle.is_finite())
            .copied()
            .collect();
        // Stable sort keeps catalog order among equal angles
        sorted.sort_by(|a, b| a.angle.total_cmp(&b.angle));

        match self.strategy {
            ClusterStrategy::GreedyFirstFit => self.greedy_first_fit(sorted),
        }
    }

    fn greedy_first_fit(&self, sorted: Vec<RelativeAngle>) -> Vec<Cluster> {
        let mut clusters: Vec<Cluster> = Vec::new();

        for item in sorted {
            match clusters
                .iter_mut()
                .find(|c| c.accepts(item.angle, self.spacing))
            {
                Some(cluster) => cluster.push(item),
                None => clusters.push(Cluster::new(item)),
            }
        }

        clusters
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmark::LandmarkId;

    fn angles(values: &[f64]) -> Vec<RelativeAngle> {
        values
            .iter()
            .enumerate()
            .map(|(i, a)| RelativeAngle::new(LandmarkId(i as u32), *a))
            .collect()
    }

    fn ids(cluster: &Cluster) -> Vec<u32> {
        cluster.members.iter().map(|m| m.landmark.0).collect()
    }

    #[test]
    fn test_close_angles_form_one_cluster() {
        let clusters = CircularClusterer::new(3.0).cluster(&angles(&[0.0, 1.0, 2.0]));
        assert_eq!(clusters.len(), 1);
        assert_eq!(ids(&clusters[0]), vec![0, 1, 2]);
        assert!((clusters[0].center - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_distant_angles_form_separate_clusters() {
        let clusters = CircularClusterer::new(3.0).cluster(&angles(&[0.0, 10.0]));
        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[0].len(), 1);
        assert_eq!(clusters[1].len(), 1);
        assert_eq!(clusters[0].center, 0.0);
        assert_eq!(clusters[1].center, 10.0);
    }

    #[test]
    fn test_new_cluster_centered_exactly_on_angle() {
        let clusters = CircularClusterer::new(3.0).cluster(&angles(&[-45.7, 0.1, 20.1]));
        let centers: Vec<f64> = clusters.iter().map(|c| c.center).collect();
        assert_eq!(centers, vec![-45.7, 0.1, 20.1]);
    }

    #[test]
    fn test_input_is_sorted_before_clustering() {
        let clusters = CircularClusterer::new(3.0).cluster(&angles(&[2.0, 40.0, 0.0, 1.0]));
        assert_eq!(clusters.len(), 2);
        // Sorted order: id2 (0), id3 (1), id0 (2), then id1 (40)
        assert_eq!(ids(&clusters[0]), vec![2, 3, 0]);
        assert_eq!(ids(&clusters[1]), vec![1]);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let clusters = CircularClusterer::new(3.0).cluster(&angles(&[0.0, 3.0]));
        assert_eq!(clusters.len(), 1);

        let clusters = CircularClusterer::new(3.0).cluster(&angles(&[0.0, 3.01]));
        assert_eq!(clusters.len(), 2);
    }

    #[test]
    fn test_live_recentering_pulls_members_in() {
        // 0 and 3 join (center moves to 1.5), so 4.5 is now within reach
        let clusters = CircularClusterer::new(3.0).cluster(&angles(&[0.0, 3.0, 4.5]));
        assert_eq!(clusters.len(), 1);
        assert!((clusters[0].center - 2.5).abs() < 1e-3);
        // The founding member has drifted away from the final center
        assert!(angular_distance(clusters[0].members[0].angle, clusters[0].center) > 2.0);
    }

    #[test]
    fn test_greedy_pass_is_order_dependent() {
        // Sorted order is -3, 0, 3: 0 joins the -3 cluster and pulls its
        // center to -1.5, which leaves 3 out of reach.
        let clusters = CircularClusterer::new(3.0).cluster(&angles(&[-3.0, 3.0, 0.0]));
        assert_eq!(clusters.len(), 2);
        assert_eq!(ids(&clusters[0]), vec![0, 2]);
        assert_eq!(ids(&clusters[1]), vec![1]);
    }

    #[test]
    fn test_clusters_across_wraparound() {
        // 179 and -179 are 2 degrees apart across the back
        let clusters = CircularClusterer::new(3.0).cluster(&angles(&[179.0, -179.0]));
        assert_eq!(clusters.len(), 1);
        assert!(angular_distance(clusters[0].center, 180.0) < 1e-9);
    }

    #[test]
    fn test_non_finite_angles_dropped() {
        let clusters = CircularClusterer::new(3.0).cluster(&angles(&[f64::NAN, 5.0]));
        assert_eq!(clusters.len(), 1);
        assert_eq!(ids(&clusters[0]), vec![1]);
    }

    #[test]
    fn test_empty_input() {
        assert!(CircularClusterer::new(3.0).cluster(&[]).is_empty());
    }
}
