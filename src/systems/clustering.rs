use log::debug;
use serde::{Deserialize, Serialize};

use crate::{
    geometry_utils::{centroid, distance_points},
    Point2D,
};

/// A spatial blob of keypoint positions, derived fresh every frame. Clusters
/// carry no identity beyond their index in the per-frame output sequence.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Cluster {
    pub points: Vec<Point2D>,
}

impl Cluster {
    pub fn centroid(&self) -> Option<Point2D> {
        centroid(&self.points)
    }
}

/// Density clustering with a per-frame adaptive neighbourhood radius: eps is
/// read off the k-distance curve of the current point set, then a DBSCAN
/// region growing pass groups the points.
pub struct ClusteringSystem {
    knn_k: usize,
    eps_percentile: f32,
    min_points: usize,
}

impl ClusteringSystem {
    pub fn new(knn_k: usize, eps_percentile: f32, min_points: usize) -> Self {
        ClusteringSystem {
            knn_k,
            eps_percentile,
            min_points,
        }
    }

    /// Cluster one frame's points. Fewer than `knn_k + 1` points cannot
    /// support the k-th-neighbour computation, so small inputs yield zero
    /// clusters rather than an out-of-range access.
    pub fn cluster_frame(&self, points: &[Point2D]) -> Vec<Cluster> {
        if points.len() <= self.knn_k {
            debug!(
                "Too few points ({}) for k={} eps estimation; no clusters",
                points.len(),
                self.knn_k
            );
            return Vec::new();
        }

        let knn = knn_distances(points, self.knn_k);
        let eps = estimate_eps(&knn, self.eps_percentile);
        debug!("Estimated eps {} from {} points", eps, points.len());

        dbscan(points, eps, self.min_points)
    }
}

/// Distance from each point to its k-th nearest neighbour.
/// Requires `points.len() > k`.
pub fn knn_distances(points: &[Point2D], k: usize) -> Vec<f32> {
    let mut knn = Vec::with_capacity(points.len());
    for (i, point) in points.iter().enumerate() {
        let mut distances: Vec<f32> = points
            .iter()
            .enumerate()
            .filter(|(j, _)| *j != i)
            .map(|(_, other)| distance_points(point, other))
            .collect();
        distances.sort_by(f32::total_cmp);
        knn.push(distances[k - 1]);
    }
    knn
}

/// Approximate the elbow of the k-distance curve: sort ascending and take
/// the value at the given percentile index.
pub fn estimate_eps(knn_distances: &[f32], percentile: f32) -> f32 {
    let mut sorted = knn_distances.to_vec();
    sorted.sort_by(f32::total_cmp);
    let index = ((sorted.len() as f32 * percentile) as usize).min(sorted.len() - 1);
    sorted[index]
}

/// Classic DBSCAN region growing over brute-force eps-neighbourhoods
/// (inclusive, a point neighbours itself). Membership and insertion order
/// are deterministic given the input order; which cluster gets which label
/// follows traversal order. Each point joins at most one cluster, once.
pub fn dbscan(points: &[Point2D], eps: f32, min_points: usize) -> Vec<Cluster> {
    let mut visited = vec![false; points.len()];
    let mut assigned = vec![false; points.len()];
    let mut clusters: Vec<Cluster> = Vec::new();

    let region_query = |idx: usize| -> Vec<usize> {
        points
            .iter()
            .enumerate()
            .filter(|(_, p)| distance_points(&points[idx], p) <= eps)
            .map(|(i, _)| i)
            .collect()
    };

    for i in 0..points.len() {
        if visited[i] {
            continue;
        }
        visited[i] = true;
        let mut neighbours = region_query(i);

        if neighbours.len() < min_points {
            // Noise, unless a later expansion reaches it
            continue;
        }

        let mut members = vec![i];
        assigned[i] = true;

        let mut j = 0;
        while j < neighbours.len() {
            let idx = neighbours[j];
            if !visited[idx] {
                visited[idx] = true;
                let expansion = region_query(idx);
                if expansion.len() >= min_points {
                    neighbours.extend(expansion);
                }
            }
            if !assigned[idx] {
                assigned[idx] = true;
                members.push(idx);
            }
            j += 1;
        }

        clusters.push(Cluster {
            points: members.iter().map(|&idx| points[idx]).collect(),
        });
    }

    debug!(
        "DBSCAN: {} clusters from {} points (eps {}, minPts {})",
        clusters.len(),
        points.len(),
        eps,
        min_points
    );
    clusters
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tight_group(cx: f32, cy: f32) -> Vec<Point2D> {
        vec![
            (cx, cy),
            (cx + 1., cy),
            (cx, cy + 1.),
            (cx - 1., cy),
            (cx, cy - 1.),
        ]
    }

    #[test]
    fn test_knn_distances_simple_line() {
        // Points at 0, 1, 3 on the x axis; k=1 nearest-neighbour distances
        let points = vec![(0., 0.), (1., 0.), (3., 0.)];
        let knn = knn_distances(&points, 1);
        assert_eq!(knn, vec![1., 1., 2.]);
    }

    #[test]
    fn test_estimate_eps_percentile_index() {
        let knn = vec![5., 1., 4., 2., 3.];
        // floor(0.9 * 5) = 4 -> largest value
        assert_eq!(estimate_eps(&knn, 0.9), 5.);
        // floor(0.5 * 5) = 2 -> middle of the sorted sequence
        assert_eq!(estimate_eps(&knn, 0.5), 3.);
    }

    #[test]
    fn test_eps_monotone_in_density() {
        let sparse: Vec<Point2D> = (0..10).map(|i| (i as f32 * 10., 0.)).collect();
        let dense: Vec<Point2D> = (0..10).map(|i| (i as f32 * 2., 0.)).collect();
        let eps_sparse = estimate_eps(&knn_distances(&sparse, 3), 0.9);
        let eps_dense = estimate_eps(&knn_distances(&dense, 3), 0.9);
        assert!(eps_dense <= eps_sparse);
    }

    #[test]
    fn test_small_input_yields_no_clusters() {
        let system = ClusteringSystem::new(3, 0.9, 3);
        assert!(system.cluster_frame(&[]).is_empty());
        assert!(system.cluster_frame(&[(0., 0.), (1., 1.), (2., 2.)]).is_empty());
    }

    #[test]
    fn test_two_groups_and_outlier() {
        let mut points = tight_group(0., 0.);
        points.extend(tight_group(100., 100.));
        points.push((50., 0.)); // isolated outlier

        // eps larger than intra-group spacing, smaller than inter-group
        let clusters = dbscan(&points, 3., 3);

        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[0].points.len(), 5);
        assert_eq!(clusters[1].points.len(), 5);
        for cluster in clusters.iter() {
            assert!(!cluster.points.contains(&(50., 0.)));
        }
    }

    #[test]
    fn test_membership_deterministic() {
        let mut points = tight_group(10., 10.);
        points.extend(tight_group(80., 20.));

        let first = dbscan(&points, 3., 3);
        let second = dbscan(&points, 3., 3);

        assert_eq!(first.len(), second.len());
        for (a, b) in first.iter().zip(second.iter()) {
            assert_eq!(a.points, b.points);
        }
    }

    #[test]
    fn test_cluster_frame_adaptive_eps_groups_blobs() {
        let system = ClusteringSystem::new(3, 0.9, 4);
        let mut points = tight_group(0., 0.);
        points.extend(tight_group(200., 200.));

        let clusters = system.cluster_frame(&points);
        assert_eq!(clusters.len(), 2);
        let centre = clusters[0].centroid().unwrap();
        assert!(distance_points(&centre, &(0., 0.)) < 1e-3);
    }
}
