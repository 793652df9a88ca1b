use std::f32::consts::PI;

use log::debug;

use crate::{geometry_utils::distance_points, keypoints::Keypoint, Point2D};

/// Non-maximum suppression over circular detection regions. Every keypoint is
/// treated as a circle of the same radius; when two circles overlap beyond the
/// threshold, the keypoint with the lower response is removed.
pub struct NonMaxSuppressor {
    overlap_threshold: f32,
    keypoint_radius: f32,
}

impl NonMaxSuppressor {
    pub fn new(overlap_threshold: f32, keypoint_radius: f32) -> Self {
        NonMaxSuppressor {
            overlap_threshold,
            keypoint_radius,
        }
    }

    /// Single greedy pass: pairs are compared in index order and losers are
    /// marked; marked keypoints are skipped in later comparisons. Survivors
    /// are not re-checked against each other afterwards, so a residual
    /// above-threshold pair can remain when a removal changes which keypoint
    /// would have won a later comparison. Known approximation, kept as-is.
    /// O(n²) over per-frame keypoint counts (hundreds at most).
    pub fn suppress(&self, keypoints: &mut Vec<Keypoint>) {
        let mut to_remove = vec![false; keypoints.len()];

        for i in 0..keypoints.len() {
            if to_remove[i] {
                continue;
            }
            for j in (i + 1)..keypoints.len() {
                if to_remove[j] {
                    continue;
                }

                let overlap = circle_overlap(
                    &keypoints[i].position,
                    &keypoints[j].position,
                    self.keypoint_radius,
                );
                if overlap > self.overlap_threshold {
                    // The lower response loses; on a tie the later index loses
                    if keypoints[i].response < keypoints[j].response {
                        to_remove[i] = true;
                    } else {
                        to_remove[j] = true;
                    }
                }
            }
        }

        let before = keypoints.len();
        let mut index = 0;
        keypoints.retain(|_| {
            let keep = !to_remove[index];
            index += 1;
            keep
        });
        debug!("Suppression kept {}/{} keypoints", keypoints.len(), before);
    }
}

/// Intersection-over-union of two circles of equal radius `r`.
pub fn circle_overlap(a: &Point2D, b: &Point2D, r: f32) -> f32 {
    let d = distance_points(a, b);
    if d >= 2. * r {
        return 0.;
    }
    if d <= f32::EPSILON {
        return 1.;
    }
    // Lens area of two intersecting equal circles
    let half = d / 2.;
    let intersection = 2. * r * r * (half / r).acos() - half * (4. * r * r - d * d).sqrt();
    let union = 2. * PI * r * r - intersection;
    intersection / union
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kp(x: f32, y: f32, response: f32) -> Keypoint {
        Keypoint::new((x, y), response)
    }

    #[test]
    fn test_circle_overlap_bounds() {
        assert_eq!(circle_overlap(&(0., 0.), &(10., 0.), 3.5), 0.);
        assert_eq!(circle_overlap(&(2., 2.), &(2., 2.), 3.5), 1.);
        let partial = circle_overlap(&(0., 0.), &(3., 0.), 3.5);
        assert!(partial > 0. && partial < 1.);
    }

    #[test]
    fn test_disjoint_input_unchanged() {
        let suppressor = NonMaxSuppressor::new(0.05, 3.5);
        let mut keypoints = vec![kp(0., 0., 1.), kp(50., 0., 2.), kp(0., 50., 3.)];
        suppressor.suppress(&mut keypoints);
        assert_eq!(keypoints.len(), 3);
        // Order preserved
        assert_eq!(keypoints[0].response, 1.);
        assert_eq!(keypoints[2].response, 3.);
    }

    #[test]
    fn test_lower_response_removed() {
        let suppressor = NonMaxSuppressor::new(0.05, 3.5);
        let mut keypoints = vec![kp(0., 0., 0.2), kp(1., 0., 0.9)];
        suppressor.suppress(&mut keypoints);
        assert_eq!(keypoints.len(), 1);
        assert_eq!(keypoints[0].response, 0.9);
    }

    #[test]
    fn test_tie_removes_later_index() {
        let suppressor = NonMaxSuppressor::new(0.05, 3.5);
        let mut keypoints = vec![kp(0., 0., 0.5), kp(1., 0., 0.5)];
        suppressor.suppress(&mut keypoints);
        assert_eq!(keypoints.len(), 1);
        assert_eq!(keypoints[0].position, (0., 0.));
    }

    #[test]
    fn test_output_never_grows() {
        let suppressor = NonMaxSuppressor::new(0., 3.5);
        for count in 0..8 {
            let mut keypoints: Vec<Keypoint> =
                (0..count).map(|i| kp(i as f32 * 0.5, 0., i as f32)).collect();
            let before = keypoints.len();
            suppressor.suppress(&mut keypoints);
            assert!(keypoints.len() <= before);
        }
    }
}
