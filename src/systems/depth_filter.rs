use log::debug;
use ndarray::Array2;

use crate::{keypoints::Keypoint, video::Frame};

/// Per-pixel depth estimate aligned to frame pixel coordinates, row-major
/// (indexed `[[y, x]]`). Same lifetime as one frame.
pub type DepthMap = Array2<f32>;

/// External depth-inference collaborator: one colour image in, one dense
/// depth map of the same aspect ratio out.
pub trait DepthEstimator {
    fn infer(&mut self, frame: &Frame) -> DepthMap;
}

/// Keeps only keypoints whose depth places them in the foreground band
/// (at or nearer than the scene's median depth).
pub struct DepthFilter {
    range_min: f32,
    range_max: f32,
}

impl DepthFilter {
    pub fn new(range_min: f32, range_max: f32) -> Self {
        DepthFilter {
            range_min,
            range_max,
        }
    }

    /// Median over depth values restricted to the plausible physical range.
    /// Even in-range counts average the two middle elements; no in-range
    /// pixel at all reports 0.
    pub fn median_depth(&self, depth_map: &DepthMap) -> f32 {
        let mut values: Vec<f32> = depth_map
            .iter()
            .copied()
            .filter(|v| *v >= self.range_min && *v <= self.range_max)
            .collect();
        values.sort_by(f32::total_cmp);

        let size = values.len();
        if size == 0 {
            return 0.;
        }
        if size % 2 == 0 {
            (values[size / 2 - 1] + values[size / 2]) / 2.
        } else {
            values[size / 2]
        }
    }

    /// A keypoint is kept iff its pixel is in bounds of the depth map and its
    /// depth value is at least `median_depth`. Out-of-bounds keypoints are
    /// silently dropped.
    pub fn filter(
        &self,
        keypoints: &[Keypoint],
        depth_map: &DepthMap,
        median_depth: f32,
    ) -> Vec<Keypoint> {
        let (rows, cols) = depth_map.dim();

        let kept: Vec<Keypoint> = keypoints
            .iter()
            .filter(|kp| {
                let x = kp.x();
                let y = kp.y();
                if x < 0. || y < 0. {
                    return false;
                }
                let (col, row) = (x as usize, y as usize);
                if col >= cols || row >= rows {
                    return false;
                }
                depth_map[[row, col]] >= median_depth
            })
            .copied()
            .collect();

        debug!(
            "Depth filter kept {}/{} keypoints (median depth {})",
            kept.len(),
            keypoints.len(),
            median_depth
        );
        kept
    }
}
