use ndarray::Array2;

use crate::{
    keypoints::{Keypoint, KeypointDetector},
    systems::depth_filter::{DepthEstimator, DepthMap},
    video::{Frame, FrameSource},
    Point2D,
};

const BLOB_START: Point2D = (40., 40.);
const BLOB_VELOCITY: Point2D = (6., 4.);
// Wider than the suppression diameter so the blob's own detections survive NMS
const BLOB_SPREAD: f32 = 8.;

/// Depth reported as disparity-like values: larger means nearer.
const FOREGROUND_DEPTH: f32 = 3.0;
const BACKGROUND_DEPTH: f32 = 0.3; // outside the plausible band

/// Stand-in for the external collaborators: a single foreground blob moving
/// on a straight line over a flat background, with a few background
/// distractor keypoints and one redundant low-response detection near the
/// blob centre. Keypoints and depth are derived from the scene state, so the
/// frames it emits, the depth maps it infers and the keypoints it detects
/// are mutually consistent.
pub struct SyntheticScene {
    width: usize,
    height: usize,
    frame_count: usize,
    frames_emitted: usize,
}

impl SyntheticScene {
    pub fn new(width: usize, height: usize, frame_count: usize) -> Self {
        SyntheticScene {
            width,
            height,
            frame_count,
            frames_emitted: 0,
        }
    }

    /// Ground-truth blob centre at the given frame index.
    pub fn blob_position(&self, frame_index: usize) -> Point2D {
        (
            BLOB_START.0 + BLOB_VELOCITY.0 * frame_index as f32,
            BLOB_START.1 + BLOB_VELOCITY.1 * frame_index as f32,
        )
    }

    fn current_index(&self) -> usize {
        self.frames_emitted.saturating_sub(1)
    }

    fn blob_points(&self, centre: Point2D) -> Vec<Point2D> {
        let (cx, cy) = centre;
        vec![
            (cx, cy),
            (cx + BLOB_SPREAD, cy),
            (cx - BLOB_SPREAD, cy),
            (cx, cy + BLOB_SPREAD),
            (cx, cy - BLOB_SPREAD),
        ]
    }

    fn distractor_points(&self) -> Vec<Point2D> {
        let w = self.width as f32;
        let h = self.height as f32;
        vec![(w * 0.8, h * 0.2), (w * 0.1, h * 0.9), (w * 0.9, h * 0.8)]
    }
}

impl FrameSource for SyntheticScene {
    fn next_frame(&mut self) -> Option<Frame> {
        if self.frames_emitted >= self.frame_count {
            return None;
        }
        let index = self.frames_emitted;
        self.frames_emitted += 1;

        let mut frame = Frame::new(self.width, self.height);
        let centre = self.blob_position(index);
        for (x, y) in self.blob_points(centre) {
            frame.set_pixel(x.round() as i32, y.round() as i32, (230, 230, 230));
        }
        for (x, y) in self.distractor_points() {
            frame.set_pixel(x.round() as i32, y.round() as i32, (120, 120, 120));
        }
        Some(frame)
    }
}

impl DepthEstimator for SyntheticScene {
    fn infer(&mut self, frame: &Frame) -> DepthMap {
        let mut depth = Array2::from_elem((frame.height, frame.width), BACKGROUND_DEPTH);
        let centre = self.blob_position(self.current_index());
        for (x, y) in self.blob_points(centre) {
            let (col, row) = (x.round() as usize, y.round() as usize);
            if row < frame.height && col < frame.width {
                depth[[row, col]] = FOREGROUND_DEPTH;
            }
        }
        depth
    }
}

impl KeypointDetector for SyntheticScene {
    fn detect(&mut self, _frame: &Frame) -> Vec<Keypoint> {
        let centre = self.blob_position(self.current_index());

        let mut keypoints: Vec<Keypoint> = self
            .blob_points(centre)
            .into_iter()
            .enumerate()
            .map(|(i, p)| Keypoint::new(p, 10. + i as f32))
            .collect();

        // A redundant weak detection right next to the blob centre; the
        // suppressor is expected to drop it
        keypoints.push(Keypoint::new((centre.0 + 1., centre.1), 0.5));

        for p in self.distractor_points() {
            keypoints.push(Keypoint::new(p, 1.));
        }

        keypoints
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scene_emits_exactly_frame_count() {
        let mut scene = SyntheticScene::new(64, 64, 3);
        assert!(scene.next_frame().is_some());
        assert!(scene.next_frame().is_some());
        assert!(scene.next_frame().is_some());
        assert!(scene.next_frame().is_none());
    }

    #[test]
    fn test_depth_marks_blob_as_foreground() {
        let mut scene = SyntheticScene::new(64, 64, 1);
        let frame = scene.next_frame().unwrap();
        let depth = scene.infer(&frame);

        let (cx, cy) = scene.blob_position(0);
        assert_eq!(depth[[cy as usize, cx as usize]], FOREGROUND_DEPTH);
        assert_eq!(depth[[0, 0]], BACKGROUND_DEPTH);
    }

    #[test]
    fn test_detections_follow_the_blob() {
        let mut scene = SyntheticScene::new(640, 480, 5);
        scene.next_frame();
        scene.next_frame();

        let frame = Frame::new(640, 480);
        let keypoints = scene.detect(&frame);
        let centre = scene.blob_position(1);
        assert!(keypoints.iter().any(|kp| kp.position == centre));
    }
}
