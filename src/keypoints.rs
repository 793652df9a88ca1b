use serde::{Deserialize, Serialize};

use crate::{video::Frame, Point2D};

/// A salient image location as reported by the (external) feature detector,
/// with its confidence/response score. Keypoints live for one frame only;
/// there is no cross-frame identity.
#[derive(Serialize, Deserialize, Debug, Clone, Copy)]
pub struct Keypoint {
    pub position: Point2D,
    pub response: f32,
}

impl Keypoint {
    pub fn new(position: Point2D, response: f32) -> Self {
        Keypoint { position, response }
    }

    pub fn x(&self) -> f32 {
        self.position.0
    }

    pub fn y(&self) -> f32 {
        self.position.1
    }
}

/// External keypoint-extraction collaborator (e.g. a FAST detector). Passed
/// into the pipeline explicitly; the pipeline never owns a detector of its own.
pub trait KeypointDetector {
    fn detect(&mut self, frame: &Frame) -> Vec<Keypoint>;
}
