use serde::{Deserialize, Serialize};

use crate::Point2D;

/// One smoothed track estimate, as reported per frame.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct TrackedTarget {
    pub id: usize,
    pub x: f32,
    pub y: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub velocity: Option<[f32; 2]>,
    /// The raw cluster centroid this estimate was corrected with, if the
    /// track was matched this frame.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub measured: Option<Point2D>,
}

impl TrackedTarget {
    pub fn new(id: usize, position: Point2D) -> Self {
        TrackedTarget {
            id,
            x: position.0,
            y: position.1,
            velocity: None,
            measured: None,
        }
    }

    pub fn position(&self) -> Point2D {
        (self.x, self.y)
    }

    pub fn id(&self) -> usize {
        self.id
    }
}
