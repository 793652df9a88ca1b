use std::time::{Duration, Instant};

use log::debug;

use crate::{
    annotate::{draw_cluster, draw_prediction},
    keypoints::Keypoint,
    pipeline_config::PipelineConfig,
    systems::{clustering::Cluster, depth_filter::DepthMap, tracking::TrackError, Systems},
    tracking::TrackedTarget,
    video::Frame,
    Point2D,
};

/// What one frame produced, with advisory timing for the whole frame body.
#[derive(Debug)]
pub struct FrameReport {
    pub keypoints_detected: usize,
    pub keypoints_kept: usize,
    pub clusters: Vec<Cluster>,
    pub targets: Vec<TrackedTarget>,
    pub elapsed: Duration,
}

/// Sequences the per-frame stages: suppression, depth-guided filtering,
/// adaptive clustering, track-bank estimation, annotation. Owns the systems;
/// the depth map and raw keypoints arrive from the external collaborators.
pub struct FramePipeline {
    systems: Systems,
    show_predicted: bool,
}

impl FramePipeline {
    pub fn new(config: &PipelineConfig) -> FramePipeline {
        FramePipeline {
            systems: Systems::new(config),
            show_predicted: config.show_predicted,
        }
    }

    pub fn process_frame(
        &mut self,
        frame: &mut Frame,
        depth_map: &DepthMap,
        mut keypoints: Vec<Keypoint>,
    ) -> Result<FrameReport, TrackError> {
        let started = Instant::now();
        let keypoints_detected = keypoints.len();

        self.systems.suppression.suppress(&mut keypoints);

        let median_depth = self.systems.depth_filter.median_depth(depth_map);
        let foreground = self
            .systems
            .depth_filter
            .filter(&keypoints, depth_map, median_depth);

        let points: Vec<Point2D> = foreground.iter().map(|kp| kp.position).collect();

        let clusters = self.systems.clustering.cluster_frame(&points);

        let centroids: Vec<Point2D> = clusters.iter().filter_map(|c| c.centroid()).collect();

        let targets = self.systems.track_bank.observe(&centroids)?;

        for cluster in clusters.iter() {
            draw_cluster(frame, cluster);
        }
        if self.show_predicted {
            for target in targets.iter() {
                if let Some(measured) = target.measured {
                    draw_prediction(frame, measured, target.position());
                }
            }
        }

        let elapsed = started.elapsed();
        debug!(
            "Frame: {} keypoints -> {} foreground -> {} clusters -> {} tracks in {:?}",
            keypoints_detected,
            foreground.len(),
            clusters.len(),
            targets.len(),
            elapsed
        );

        Ok(FrameReport {
            keypoints_detected,
            keypoints_kept: foreground.len(),
            clusters,
            targets,
            elapsed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keypoints::KeypointDetector;
    use crate::synthetic::SyntheticScene;
    use crate::systems::depth_filter::DepthEstimator;
    use crate::video::FrameSource;

    #[test]
    fn test_end_to_end_single_moving_blob() {
        let config = PipelineConfig::default();
        let mut pipeline = FramePipeline::new(&config);
        let mut scene = SyntheticScene::new(320, 240, 10);

        let mut last_report = None;
        while let Some(mut frame) = scene.next_frame() {
            let depth_map = scene.infer(&frame);
            let keypoints = scene.detect(&frame);
            let report = pipeline
                .process_frame(&mut frame, &depth_map, keypoints)
                .unwrap();

            // Exactly one foreground blob, exactly one occupied track
            assert_eq!(report.clusters.len(), 1);
            assert_eq!(report.targets.len(), 1);
            assert_eq!(report.targets[0].id, 0);
            last_report = Some(report);
        }

        let report = last_report.expect("scene produced no frames");
        let target = &report.targets[0];
        let (true_x, true_y) = scene.blob_position(9);
        assert!((target.x - true_x).abs() < 5.);
        assert!((target.y - true_y).abs() < 5.);
    }

    #[test]
    fn test_empty_keypoints_is_a_clean_frame() {
        let config = PipelineConfig::default();
        let mut pipeline = FramePipeline::new(&config);
        let mut frame = Frame::new(64, 64);
        let depth_map = DepthMap::zeros((64, 64));

        let report = pipeline
            .process_frame(&mut frame, &depth_map, Vec::new())
            .unwrap();
        assert_eq!(report.clusters.len(), 0);
        assert_eq!(report.targets.len(), 0);
    }
}
