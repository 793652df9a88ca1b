pub mod clustering;
pub mod depth_filter;
pub mod suppression;
pub mod tracking;

use clustering::ClusteringSystem;
use depth_filter::DepthFilter;
use suppression::NonMaxSuppressor;
use tracking::{TrackBank, TrackSettings};

use crate::pipeline_config::PipelineConfig;

/// The per-frame processing systems, in pipeline order. The track bank is
/// the only member carrying state across frames.
pub struct Systems {
    pub suppression: NonMaxSuppressor,
    pub depth_filter: DepthFilter,
    pub clustering: ClusteringSystem,
    pub track_bank: TrackBank,
}

impl Systems {
    pub fn new(config: &PipelineConfig) -> Systems {
        let suppression = NonMaxSuppressor::new(
            config.suppression_overlap_threshold,
            config.keypoint_radius,
        );

        let depth_filter = DepthFilter::new(config.depth_range_min, config.depth_range_max);

        let clustering = ClusteringSystem::new(
            config.knn_k,
            config.eps_percentile,
            config.clustering_min_points,
        );

        let track_bank = TrackBank::new(TrackSettings {
            motion_model: config.motion_model,
            association: config.association,
            unmatched_policy: config.unmatched_policy,
            expire_after_frames: config.expire_after_frames,
            frame_interval: config.frame_interval,
            initial_covariance: config.initial_covariance,
            process_noise: config.process_noise,
            measurement_noise: config.measurement_noise,
        });

        Systems {
            suppression,
            depth_filter,
            clustering,
            track_bank,
        }
    }
}
