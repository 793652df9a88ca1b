use std::fs;

use anyhow::Result;
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};

use crate::systems::tracking::{AssociationStrategy, MotionModel, UnmatchedPolicy};

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PipelineConfig {
    // -------- SUPPRESSION SETTINGS
    /// Circle-IoU above which the lower-response keypoint is suppressed.
    /// Sensible range roughly 0.05 - 0.2
    pub suppression_overlap_threshold: f32,

    /// Detection circle radius (px) used for the overlap computation
    pub keypoint_radius: f32,

    // -------- DEPTH FILTER SETTINGS
    /// Depth values below this (distance units) are ignored when computing
    /// the scene median
    pub depth_range_min: f32,

    /// Depth values above this are ignored when computing the scene median
    pub depth_range_max: f32,

    // -------- CLUSTERING SETTINGS
    /// Which nearest neighbour the adaptive eps estimate is read from
    /// (3 or 4 works for 2D points)
    pub knn_k: usize,

    /// Position in the sorted k-distance distribution used as eps
    pub eps_percentile: f32,

    /// Min neighbourhood size that constitutes a valid cluster
    pub clustering_min_points: usize,

    // -------- TRACKING SETTINGS
    /// Nominal inter-frame interval in seconds (not measured from the wall
    /// clock)
    pub frame_interval: f32,

    /// Prediction dynamics: constantVelocity or constantAcceleration
    pub motion_model: MotionModel,

    /// How clusters are matched to tracks: nearestCentroid (with a gate) or
    /// slotIndex (positional, original behaviour)
    pub association: AssociationStrategy,

    /// Unmatched tracks either hold their last estimate or coast along the
    /// predicted motion
    pub unmatched_policy: UnmatchedPolicy,

    /// Evict a track after this many consecutive unmatched frames; null
    /// keeps tracks forever
    pub expire_after_frames: Option<u32>,

    /// Initial estimate covariance scale (uncertain start)
    pub initial_covariance: f32,

    /// Process noise scale (how much the motion model is trusted)
    pub process_noise: f32,

    /// Measurement noise scale (how noisy cluster centroids are)
    pub measurement_noise: f32,

    // -------- OUTPUT SETTINGS
    /// Draw the filter's predicted position and a link to the measured
    /// centroid (diagnostics)
    pub show_predicted: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            suppression_overlap_threshold: 0.05,
            keypoint_radius: 3.5,
            depth_range_min: 0.5,
            depth_range_max: 5.0,
            knn_k: 3,
            eps_percentile: 0.9,
            clustering_min_points: 4,
            frame_interval: 1. / 30.,
            motion_model: MotionModel::ConstantVelocity,
            association: AssociationStrategy::NearestCentroid { max_distance: 50. },
            unmatched_policy: UnmatchedPolicy::Hold,
            expire_after_frames: Some(30),
            initial_covariance: 1000.,
            process_noise: 0.1,
            measurement_noise: 10.,
            show_predicted: false,
        }
    }
}

impl PipelineConfig {
    /// Load from a JSON file; a missing file is not an error, just defaults.
    pub fn load_from_file(path: &str) -> Result<PipelineConfig> {
        let text = match fs::read_to_string(path) {
            Err(e) => {
                if e.kind() == std::io::ErrorKind::NotFound {
                    warn!("Config file \"{}\" not found; using defaults", path);
                    return Ok(PipelineConfig::default());
                }
                error!("Failed to read config from \"{}\": {}", path, e);
                return Err(e.into());
            }
            Ok(s) => {
                info!("Loaded pipeline config OK from \"{}\"", path);
                s
            }
        };

        let config = serde_json::from_str::<PipelineConfig>(&text)?;
        debug!("Config parsed from file: {:?}", config);
        Ok(config)
    }

    pub fn write_to_file(&self, path: &str) -> Result<()> {
        let text = serde_json::to_string_pretty(self)?;
        fs::write(path, text)?;
        info!("Wrote config to file: \"{}\"", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_round_trips_through_json() {
        let config = PipelineConfig::default();
        let text = serde_json::to_string_pretty(&config).unwrap();
        let parsed: PipelineConfig = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed.knn_k, config.knn_k);
        assert_eq!(parsed.association, config.association);
        assert_eq!(parsed.expire_after_frames, Some(30));
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = PipelineConfig::load_from_file("/no/such/config.json").unwrap();
        assert_eq!(config.clustering_min_points, 4);
    }
}
