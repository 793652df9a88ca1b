pub mod annotate;
pub mod geometry_utils;
pub mod keypoints;
pub mod pipeline;
pub mod pipeline_config;
pub mod settings;
pub mod synthetic;
pub mod systems;
pub mod tracking;
pub mod video;

pub type Point2D = (f32, f32);
