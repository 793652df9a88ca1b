use clap::Parser;

use env_logger::Env;
use log::{debug, info};

use skytrack::keypoints::KeypointDetector;
use skytrack::pipeline::FramePipeline;
use skytrack::pipeline_config::PipelineConfig;
use skytrack::settings::Cli;
use skytrack::synthetic::SyntheticScene;
use skytrack::systems::depth_filter::DepthEstimator;
use skytrack::video::{FrameSink, FrameSource, PpmSequenceWriter};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize the logger from the environment

    env_logger::Builder::from_env(Env::default().default_filter_or(&cli.log_level)).init();

    debug!("Started; args: {:?}", cli);

    if cli.save_default_config {
        PipelineConfig::default().write_to_file(&cli.config_path)?;
        return Ok(());
    }

    let config = PipelineConfig::load_from_file(&cli.config_path)?;

    let mut pipeline = FramePipeline::new(&config);

    // The depth-inference and keypoint-detection collaborators are external;
    // the synthetic scene stands in for both and for the frame source.
    let mut scene = SyntheticScene::new(cli.frame_width, cli.frame_height, cli.frame_count);
    let mut sink = PpmSequenceWriter::new(&cli.output_dir)?;

    while let Some(mut frame) = scene.next_frame() {
        let depth_map = scene.infer(&frame);
        let keypoints = scene.detect(&frame);

        let report = pipeline.process_frame(&mut frame, &depth_map, keypoints)?;

        info!(
            "Frame {}: {} clusters, {} tracks ({:?})",
            sink.frames_written(),
            report.clusters.len(),
            report.targets.len(),
            report.elapsed
        );

        sink.write_frame(&frame)?;
    }

    info!("End of stream after {} frames", sink.frames_written());
    Ok(())
}
