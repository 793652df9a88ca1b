use clap::{command, Parser};

// Some defaults; some of which can be overriden via CLI args
const CONFIG_FILE_PATH: &str = "./skytrack.json";
const OUTPUT_DIR: &str = "./frames_out";
const FRAME_WIDTH: usize = 640;
const FRAME_HEIGHT: usize = 480;
const FRAME_COUNT: usize = 90;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Where to load the pipeline config
    #[arg(long="configPath",default_value_t=String::from(CONFIG_FILE_PATH))]
    pub config_path: String,

    /// Write the default config to configPath and exit
    #[arg(long = "saveDefaultConfig")]
    pub save_default_config: bool,

    #[arg(long = "loglevel",default_value_t=String::from("info"))]
    pub log_level: String,

    /// Directory for the annotated output frame sequence
    #[arg(long="outputDir",default_value_t=String::from(OUTPUT_DIR))]
    pub output_dir: String,

    /// Synthetic scene frame width in pixels
    #[arg(long = "scene.width", default_value_t = FRAME_WIDTH)]
    pub frame_width: usize,

    /// Synthetic scene frame height in pixels
    #[arg(long = "scene.height", default_value_t = FRAME_HEIGHT)]
    pub frame_height: usize,

    /// How many frames the synthetic scene produces
    #[arg(long = "scene.frames", default_value_t = FRAME_COUNT)]
    pub frame_count: usize,
}
