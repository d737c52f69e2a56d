mod driver;
mod generator;

use driver::GridSpec;
use frame_lapse_common::config::Config;
use generator::{MotionHeatmap, MotionOptions};
use std::path::{Path, PathBuf};
use tracing::{error, info};

fn main() {
    let config = match std::env::args().nth(1).map(PathBuf::from) {
        Some(path) => match Config::load(&path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Failed to load config from {}: {e}", path.display());
                std::process::exit(1);
            }
        },
        None => Config::default(),
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.level.parse().unwrap_or_default()),
        )
        .init();

    let heatmap = &config.heatmap;
    info!(
        frames_directory = heatmap.frames_directory,
        output = heatmap.output,
        threshold = heatmap.motion_threshold,
        "starting frame-lapse heatmap"
    );

    let grid = GridSpec {
        vertical_divisions: heatmap.vertical_divisions,
        horizontal_divisions: heatmap.horizontal_divisions,
    };
    let options = MotionOptions::from(heatmap);

    let result = driver::run_with(Path::new(&heatmap.frames_directory), grid, |v, h, images| {
        MotionHeatmap::new(v, h, images, options)
    });

    if let Err(e) = result {
        error!(error = %e, "heatmap generation failed");
        std::process::exit(1);
    }
}
