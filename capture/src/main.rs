mod camera;
mod capture;

use camera::http::HttpCamera;
use clap::Parser;
use frame_lapse_common::config::{CameraMode, Config};
use frame_lapse_common::frame::FrameError;
use std::path::PathBuf;
use tracing::error;

/// Take a picture and save it to a directory under the next sequential
/// `frame-NNNNN.jpg` name. Meant to be run from cron every few minutes.
#[derive(Debug, Parser)]
#[command(name = "frame-lapse-capture", version)]
struct Cli {
    /// Path at which frames should be saved
    #[arg(short = 'd', long = "save-directory", value_name = "PATH")]
    save_directory: Option<PathBuf>,

    /// TOML file describing the camera source
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    config: Option<PathBuf>,
}

#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("no save directory given")]
    MissingSaveDirectory,
    #[error("failed to list save directory {path}: {source}")]
    ReadDirectory {
        path: String,
        source: std::io::Error,
    },
    #[error(transparent)]
    Frame(#[from] FrameError),
    #[error("HTTP connection failed: {0}")]
    HttpConnect(reqwest::Error),
    #[error("HTTP stream error: {0}")]
    HttpStream(reqwest::Error),
    #[error("HTTP status {0}")]
    HttpStatus(u16),
    #[error("camera stream ended before a full frame arrived")]
    StreamEnded,
    #[error("camera device {device}: {source}")]
    Device {
        device: String,
        source: std::io::Error,
    },
    #[error("failed to start streaming from {device}: {reason}")]
    DeviceStart { device: String, reason: String },
    #[error("camera mode {0:?} needs the `{1}` feature, rebuild with --features {1}")]
    BackendDisabled(CameraMode, &'static str),
    #[error("failed to transform captured frame: {0}")]
    Image(#[from] image::ImageError),
    #[error("failed to write frame {path}: {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => match Config::load(path) {
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

    match capture_with(&cli, &config).await {
        Ok(_) => {}
        Err(CaptureError::MissingSaveDirectory) => {
            eprintln!("No save directory parameter passed; exiting.");
            eprintln!("Please pass a directory to the -d or --save-directory argument.");
            std::process::exit(1);
        }
        Err(e) => {
            error!(error = %e, "capture failed");
            std::process::exit(1);
        }
    }
}

/// Pick the backend for `camera.mode` and run one capture with it.
async fn capture_with(cli: &Cli, config: &Config) -> Result<PathBuf, CaptureError> {
    let save_directory = cli.save_directory.as_deref();
    let policy = config.capture.on_unrecognized;

    match config.camera.mode {
        CameraMode::Snapshot | CameraMode::Mjpeg => {
            capture::run(save_directory, || HttpCamera::open(&config.camera), policy).await
        }
        #[cfg(feature = "v4l2")]
        CameraMode::V4l2 => {
            use camera::v4l2::V4l2Camera;
            capture::run(save_directory, || V4l2Camera::open(&config.camera), policy).await
        }
        #[cfg(not(feature = "v4l2"))]
        CameraMode::V4l2 => {
            let disabled = || {
                Err::<HttpCamera, _>(CaptureError::BackendDisabled(CameraMode::V4l2, "v4l2"))
            };
            capture::run(save_directory, disabled, policy).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_directory_flag_long_and_short() {
        let cli = Cli::try_parse_from(["frame-lapse-capture", "-d", "/tmp/frames"]).unwrap();
        assert_eq!(cli.save_directory, Some(PathBuf::from("/tmp/frames")));

        let cli =
            Cli::try_parse_from(["frame-lapse-capture", "--save-directory", "/srv/cam"]).unwrap();
        assert_eq!(cli.save_directory, Some(PathBuf::from("/srv/cam")));
        assert!(cli.config.is_none());
    }

    #[test]
    fn save_directory_may_be_omitted_at_parse_time() {
        let cli = Cli::try_parse_from(["frame-lapse-capture"]).unwrap();
        assert!(cli.save_directory.is_none());
    }

    #[test]
    fn unknown_flag_is_rejected() {
        assert!(Cli::try_parse_from(["frame-lapse-capture", "--rotate", "90"]).is_err());
    }
}
