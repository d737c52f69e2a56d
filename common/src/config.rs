use serde::Deserialize;
use std::path::Path;

/// Directory the heatmap driver reads frames from.
pub const DEFAULT_FRAMES_DIRECTORY: &str = "frames";
/// Rows of the heatmap division grid.
pub const DEFAULT_VERTICAL_DIVISIONS: u32 = 36;
/// Columns of the heatmap division grid.
pub const DEFAULT_HORIZONTAL_DIVISIONS: u32 = 64;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub capture: CaptureConfig,
    #[serde(default)]
    pub heatmap: HeatmapConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CameraConfig {
    #[serde(default = "default_camera_url")]
    pub url: String,
    #[serde(default)]
    pub mode: CameraMode,
    #[serde(default = "default_quality")]
    pub quality: u8,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    /// V4L2 device node, used in `v4l2` mode.
    #[serde(default = "default_device")]
    pub device: String,
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    /// Frames discarded after streaming starts while exposure settles.
    #[serde(default = "default_warmup_frames")]
    pub warmup_frames: u32,
}

/// How the camera hands out frames.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CameraMode {
    /// One GET returns one JPEG.
    #[default]
    Snapshot,
    /// One GET opens a `multipart/x-mixed-replace` stream of JPEG parts.
    Mjpeg,
    /// Locally attached camera read through Video4Linux2.
    V4l2,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CaptureConfig {
    #[serde(default)]
    pub on_unrecognized: UnrecognizedPolicy,
}

/// What to do with directory entries that are not `frame-NNNNN.ext`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnrecognizedPolicy {
    /// Log and ignore them.
    #[default]
    Skip,
    /// Refuse to capture.
    Fail,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HeatmapConfig {
    #[serde(default = "default_frames_directory")]
    pub frames_directory: String,
    #[serde(default = "default_vertical_divisions")]
    pub vertical_divisions: u32,
    #[serde(default = "default_horizontal_divisions")]
    pub horizontal_divisions: u32,
    #[serde(default = "default_motion_threshold")]
    pub motion_threshold: u8,
    #[serde(default = "default_overlay_alpha")]
    pub overlay_alpha: f32,
    #[serde(default = "default_output")]
    pub output: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            url: default_camera_url(),
            mode: CameraMode::default(),
            quality: default_quality(),
            connect_timeout_secs: default_connect_timeout(),
            device: default_device(),
            width: default_width(),
            height: default_height(),
            warmup_frames: default_warmup_frames(),
        }
    }
}

impl Default for HeatmapConfig {
    fn default() -> Self {
        Self {
            frames_directory: default_frames_directory(),
            vertical_divisions: default_vertical_divisions(),
            horizontal_divisions: default_horizontal_divisions(),
            motion_threshold: default_motion_threshold(),
            overlay_alpha: default_overlay_alpha(),
            output: default_output(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadFile(path.display().to_string(), e))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {0}: {1}")]
    ReadFile(String, std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(String),
}

// Default value functions
fn default_camera_url() -> String {
    "http://127.0.0.1:8080/frame".into()
}
fn default_quality() -> u8 {
    90
}
fn default_connect_timeout() -> u64 {
    10
}
fn default_device() -> String {
    "/dev/video0".into()
}
fn default_width() -> u32 {
    1280
}
fn default_height() -> u32 {
    720
}
fn default_warmup_frames() -> u32 {
    5
}
fn default_frames_directory() -> String {
    DEFAULT_FRAMES_DIRECTORY.into()
}
fn default_vertical_divisions() -> u32 {
    DEFAULT_VERTICAL_DIVISIONS
}
fn default_horizontal_divisions() -> u32 {
    DEFAULT_HORIZONTAL_DIVISIONS
}
fn default_motion_threshold() -> u8 {
    20
}
fn default_overlay_alpha() -> f32 {
    0.6
}
fn default_output() -> String {
    "heatmap.png".into()
}
fn default_log_level() -> String {
    "info".into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.camera.mode, CameraMode::Snapshot);
        assert_eq!(config.camera.quality, 90);
        assert_eq!(config.capture.on_unrecognized, UnrecognizedPolicy::Skip);
        assert_eq!(config.heatmap.frames_directory, "frames");
        assert_eq!(config.heatmap.vertical_divisions, 36);
        assert_eq!(config.heatmap.horizontal_divisions, 64);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = Config::parse(
            r#"
            [camera]
            url = "http://cam.local/stream"
            mode = "mjpeg"

            [capture]
            on_unrecognized = "fail"
            "#,
        )
        .unwrap();
        assert_eq!(config.camera.url, "http://cam.local/stream");
        assert_eq!(config.camera.mode, CameraMode::Mjpeg);
        assert_eq!(config.camera.connect_timeout_secs, 10);
        assert_eq!(config.capture.on_unrecognized, UnrecognizedPolicy::Fail);
        assert_eq!(config.heatmap.output, "heatmap.png");
    }

    #[test]
    fn v4l2_mode_with_device_settings() {
        let config = Config::parse(
            r#"
            [camera]
            mode = "v4l2"
            device = "/dev/video2"
            width = 640
            "#,
        )
        .unwrap();
        assert_eq!(config.camera.mode, CameraMode::V4l2);
        assert_eq!(config.camera.device, "/dev/video2");
        assert_eq!(config.camera.width, 640);
        assert_eq!(config.camera.height, 720);
        assert_eq!(config.camera.warmup_frames, 5);
    }

    #[test]
    fn unknown_mode_is_a_parse_error() {
        let err = Config::parse("[camera]\nmode = \"rtsp\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = Config::load(Path::new("/nonexistent/frame-lapse.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::ReadFile(..)));
    }
}
