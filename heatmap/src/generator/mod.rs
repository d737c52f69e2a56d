pub mod grid;
pub mod motion;
pub mod traits;

pub use motion::{MotionHeatmap, MotionOptions};
pub use traits::Heatmap;

#[derive(Debug, thiserror::Error)]
pub enum HeatmapError {
    #[error("need at least two frames to detect motion, got {0}")]
    NotEnoughFrames(usize),
    #[error("a {rows}x{cols} grid does not fit a {width}x{height} frame")]
    GridTooFine {
        rows: u32,
        cols: u32,
        width: u32,
        height: u32,
    },
    #[error("failed to decode frame {path}: {source}")]
    Decode {
        path: String,
        source: image::ImageError,
    },
    #[error("failed to write heatmap {path}: {source}")]
    Write {
        path: String,
        source: image::ImageError,
    },
}
