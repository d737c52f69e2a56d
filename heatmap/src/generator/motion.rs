use frame_lapse_common::config::HeatmapConfig;
use image::imageops::FilterType;
use image::{DynamicImage, GrayImage, Rgb, RgbImage};
use std::ops::Range;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::grid::DivisionGrid;
use super::{Heatmap, HeatmapError};

#[derive(Debug, Clone)]
pub struct MotionOptions {
    /// Mean absolute luminance change a cell must exceed to count as motion.
    pub motion_threshold: u8,
    /// Opacity of the colour overlay on cells that saw motion.
    pub overlay_alpha: f32,
    pub output: PathBuf,
}

impl From<&HeatmapConfig> for MotionOptions {
    fn from(config: &HeatmapConfig) -> Self {
        Self {
            motion_threshold: config.motion_threshold,
            overlay_alpha: config.overlay_alpha.clamp(0.0, 1.0),
            output: PathBuf::from(&config.output),
        }
    }
}

/// Frame-differencing motion heatmap.
///
/// Every consecutive pair of frames is compared cell by cell over the
/// division grid; a cell scores one event when its mean luminance change
/// exceeds the threshold. The result is drawn over the last frame, hot cells
/// in red and rarely active ones in blue.
pub struct MotionHeatmap {
    vertical_divisions: u32,
    horizontal_divisions: u32,
    images: Vec<PathBuf>,
    options: MotionOptions,
}

/// Motion counts plus the frame they are drawn over.
pub struct Accumulated {
    pub grid: DivisionGrid,
    pub background: RgbImage,
}

impl MotionHeatmap {
    pub fn new(
        vertical_divisions: u32,
        horizontal_divisions: u32,
        images: Vec<PathBuf>,
        options: MotionOptions,
    ) -> Self {
        Self {
            vertical_divisions,
            horizontal_divisions,
            images,
            options,
        }
    }

    /// Walk all frames and count motion events per cell.
    pub fn accumulate(&self) -> Result<Accumulated, HeatmapError> {
        let (first, rest) = match self.images.split_first() {
            Some((first, rest)) if !rest.is_empty() => (first, rest),
            _ => return Err(HeatmapError::NotEnoughFrames(self.images.len())),
        };

        let first = load_frame(first, None)?;
        let (width, height) = (first.width(), first.height());
        let (rows, cols) = (self.vertical_divisions, self.horizontal_divisions);
        if rows == 0 || cols == 0 || rows > height || cols > width {
            return Err(HeatmapError::GridTooFine {
                rows,
                cols,
                width,
                height,
            });
        }

        let mut grid = DivisionGrid::new(rows, cols);
        let threshold = f64::from(self.options.motion_threshold);
        let mut prev = first.to_luma8();
        let mut last = first;

        for path in rest {
            let frame = load_frame(path, Some((width, height)))?;
            let luma = frame.to_luma8();

            let mut active = 0u32;
            for row in 0..rows {
                let ys = grid.row_span(row, height);
                for col in 0..cols {
                    let xs = grid.col_span(col, width);
                    if mean_abs_diff(&prev, &luma, ys.clone(), xs) > threshold {
                        grid.increment(row, col);
                        active += 1;
                    }
                }
            }
            debug!(frame = %path.display(), active_cells = active, "compared frame");

            prev = luma;
            last = frame;
        }

        Ok(Accumulated {
            grid,
            background: last.to_rgb8(),
        })
    }
}

impl Heatmap for MotionHeatmap {
    fn generate(&mut self) -> Result<(), HeatmapError> {
        let Accumulated { grid, background } = self.accumulate()?;
        let image = render(&grid, &background, self.options.overlay_alpha);

        let output = &self.options.output;
        image.save(output).map_err(|source| HeatmapError::Write {
            path: output.display().to_string(),
            source,
        })?;

        info!(
            frames = self.images.len(),
            rows = grid.rows(),
            cols = grid.cols(),
            peak = grid.max(),
            output = %output.display(),
            "wrote motion heatmap"
        );
        Ok(())
    }

    fn name(&self) -> &str {
        "motion"
    }
}

fn load_frame(path: &Path, size: Option<(u32, u32)>) -> Result<DynamicImage, HeatmapError> {
    let img = image::open(path).map_err(|source| HeatmapError::Decode {
        path: path.display().to_string(),
        source,
    })?;

    match size {
        Some((w, h)) if img.width() != w || img.height() != h => {
            debug!(frame = %path.display(), from = ?(img.width(), img.height()), to = ?(w, h), "resizing frame");
            Ok(img.resize_exact(w, h, FilterType::Triangle))
        }
        _ => Ok(img),
    }
}

fn mean_abs_diff(a: &GrayImage, b: &GrayImage, ys: Range<u32>, xs: Range<u32>) -> f64 {
    let mut sum = 0u64;
    let mut n = 0u64;
    for y in ys {
        for x in xs.clone() {
            sum += u64::from(a.get_pixel(x, y).0[0].abs_diff(b.get_pixel(x, y).0[0]));
            n += 1;
        }
    }
    if n == 0 {
        return 0.0;
    }
    sum as f64 / n as f64
}

/// Tint each cell of `background` by its share of the busiest cell's count.
fn render(grid: &DivisionGrid, background: &RgbImage, alpha: f32) -> RgbImage {
    let peak = grid.max();
    let (width, height) = background.dimensions();

    RgbImage::from_fn(width, height, |x, y| {
        let bg = *background.get_pixel(x, y);
        let (row, col) = grid.cell_of(x, y, width, height);
        let count = grid.get(row, col);
        if peak == 0 || count == 0 {
            return bg;
        }

        let heat = ramp(count as f32 / peak as f32);
        let mut out = [0u8; 3];
        for (i, channel) in out.iter_mut().enumerate() {
            let mixed = f32::from(bg.0[i]) * (1.0 - alpha) + f32::from(heat[i]) * alpha;
            *channel = mixed.round().clamp(0.0, 255.0) as u8;
        }
        Rgb(out)
    })
}

/// Blue → cyan → green → yellow → red.
fn ramp(t: f32) -> [u8; 3] {
    let t = t.clamp(0.0, 1.0) * 4.0;
    let (r, g, b) = if t < 1.0 {
        (0.0, t, 1.0)
    } else if t < 2.0 {
        (0.0, 1.0, 2.0 - t)
    } else if t < 3.0 {
        (t - 2.0, 1.0, 0.0)
    } else {
        (1.0, 4.0 - t, 0.0)
    };
    [r, g, b].map(|c: f32| (c * 255.0).round() as u8)
}
