use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::generator::{Heatmap, HeatmapError};

const FRAME_SUFFIX: &str = ".jpg";

/// Division grid handed to the heatmap collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridSpec {
    pub vertical_divisions: u32,
    pub horizontal_divisions: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    #[error("failed to list frames directory {path}: {source}")]
    ReadDirectory {
        path: String,
        source: std::io::Error,
    },
    #[error(transparent)]
    Heatmap(#[from] HeatmapError),
}

/// Regular files in `directory` whose name ends in `.jpg`, sorted by name and
/// joined onto `directory`.
///
/// The suffix match is case-sensitive; `A.JPG` is not a frame. Symlinks are
/// followed when deciding what counts as a regular file.
pub fn list_frames(directory: &Path) -> Result<Vec<PathBuf>, DriverError> {
    let read_dir_err = |source| DriverError::ReadDirectory {
        path: directory.display().to_string(),
        source,
    };

    let mut names = Vec::new();
    for entry in std::fs::read_dir(directory).map_err(read_dir_err)? {
        let entry = entry.map_err(read_dir_err)?;
        let Ok(name) = entry.file_name().into_string() else {
            debug!(entry = ?entry.file_name(), "skipping non UTF-8 name");
            continue;
        };
        if name.ends_with(FRAME_SUFFIX) && entry.path().is_file() {
            names.push(name);
        }
    }
    names.sort_unstable();

    Ok(names.into_iter().map(|name| directory.join(name)).collect())
}

/// List the frames, build the collaborator once and run it once.
///
/// Every failure, including an empty frame set rejected by the collaborator,
/// is returned unchanged.
pub fn run_with<H, F>(directory: &Path, grid: GridSpec, construct: F) -> Result<(), DriverError>
where
    H: Heatmap,
    F: FnOnce(u32, u32, Vec<PathBuf>) -> H,
{
    let images = list_frames(directory)?;
    info!(
        directory = %directory.display(),
        frames = images.len(),
        vertical_divisions = grid.vertical_divisions,
        horizontal_divisions = grid.horizontal_divisions,
        "generating heatmap"
    );

    let mut heatmap = construct(grid.vertical_divisions, grid.horizontal_divisions, images);
    debug!(generator = heatmap.name(), "collaborator constructed");
    heatmap.generate()?;
    Ok(())
}
