use frame_lapse_common::config::UnrecognizedPolicy;
use frame_lapse_common::frame;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

use crate::camera::{CaptureDevice, Orientation};
use crate::CaptureError;

/// Validate the save directory, open the device and capture one frame.
///
/// Nothing is opened or written when `save_directory` is missing or empty.
pub async fn run<D, F>(
    save_directory: Option<&Path>,
    open_device: F,
    policy: UnrecognizedPolicy,
) -> Result<PathBuf, CaptureError>
where
    D: CaptureDevice,
    F: FnOnce() -> Result<D, CaptureError>,
{
    let directory = save_directory
        .filter(|dir| !dir.as_os_str().is_empty())
        .ok_or(CaptureError::MissingSaveDirectory)?;
    let mut device = open_device()?;
    capture_next_frame(&mut device, directory, policy).await
}

/// Capture one frame into `directory` under the next sequential name.
pub async fn capture_next_frame<D: CaptureDevice>(
    device: &mut D,
    directory: &Path,
    policy: UnrecognizedPolicy,
) -> Result<PathBuf, CaptureError> {
    let names = list_entry_names(directory).await?;
    let name = frame::next_frame_name(names.as_slice(), policy)?;
    debug!(existing = names.len(), next = %name, "allocated frame name");

    device.set_orientation(Orientation::FLIPPED);
    let jpeg = device.capture().await?;

    let path = directory.join(name.file_name());
    write_new(&path, &jpeg).await?;
    info!(path = %path.display(), bytes = jpeg.len(), "saved frame");
    Ok(path)
}

/// Names of every entry in `directory`, unordered. Names that are not valid
/// UTF-8 are kept lossily so they still count as unrecognised.
async fn list_entry_names(directory: &Path) -> Result<Vec<String>, CaptureError> {
    let read_dir_err = |source| CaptureError::ReadDirectory {
        path: directory.display().to_string(),
        source,
    };

    let mut entries = tokio::fs::read_dir(directory).await.map_err(read_dir_err)?;
    let mut names = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(read_dir_err)? {
        names.push(entry.file_name().to_string_lossy().into_owned());
    }
    Ok(names)
}

/// Write `data` to a file that must not exist yet.
async fn write_new(path: &Path, data: &[u8]) -> Result<(), CaptureError> {
    let file = tokio::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await
        .map_err(|source| CaptureError::Write {
            path: path.display().to_string(),
            source,
        })?;
    fill_or_remove(path, file, data).await
}

/// Write `data` into the freshly created `path`. On failure the partial file
/// is removed so it cannot become the next watermark.
async fn fill_or_remove<W>(path: &Path, mut out: W, data: &[u8]) -> Result<(), CaptureError>
where
    W: AsyncWrite + Unpin,
{
    let result = match out.write_all(data).await {
        Ok(()) => out.flush().await,
        Err(e) => Err(e),
    };
    drop(out);

    if let Err(source) = result {
        if let Err(e) = tokio::fs::remove_file(path).await {
            warn!(path = %path.display(), error = %e, "failed to remove partial frame");
        }
        return Err(CaptureError::Write {
            path: path.display().to_string(),
            source,
        });
    }
    Ok(())
}
