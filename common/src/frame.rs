use std::fmt;
use tracing::{debug, warn};

use crate::config::UnrecognizedPolicy;

const PREFIX: &str = "frame-";
const EXTENSION: &str = "jpg";
const INDEX_WIDTH: usize = 5;

/// Sequential name of a captured frame: `frame-NNNNN.jpg`.
///
/// Indices are zero-padded to five digits so that lexicographic and numeric
/// order agree up to 99999. Larger indices are written in full
/// (`frame-100000.jpg`) and still parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FrameName {
    index: u64,
}

impl FrameName {
    pub fn new(index: u64) -> Self {
        Self { index }
    }

    pub fn index(&self) -> u64 {
        self.index
    }

    /// Parse a directory entry name of the form `frame-<digits>.<ext>`.
    ///
    /// Any non-empty extension is accepted. Returns `None` for everything else
    /// (hidden files, partial writes, other naming schemes).
    pub fn parse(name: &str) -> Option<Self> {
        let rest = name.strip_prefix(PREFIX)?;
        let (digits, ext) = rest.split_once('.')?;
        if digits.is_empty() || ext.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        digits.parse().ok().map(Self::new)
    }

    /// File name this frame is written under.
    pub fn file_name(&self) -> String {
        format!("{PREFIX}{:0width$}.{EXTENSION}", self.index, width = INDEX_WIDTH)
    }

    pub fn successor(&self) -> Option<Self> {
        self.index.checked_add(1).map(Self::new)
    }
}

impl fmt::Display for FrameName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.file_name())
    }
}

/// Highest recognised frame in a directory listing, or `None` if there is none.
///
/// Entries are visited in lexicographic order. Unrecognised entries are
/// skipped with a warning or rejected, depending on `policy`.
pub fn watermark<S: AsRef<str>>(
    names: &[S],
    policy: UnrecognizedPolicy,
) -> Result<Option<FrameName>, FrameError> {
    let mut sorted: Vec<&str> = names.iter().map(AsRef::as_ref).collect();
    sorted.sort_unstable();

    let mut highest: Option<FrameName> = None;
    for name in sorted {
        match FrameName::parse(name) {
            Some(frame) => highest = highest.max(Some(frame)),
            None => match policy {
                UnrecognizedPolicy::Skip => {
                    warn!(entry = name, "ignoring unrecognised entry in save directory");
                }
                UnrecognizedPolicy::Fail => {
                    return Err(FrameError::Unrecognized(name.to_string()));
                }
            },
        }
    }
    Ok(highest)
}

/// Name the next capture should be written under.
///
/// The watermark of an empty directory is 0, so the first frame is
/// `frame-00001.jpg`.
pub fn next_frame_name<S: AsRef<str>>(
    names: &[S],
    policy: UnrecognizedPolicy,
) -> Result<FrameName, FrameError> {
    let last = watermark(names, policy)?.unwrap_or(FrameName::new(0));
    let next = last.successor().ok_or(FrameError::Exhausted)?;
    debug!(watermark = last.index(), next = next.index(), "recovered frame watermark");
    Ok(next)
}

#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("unrecognised entry in save directory: {0}")]
    Unrecognized(String),
    #[error("frame index space exhausted")]
    Exhausted,
}
