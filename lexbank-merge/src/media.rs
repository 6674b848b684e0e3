//! Linked-file copying.
//!
//! Media referenced by relative path is copied into the managed linked-files
//! area under a fixed subfolder per kind. Copies are idempotent: an existing
//! target is skipped, so re-importing the same file is safe.

use std::fs;
use std::io;
use std::path::Path;
use tracing::{debug, warn};

/// The kind of linked file, determining its subfolder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    AudioVisual,
    Pictures,
    Others,
}

impl MediaKind {
    /// The fixed subfolder for this kind.
    #[must_use]
    pub fn subfolder(self) -> &'static str {
        match self {
            MediaKind::AudioVisual => "AudioVisual",
            MediaKind::Pictures => "Pictures",
            MediaKind::Others => "Others",
        }
    }
}

/// What a copy attempt did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyOutcome {
    Copied,
    /// The target already exists; collision resolved by skipping.
    SkippedExisting,
    /// The source file was not found.
    MissingSource,
}

/// Copies one referenced file into the linked-files area.
///
/// Only the file name of `relative` is kept; the target is
/// `<dest_root>/<kind subfolder>/<file name>`.
pub fn copy_linked_file(
    source_root: &Path,
    dest_root: &Path,
    kind: MediaKind,
    relative: &str,
) -> io::Result<CopyOutcome> {
    let source = source_root.join(relative);
    if !source.is_file() {
        warn!("linked file missing: {}", source.display());
        return Ok(CopyOutcome::MissingSource);
    }
    let file_name = source
        .file_name()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "no file name"))?;
    let dest_dir = dest_root.join(kind.subfolder());
    fs::create_dir_all(&dest_dir)?;
    let dest = dest_dir.join(file_name);
    if dest.exists() {
        debug!("linked file already present: {}", dest.display());
        return Ok(CopyOutcome::SkippedExisting);
    }
    fs::copy(&source, &dest)?;
    debug!("copied linked file to {}", dest.display());
    Ok(CopyOutcome::Copied)
}
