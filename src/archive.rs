//! Bounded zip extraction for downloaded dataset archives.

use std::{
    fs::File,
    path::{Path, PathBuf},
};

use thiserror::Error;

const MAX_ZIP_ENTRIES: usize = 1_000;
const MAX_ZIP_ENTRY_UNCOMPRESSED_BYTES: u64 = 1024 * 1024 * 1024;
const MAX_ZIP_TOTAL_UNCOMPRESSED_BYTES: u64 = 4 * 1024 * 1024 * 1024;
const MAX_ZIP_COMPRESSION_RATIO: u64 = 200;

/// Errors raised while unpacking an archive.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("Failed to open archive {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid zip archive: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("Archive rejected: {0}")]
    Limit(String),
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[derive(Clone, Copy)]
pub(crate) struct ZipExtractionLimits {
    pub max_entries: usize,
    pub max_entry_uncompressed_bytes: u64,
    pub max_total_uncompressed_bytes: u64,
    pub max_compression_ratio: u64,
}

impl ZipExtractionLimits {
    pub(crate) fn standard() -> Self {
        Self {
            max_entries: MAX_ZIP_ENTRIES,
            max_entry_uncompressed_bytes: MAX_ZIP_ENTRY_UNCOMPRESSED_BYTES,
            max_total_uncompressed_bytes: MAX_ZIP_TOTAL_UNCOMPRESSED_BYTES,
            max_compression_ratio: MAX_ZIP_COMPRESSION_RATIO,
        }
    }
}

/// Extract a zip archive into `dest_dir` all-or-nothing.
///
/// Entries are unpacked into a hidden staging directory inside `dest_dir` and
/// moved into place only once every entry has been written and checksummed.
/// On failure the staging directory is removed and `dest_dir` is untouched.
pub fn unzip_into_place(zip_path: &Path, dest_dir: &Path) -> Result<Vec<PathBuf>, ArchiveError> {
    let staging = tempfile::Builder::new()
        .prefix(".extract-")
        .tempdir_in(dest_dir)
        .map_err(|source| ArchiveError::Write {
            path: dest_dir.to_path_buf(),
            source,
        })?;
    let staged = unzip_to_dir(zip_path, staging.path())?;

    let mut placed = Vec::with_capacity(staged.len());
    for staged_path in staged {
        let Ok(relative) = staged_path.strip_prefix(staging.path()) else {
            continue;
        };
        let target = dest_dir.join(relative);
        if let Some(parent) = target.parent() {
            create_dir_all(parent)?;
        }
        std::fs::rename(&staged_path, &target).map_err(|source| ArchiveError::Write {
            path: target.clone(),
            source,
        })?;
        placed.push(target);
    }
    Ok(placed)
}

/// Extract a zip archive into `dest_dir`, returning the extracted file paths.
///
/// Entries whose names would escape `dest_dir` are skipped.
pub fn unzip_to_dir(zip_path: &Path, dest_dir: &Path) -> Result<Vec<PathBuf>, ArchiveError> {
    unzip_to_dir_with_limits(zip_path, dest_dir, ZipExtractionLimits::standard())
}

pub(crate) fn unzip_to_dir_with_limits(
    zip_path: &Path,
    dest_dir: &Path,
    limits: ZipExtractionLimits,
) -> Result<Vec<PathBuf>, ArchiveError> {
    let file = File::open(zip_path).map_err(|source| ArchiveError::Open {
        path: zip_path.to_path_buf(),
        source,
    })?;
    let mut archive = zip::ZipArchive::new(file)?;
    let entry_count = archive.len();
    if entry_count > limits.max_entries {
        return Err(ArchiveError::Limit(format!(
            "archive has {entry_count} entries, limit is {}",
            limits.max_entries
        )));
    }

    let mut extracted = Vec::new();
    let mut total_uncompressed: u64 = 0;
    for i in 0..entry_count {
        let mut entry = archive.by_index(i)?;
        let uncompressed_size = entry.size();
        if uncompressed_size > limits.max_entry_uncompressed_bytes {
            return Err(ArchiveError::Limit(format!(
                "entry '{}' is too large ({} bytes, limit {})",
                entry.name(),
                uncompressed_size,
                limits.max_entry_uncompressed_bytes
            )));
        }
        if uncompressed_size > 0 {
            let compressed_size = entry.compressed_size();
            let max_uncompressed = compressed_size.saturating_mul(limits.max_compression_ratio);
            if compressed_size == 0 || uncompressed_size > max_uncompressed {
                return Err(ArchiveError::Limit(format!(
                    "entry '{}' exceeds compression ratio limit",
                    entry.name()
                )));
            }
        }
        total_uncompressed = total_uncompressed.saturating_add(uncompressed_size);
        if total_uncompressed > limits.max_total_uncompressed_bytes {
            return Err(ArchiveError::Limit(format!(
                "extracted size {} exceeds limit {}",
                total_uncompressed, limits.max_total_uncompressed_bytes
            )));
        }

        let Some(outpath) = entry.enclosed_name().map(|path| dest_dir.join(path)) else {
            tracing::warn!("Skipping archive entry with unsafe path: {}", entry.name());
            continue;
        };
        if entry.is_dir() {
            create_dir_all(&outpath)?;
            continue;
        }
        if let Some(parent) = outpath.parent() {
            create_dir_all(parent)?;
        }
        let write_err = |source| ArchiveError::Write {
            path: outpath.clone(),
            source,
        };
        let mut outfile = File::create(&outpath).map_err(write_err)?;
        std::io::copy(&mut entry, &mut outfile).map_err(write_err)?;
        extracted.push(outpath);
    }
    Ok(extracted)
}

fn create_dir_all(path: &Path) -> Result<(), ArchiveError> {
    std::fs::create_dir_all(path).map_err(|source| ArchiveError::Write {
        path: path.to_path_buf(),
        source,
    })
}
