use std::path::PathBuf;

use thiserror::Error;

use crate::provider::ProviderError;
use crate::split::SplitError;
use crate::table::TableError;

use super::Partition;

/// Failure of an ingestion run. Every variant aborts the run.
#[derive(Debug, Error)]
pub enum IngestionError {
    #[error("Acquisition failed: {0}")]
    Acquisition(#[from] AcquisitionError),
    #[error("Failed to load raw data from {path}: {source}")]
    Load { path: PathBuf, source: TableError },
    #[error("Failed to split dataset: {0}")]
    Split(#[from] SplitError),
    #[error("Failed to persist partitions: {0}")]
    Persist(#[from] PersistError),
}

/// Coarse stage of the run an [`IngestionError`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestionPhase {
    /// Obtaining the raw file: directory setup and the remote download.
    Acquisition,
    /// Everything after the raw file exists: load, split, and write.
    Processing,
}

impl IngestionError {
    pub fn phase(&self) -> IngestionPhase {
        match self {
            Self::Acquisition(_) => IngestionPhase::Acquisition,
            Self::Load { .. } | Self::Split(_) | Self::Persist(_) => IngestionPhase::Processing,
        }
    }
}

#[derive(Debug, Error)]
pub enum AcquisitionError {
    #[error("failed to create raw data directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("{0}")]
    InvalidReference(#[source] ProviderError),
    #[error("download of {dataset} failed: {source}")]
    Provider {
        dataset: String,
        source: ProviderError,
    },
    #[error("{dataset} did not provide {path} (extracted: {extracted})")]
    MissingRawFile {
        dataset: String,
        path: PathBuf,
        extracted: String,
    },
}

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("failed to create output directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to write {partition} partition to {path}: {source}")]
    Write {
        partition: Partition,
        path: PathBuf,
        source: TableError,
    },
}
