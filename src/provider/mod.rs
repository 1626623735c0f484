//! Remote dataset providers.
//!
//! The ingestion pipeline only needs "put the files for this dataset into that
//! directory"; [`DatasetProvider`] is that seam, and [`kaggle::KaggleProvider`]
//! is the production implementation.

mod credentials;
pub mod kaggle;

use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::archive::ArchiveError;

pub use credentials::{Credentials, CredentialsError};
pub use kaggle::KaggleProvider;

/// Fetches a dataset's files into a local directory.
pub trait DatasetProvider {
    /// Download `dataset` and extract its files into `dest_dir`, which already exists.
    ///
    /// Returns the paths of the extracted files.
    fn fetch(&self, dataset: &DatasetReference, dest_dir: &Path)
    -> Result<Vec<PathBuf>, ProviderError>;
}

impl<P: DatasetProvider + ?Sized> DatasetProvider for Box<P> {
    fn fetch(
        &self,
        dataset: &DatasetReference,
        dest_dir: &Path,
    ) -> Result<Vec<PathBuf>, ProviderError> {
        (**self).fetch(dataset, dest_dir)
    }
}

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Invalid dataset reference `{0}` (expected `<owner>/<dataset-name>`)")]
    InvalidReference(String),
    #[error("Missing provider credentials: {0}")]
    Credentials(#[from] CredentialsError),
    #[error("Invalid provider URL: {0}")]
    Url(#[from] url::ParseError),
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("HTTP status {status} from {url}: {message}")]
    Status {
        status: u16,
        url: String,
        message: String,
    },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Archive error: {0}")]
    Archive(#[from] ArchiveError),
}

/// A validated `<owner>/<dataset-name>` identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetReference {
    owner: String,
    name: String,
}

impl DatasetReference {
    pub fn parse(reference: &str) -> Result<Self, ProviderError> {
        let invalid = || ProviderError::InvalidReference(reference.to_string());
        let (owner, name) = reference.trim().split_once('/').ok_or_else(invalid)?;
        if !is_valid_segment(owner) || !is_valid_segment(name) {
            return Err(invalid());
        }
        Ok(Self {
            owner: owner.to_string(),
            name: name.to_string(),
        })
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for DatasetReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

fn is_valid_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment != "."
        && segment != ".."
        && segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}
