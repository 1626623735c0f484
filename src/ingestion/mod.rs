//! Data ingestion: acquire the raw dataset, drop duplicate rows, and write a
//! seeded train/test split.
//!
//! A run always goes acquire, load, deduplicate, split, persist. Only
//! acquisition can be skipped, when the raw file is already on disk. Any
//! failure aborts the run; nothing is retried.

mod error;

use std::fmt;
use std::path::{Path, PathBuf};

use crate::config::IngestionConfig;
use crate::logging::{IngestionLog, TracingLog};
use crate::provider::{DatasetProvider, DatasetReference};
use crate::split::{SplitOptions, train_test_split};
use crate::table::Table;

pub use error::{AcquisitionError, IngestionError, IngestionPhase, PersistError};

/// Which side of the split a table belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Partition {
    Train,
    Test,
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Train => "train",
            Self::Test => "test",
        })
    }
}

/// Result of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestionOutput {
    pub train_data_path: PathBuf,
    pub test_data_path: PathBuf,
    /// Whether the raw file was fetched from the provider during this run.
    pub downloaded: bool,
    pub raw_rows: usize,
    pub duplicates_removed: usize,
    pub train_rows: usize,
    pub test_rows: usize,
}

impl IngestionOutput {
    /// `(train, test)` output paths.
    pub fn paths(&self) -> (&Path, &Path) {
        (&self.train_data_path, &self.test_data_path)
    }
}

/// Runs ingestion for one [`IngestionConfig`].
pub struct DataIngestion<P, L = TracingLog> {
    config: IngestionConfig,
    split: SplitOptions,
    provider: P,
    log: L,
}

impl<P: DatasetProvider> DataIngestion<P> {
    /// Ingestion logging through `tracing`, with the default 80/20 split.
    pub fn new(config: IngestionConfig, provider: P) -> Self {
        Self::with_log(config, provider, TracingLog)
    }
}

impl<P: DatasetProvider, L: IngestionLog> DataIngestion<P, L> {
    pub fn with_log(config: IngestionConfig, provider: P, log: L) -> Self {
        Self {
            config,
            split: SplitOptions::default(),
            provider,
            log,
        }
    }

    pub fn split_options(mut self, split: SplitOptions) -> Self {
        self.split = split;
        self
    }

    pub fn config(&self) -> &IngestionConfig {
        &self.config
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn log(&self) -> &L {
        &self.log
    }

    /// Execute the pipeline and return where the partitions were written.
    pub fn run(&self) -> Result<IngestionOutput, IngestionError> {
        self.log.info("Starting the data ingestion process.");
        let downloaded = self.acquire()?;

        let raw_path = &self.config.raw_data_path;
        let mut table = Table::read_csv(raw_path).map_err(|source| IngestionError::Load {
            path: raw_path.clone(),
            source,
        })?;
        let raw_rows = table.len();
        self.log.info(&format!(
            "Raw dataset loaded: {raw_rows} rows, {} columns.",
            table.headers().len()
        ));

        let duplicates_removed = table.drop_duplicates();
        self.log.info(&format!(
            "Dropped {duplicates_removed} duplicate rows; {} remain.",
            table.len()
        ));

        let (train, test) = train_test_split(&table, self.split)?;
        drop(table);
        self.log.info(&format!(
            "Split into {} train and {} test rows (seed {}).",
            train.len(),
            test.len(),
            self.split.seed
        ));

        self.prepare_output_dirs()?;
        self.persist(Partition::Train, &train, &self.config.train_data_path)?;
        self.persist(Partition::Test, &test, &self.config.test_data_path)?;
        self.log.info("Data ingestion completed successfully.");

        Ok(IngestionOutput {
            train_data_path: self.config.train_data_path.clone(),
            test_data_path: self.config.test_data_path.clone(),
            downloaded,
            raw_rows,
            duplicates_removed,
            train_rows: train.len(),
            test_rows: test.len(),
        })
    }

    /// Fetch the raw dataset unless it is already present. Returns whether a
    /// download happened.
    fn acquire(&self) -> Result<bool, AcquisitionError> {
        let raw_path = &self.config.raw_data_path;
        if raw_path.exists() {
            self.log.info(&format!(
                "Raw data already exists at {}. Skipping download.",
                raw_path.display()
            ));
            return Ok(false);
        }

        let dataset = DatasetReference::parse(&self.config.dataset_reference)
            .map_err(AcquisitionError::InvalidReference)?;
        let raw_dir = parent_dir(raw_path);
        std::fs::create_dir_all(raw_dir).map_err(|source| AcquisitionError::CreateDir {
            path: raw_dir.to_path_buf(),
            source,
        })?;

        self.log.info(&format!(
            "Raw data not found. Downloading {dataset} into {}...",
            raw_dir.display()
        ));
        let extracted =
            self.provider
                .fetch(&dataset, raw_dir)
                .map_err(|source| AcquisitionError::Provider {
                    dataset: dataset.to_string(),
                    source,
                })?;
        if !raw_path.is_file() {
            return Err(AcquisitionError::MissingRawFile {
                dataset: dataset.to_string(),
                path: raw_path.clone(),
                extracted: describe_files(&extracted),
            });
        }
        self.log.info(&format!(
            "Dataset downloaded to {} ({} files).",
            raw_dir.display(),
            extracted.len()
        ));
        Ok(true)
    }

    fn prepare_output_dirs(&self) -> Result<(), PersistError> {
        for path in [&self.config.train_data_path, &self.config.test_data_path] {
            let dir = parent_dir(path);
            std::fs::create_dir_all(dir).map_err(|source| PersistError::CreateDir {
                path: dir.to_path_buf(),
                source,
            })?;
        }
        Ok(())
    }

    fn persist(
        &self,
        partition: Partition,
        table: &Table,
        path: &Path,
    ) -> Result<(), PersistError> {
        table.write_csv(path).map_err(|source| PersistError::Write {
            partition,
            path: path.to_path_buf(),
            source,
        })?;
        self.log.info(&format!(
            "Wrote {} rows to {partition} file {}.",
            table.len(),
            path.display()
        ));
        Ok(())
    }
}

/// Directory containing `path`; `.` for bare file names.
fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

fn describe_files(files: &[PathBuf]) -> String {
    if files.is_empty() {
        return "nothing".to_string();
    }
    files
        .iter()
        .filter_map(|path| path.file_name())
        .map(|name| name.to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join(", ")
}
