//! Churn dataset ingestion: download, deduplicate, and split into train/test CSVs.
/// Application directory resolution (logs).
pub mod app_dirs;
/// Bounded zip extraction.
pub mod archive;
/// Ingestion paths and the optional settings file.
pub mod config;
mod http_client;
/// The ingestion pipeline.
pub mod ingestion;
/// Tracing setup and the pipeline log capability.
pub mod logging;
/// Remote dataset providers.
pub mod provider;
/// Seeded train/test partitioning.
pub mod split;
/// CSV tables and deduplication.
pub mod table;

pub use config::IngestionConfig;
pub use ingestion::{DataIngestion, IngestionError, IngestionOutput};
