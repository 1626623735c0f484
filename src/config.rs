//! Pipeline configuration: the fixed ingestion paths and the optional TOML
//! settings file they can be derived from.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::provider::{DatasetReference, kaggle::DEFAULT_API_BASE};
use crate::split::{DEFAULT_SEED, DEFAULT_TEST_FRACTION, SplitOptions};

/// Settings file picked up from the working directory when no path is given.
pub const SETTINGS_FILE_NAME: &str = "churnpipe.toml";
pub const DEFAULT_DATA_ROOT: &str = "data";
pub const RAW_DIR_NAME: &str = "01_Raw";
pub const INTERMEDIATE_DIR_NAME: &str = "02_Intermediate";
pub const DEFAULT_RAW_FILE_NAME: &str = "Churn_Modelling.csv";
pub const DEFAULT_DATASET_REFERENCE: &str = "shrutimechlearn/churn-modelling";
pub const TRAIN_FILE_NAME: &str = "train.csv";
pub const TEST_FILE_NAME: &str = "test.csv";

/// Where ingestion reads and writes, plus the remote dataset it pulls from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestionConfig {
    pub raw_data_path: PathBuf,
    pub train_data_path: PathBuf,
    pub test_data_path: PathBuf,
    /// Provider reference in `<owner>/<dataset-name>` form.
    pub dataset_reference: String,
}

impl IngestionConfig {
    /// Standard `01_Raw` / `02_Intermediate` layout under `data_root`.
    pub fn for_data_root(
        data_root: &Path,
        raw_file_name: &str,
        dataset_reference: impl Into<String>,
    ) -> Self {
        let intermediate = data_root.join(INTERMEDIATE_DIR_NAME);
        Self {
            raw_data_path: data_root.join(RAW_DIR_NAME).join(raw_file_name),
            train_data_path: intermediate.join(TRAIN_FILE_NAME),
            test_data_path: intermediate.join(TEST_FILE_NAME),
            dataset_reference: dataset_reference.into(),
        }
    }
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self::for_data_root(
            Path::new(DEFAULT_DATA_ROOT),
            DEFAULT_RAW_FILE_NAME,
            DEFAULT_DATASET_REFERENCE,
        )
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read settings {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse settings {path}: {source}")]
    ParseToml {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("Invalid setting `{key}`: {message}")]
    Invalid { key: &'static str, message: String },
}

/// Contents of `churnpipe.toml`. Every key is optional.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineSettings {
    pub data_root: PathBuf,
    pub raw_file_name: String,
    pub dataset_reference: String,
    pub test_fraction: f64,
    pub seed: u64,
    pub kaggle: KaggleSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct KaggleSettings {
    pub api_base: String,
}

impl Default for KaggleSettings {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            data_root: PathBuf::from(DEFAULT_DATA_ROOT),
            raw_file_name: DEFAULT_RAW_FILE_NAME.to_string(),
            dataset_reference: DEFAULT_DATASET_REFERENCE.to_string(),
            test_fraction: DEFAULT_TEST_FRACTION,
            seed: DEFAULT_SEED,
            kaggle: KaggleSettings::default(),
        }
    }
}

impl PipelineSettings {
    pub fn ingestion_config(&self) -> IngestionConfig {
        IngestionConfig::for_data_root(
            &self.data_root,
            &self.raw_file_name,
            self.dataset_reference.clone(),
        )
    }

    pub fn split_options(&self) -> SplitOptions {
        SplitOptions {
            test_fraction: self.test_fraction,
            seed: self.seed,
        }
    }

    fn validate(self) -> Result<Self, ConfigError> {
        self.split_options()
            .validate()
            .map_err(|err| ConfigError::Invalid {
                key: "test_fraction",
                message: err.to_string(),
            })?;
        DatasetReference::parse(&self.dataset_reference).map_err(|err| ConfigError::Invalid {
            key: "dataset_reference",
            message: err.to_string(),
        })?;
        let raw_name = Path::new(&self.raw_file_name);
        if raw_name.file_name() != Some(raw_name.as_os_str()) {
            return Err(ConfigError::Invalid {
                key: "raw_file_name",
                message: format!("`{}` must be a bare file name", self.raw_file_name),
            });
        }
        url::Url::parse(&self.kaggle.api_base).map_err(|err| ConfigError::Invalid {
            key: "kaggle.api_base",
            message: err.to_string(),
        })?;
        Ok(self)
    }
}

/// Parse and validate settings from TOML text.
pub fn parse_settings(text: &str, path: &Path) -> Result<PipelineSettings, ConfigError> {
    let settings: PipelineSettings =
        toml::from_str(text).map_err(|source| ConfigError::ParseToml {
            path: path.to_path_buf(),
            source,
        })?;
    settings.validate()
}

/// Load settings from `path`.
pub fn load_settings(path: &Path) -> Result<PipelineSettings, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_settings(&text, path)
}

/// Load `explicit` if given, else `churnpipe.toml` in `cwd` when present, else defaults.
pub fn resolve_settings(
    explicit: Option<&Path>,
    cwd: &Path,
) -> Result<PipelineSettings, ConfigError> {
    if let Some(path) = explicit {
        return load_settings(path);
    }
    let candidate = cwd.join(SETTINGS_FILE_NAME);
    if candidate.is_file() {
        return load_settings(&candidate);
    }
    Ok(PipelineSettings::default())
}
