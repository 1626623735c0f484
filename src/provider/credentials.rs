use std::fmt;
use std::path::{Path, PathBuf};

use base64::Engine;
use directories::BaseDirs;
use serde::Deserialize;
use thiserror::Error;

const USERNAME_ENV: &str = "KAGGLE_USERNAME";
const KEY_ENV: &str = "KAGGLE_KEY";
const CONFIG_DIR_ENV: &str = "KAGGLE_CONFIG_DIR";
const CREDENTIALS_FILE_NAME: &str = "kaggle.json";

#[derive(Debug, Error)]
pub enum CredentialsError {
    #[error("set KAGGLE_USERNAME and KAGGLE_KEY, or provide {0}")]
    NotFound(PathBuf),
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// API username and key for HTTP basic auth.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub key: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("key", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    pub fn new(username: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            key: key.into(),
        }
    }

    /// Resolve credentials from the process environment or `kaggle.json`.
    pub fn from_environment() -> Result<Self, CredentialsError> {
        let home = BaseDirs::new().map(|dirs| dirs.home_dir().to_path_buf());
        Self::resolve(|name| std::env::var(name).ok(), home.as_deref())
    }

    /// `KAGGLE_USERNAME`/`KAGGLE_KEY` win; otherwise read `kaggle.json` from
    /// `KAGGLE_CONFIG_DIR` or `<home>/.kaggle`.
    pub(crate) fn resolve(
        env: impl Fn(&str) -> Option<String>,
        home: Option<&Path>,
    ) -> Result<Self, CredentialsError> {
        let non_empty = |name: &str| env(name).filter(|value| !value.trim().is_empty());
        if let (Some(username), Some(key)) = (non_empty(USERNAME_ENV), non_empty(KEY_ENV)) {
            return Ok(Self::new(username, key));
        }
        let config_dir = match non_empty(CONFIG_DIR_ENV) {
            Some(dir) => PathBuf::from(dir),
            None => home
                .map(|home| home.join(".kaggle"))
                .unwrap_or_else(|| PathBuf::from(".kaggle")),
        };
        Self::load_file(&config_dir.join(CREDENTIALS_FILE_NAME))
    }

    fn load_file(path: &Path) -> Result<Self, CredentialsError> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(CredentialsError::NotFound(path.to_path_buf()));
            }
            Err(source) => {
                return Err(CredentialsError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        serde_json::from_str(&text).map_err(|source| CredentialsError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Value for an `Authorization` header.
    pub fn basic_auth_header(&self) -> String {
        let token = base64::engine::general_purpose::STANDARD
            .encode(format!("{}:{}", self.username, self.key));
        format!("Basic {token}")
    }
}
