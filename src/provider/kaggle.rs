//! Kaggle dataset downloads over the public REST API.

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use url::Url;

use crate::{archive, http_client};

use super::{Credentials, DatasetProvider, DatasetReference, ProviderError};

pub const DEFAULT_API_BASE: &str = "https://www.kaggle.com/api/v1";
const MAX_ARCHIVE_BYTES: u64 = 2 * 1024 * 1024 * 1024;
const MAX_ERROR_BODY_BYTES: usize = 16 * 1024;

/// Downloads `<owner>/<dataset>` as a zip and unpacks it in place.
///
/// Without explicit credentials, they are resolved from the environment on
/// each fetch, so a run that never downloads never needs them.
#[derive(Debug, Clone)]
pub struct KaggleProvider {
    api_base: Url,
    credentials: Option<Credentials>,
}

impl KaggleProvider {
    pub fn new(api_base: &str) -> Result<Self, ProviderError> {
        let mut api_base = Url::parse(api_base)?;
        if !api_base.path().ends_with('/') {
            let path = format!("{}/", api_base.path());
            api_base.set_path(&path);
        }
        Ok(Self {
            api_base,
            credentials: None,
        })
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    fn credentials(&self) -> Result<Cow<'_, Credentials>, ProviderError> {
        match &self.credentials {
            Some(credentials) => Ok(Cow::Borrowed(credentials)),
            None => Ok(Cow::Owned(Credentials::from_environment()?)),
        }
    }

    pub fn download_url(&self, dataset: &DatasetReference) -> Result<Url, ProviderError> {
        Ok(self.api_base.join(&format!(
            "datasets/download/{}/{}",
            dataset.owner(),
            dataset.name()
        ))?)
    }

    fn download_archive(
        &self,
        url: &Url,
        archive_file: &mut std::fs::File,
    ) -> Result<u64, ProviderError> {
        let authorization = self.credentials()?.basic_auth_header();
        let response = http_client::agent()
            .get(url.as_str())
            .set("Authorization", &authorization)
            .call()
            .map_err(|err| match err {
                ureq::Error::Status(status, response) => ProviderError::Status {
                    status,
                    url: url.to_string(),
                    message: error_message(response),
                },
                ureq::Error::Transport(transport) => ProviderError::Http(transport.to_string()),
            })?;
        Ok(http_client::copy_response_to_writer(
            response,
            archive_file,
            MAX_ARCHIVE_BYTES,
        )?)
    }
}

impl DatasetProvider for KaggleProvider {
    fn fetch(
        &self,
        dataset: &DatasetReference,
        dest_dir: &Path,
    ) -> Result<Vec<PathBuf>, ProviderError> {
        let url = self.download_url(dataset)?;
        tracing::debug!("Downloading {dataset} from {url}");
        // Deleted on drop, including on every early return below.
        let mut archive_file = tempfile::Builder::new()
            .prefix(".download-")
            .suffix(".zip")
            .tempfile_in(dest_dir)?;
        let bytes = self.download_archive(&url, archive_file.as_file_mut())?;
        tracing::debug!("Downloaded {bytes} bytes for {dataset}");
        let files = archive::unzip_into_place(archive_file.path(), dest_dir)?;
        archive_file.close()?;
        Ok(files)
    }
}

fn error_message(response: ureq::Response) -> String {
    let status_text = response.status_text().to_string();
    let body = http_client::read_response_bytes(response, MAX_ERROR_BODY_BYTES)
        .ok()
        .map(|bytes| String::from_utf8_lossy(&bytes).trim().to_string())
        .filter(|body| !body.is_empty());
    match body {
        Some(body) => format!("{status_text}: {body}"),
        None => status_text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::tests::zip_bytes;
    use crate::http_client::tests::serve_once;
    use tempfile::tempdir;

    fn reference() -> DatasetReference {
        DatasetReference::parse("shrutimechlearn/churn-modelling").unwrap()
    }

    fn zip_response(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let body = zip_bytes(entries);
        let mut response = format!(
            "HTTP/1.1 200 OK\r\nContent-Type: application/zip\r\nContent-Length: {}\r\n\r\n",
            body.len()
        )
        .into_bytes();
        response.extend_from_slice(&body);
        response
    }

    #[test]
    fn download_url_appends_dataset_path() {
        let provider = KaggleProvider::new(DEFAULT_API_BASE).unwrap();
        assert_eq!(
            provider.download_url(&reference()).unwrap().as_str(),
            "https://www.kaggle.com/api/v1/datasets/download/shrutimechlearn/churn-modelling"
        );
    }

    #[test]
    fn fetch_extracts_archive_and_removes_download() {
        let base = serve_once(zip_response(&[("Churn_Modelling.csv", b"a,b\n1,2\n")]));
        let provider = KaggleProvider::new(&base)
            .unwrap()
            .with_credentials(Credentials::new("u", "k"));
        let dest = tempdir().unwrap();

        let files = provider.fetch(&reference(), dest.path()).unwrap();

        assert_eq!(files, vec![dest.path().join("Churn_Modelling.csv")]);
        assert_eq!(
            std::fs::read_to_string(dest.path().join("Churn_Modelling.csv")).unwrap(),
            "a,b\n1,2\n"
        );
        let leftovers: Vec<_> = std::fs::read_dir(dest.path())
            .unwrap()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_name().to_string_lossy().ends_with(".zip"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn fetch_reports_http_status_with_body() {
        let body = r#"{"message":"Unauthorized"}"#;
        let base = serve_once(
            format!(
                "HTTP/1.1 401 Unauthorized\r\nContent-Length: {}\r\n\r\n{}",
                body.len(),
                body
            )
            .into_bytes(),
        );
        let provider = KaggleProvider::new(&base)
            .unwrap()
            .with_credentials(Credentials::new("u", "bad"));
        let dest = tempdir().unwrap();

        let err = provider.fetch(&reference(), dest.path()).unwrap_err();

        match err {
            ProviderError::Status {
                status, message, ..
            } => {
                assert_eq!(status, 401);
                assert!(message.contains("Unauthorized"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn fetch_rejects_non_zip_payload() {
        let base = serve_once(b"HTTP/1.1 200 OK\r\nContent-Length: 4\r\n\r\nnope".to_vec());
        let provider = KaggleProvider::new(&base)
            .unwrap()
            .with_credentials(Credentials::new("u", "k"));
        let dest = tempdir().unwrap();
        let err = provider.fetch(&reference(), dest.path()).unwrap_err();
        assert!(matches!(err, ProviderError::Archive(_)));
    }
}
