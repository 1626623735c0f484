use std::cell::Cell;
use std::path::{Path, PathBuf};

use churnpipe::provider::{DatasetProvider, DatasetReference, ProviderError};

/// Writes a fixed CSV into the destination and counts how often it was asked to.
pub struct CountingProvider {
    file_name: String,
    contents: String,
    calls: Cell<usize>,
}

impl CountingProvider {
    pub fn new(file_name: &str, contents: String) -> Self {
        Self {
            file_name: file_name.to_string(),
            contents,
            calls: Cell::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.get()
    }
}

impl DatasetProvider for CountingProvider {
    fn fetch(
        &self,
        _dataset: &DatasetReference,
        dest_dir: &Path,
    ) -> Result<Vec<PathBuf>, ProviderError> {
        self.calls.set(self.calls.get() + 1);
        let path = dest_dir.join(&self.file_name);
        std::fs::write(&path, &self.contents)?;
        Ok(vec![path])
    }
}
