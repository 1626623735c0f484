//! In-memory CSV tables: loading, exact-duplicate removal, and writing.
//!
//! Cells are kept as the raw text the reader produced, so two rows are
//! duplicates only when every cell matches byte for byte.

use std::collections::HashSet;
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors raised while reading or writing a table.
#[derive(Debug, Error)]
pub enum TableError {
    #[error("Failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to create {path}: {source}")]
    Create {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Malformed CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("Failed to flush CSV output: {0}")]
    Flush(#[from] std::io::Error),
    #[error("CSV input has no header row")]
    MissingHeader,
    #[error("Row {index} has {found} cells, expected {expected}")]
    RaggedRow {
        index: usize,
        found: usize,
        expected: usize,
    },
}

/// A header plus rows of string cells, all rows as wide as the header.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    /// Build a table, rejecting rows whose width differs from the header.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self, TableError> {
        if let Some((index, row)) = rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != headers.len())
        {
            return Err(TableError::RaggedRow {
                index,
                found: row.len(),
                expected: headers.len(),
            });
        }
        Ok(Self { headers, rows })
    }

    /// Read a comma-delimited file whose first record is the header row.
    pub fn read_csv(path: &Path) -> Result<Self, TableError> {
        let file = File::open(path).map_err(|source| TableError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_reader(file)
    }

    /// Parse CSV from any reader. Ragged records and invalid UTF-8 are errors.
    pub fn from_reader(reader: impl Read) -> Result<Self, TableError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(reader);
        let headers: Vec<String> = reader.headers()?.iter().map(str::to_owned).collect();
        if headers.is_empty() || headers.iter().all(String::is_empty) {
            return Err(TableError::MissingHeader);
        }
        let mut rows = Vec::new();
        for record in reader.records() {
            rows.push(record?.iter().map(str::to_owned).collect());
        }
        Ok(Self { headers, rows })
    }

    /// Write the header and all rows as comma-delimited CSV, replacing `path`.
    pub fn write_csv(&self, path: &Path) -> Result<(), TableError> {
        let file = File::create(path).map_err(|source| TableError::Create {
            path: path.to_path_buf(),
            source,
        })?;
        self.to_writer(file)
    }

    pub fn to_writer(&self, writer: impl Write) -> Result<(), TableError> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(writer);
        writer.write_record(&self.headers)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Drop rows equal in every column to an earlier row, keeping the first
    /// occurrence and the original order. Returns how many rows were removed.
    pub fn drop_duplicates(&mut self) -> usize {
        let before = self.rows.len();
        let mut seen: HashSet<Vec<String>> = HashSet::with_capacity(before);
        self.rows.retain(|row| seen.insert(row.clone()));
        before - self.rows.len()
    }

    /// New table with the same header and the rows at `indices`, in that order.
    pub fn select(&self, indices: &[usize]) -> Self {
        Self {
            headers: self.headers.clone(),
            rows: indices
                .iter()
                .filter_map(|&idx| self.rows.get(idx).cloned())
                .collect(),
        }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn table(rows: &[&[&str]]) -> Table {
        let headers = vec!["id".to_string(), "geo".to_string(), "exited".to_string()];
        let rows = rows
            .iter()
            .map(|row| row.iter().map(|cell| cell.to_string()).collect())
            .collect();
        Table::new(headers, rows).unwrap()
    }

    #[test]
    fn new_rejects_ragged_rows() {
        let err = Table::new(vec!["a".into()], vec![vec!["1".into(), "2".into()]]).unwrap_err();
        assert!(matches!(
            err,
            TableError::RaggedRow {
                index: 0,
                found: 2,
                expected: 1
            }
        ));
    }

    #[test]
    fn drop_duplicates_keeps_first_occurrence_in_order() {
        let mut t = table(&[
            &["1", "France", "0"],
            &["2", "Spain", "1"],
            &["1", "France", "0"],
            &["3", "France", "0"],
            &["2", "Spain", "1"],
            &["2", "Spain", "0"],
        ]);
        assert_eq!(t.drop_duplicates(), 2);
        assert_eq!(
            t,
            table(&[
                &["1", "France", "0"],
                &["2", "Spain", "1"],
                &["3", "France", "0"],
                &["2", "Spain", "0"],
            ])
        );
        assert_eq!(t.drop_duplicates(), 0);
    }

    #[test]
    fn from_reader_rejects_ragged_records() {
        let err = Table::from_reader("a,b\n1,2\n3\n".as_bytes()).unwrap_err();
        assert!(matches!(err, TableError::Csv(_)));
    }

    #[test]
    fn from_reader_rejects_empty_input() {
        let err = Table::from_reader("".as_bytes()).unwrap_err();
        assert!(matches!(err, TableError::MissingHeader));
    }

    #[test]
    fn read_csv_reports_missing_file() {
        let dir = tempdir().unwrap();
        let err = Table::read_csv(&dir.path().join("missing.csv")).unwrap_err();
        assert!(matches!(err, TableError::Open { .. }));
    }

    #[test]
    fn written_csv_reads_back_identically() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let t = table(&[&["1", "Côte, d'Ivoire", "0"], &["2", "say \"hi\"", "1"]]);
        t.write_csv(&path).unwrap();
        assert_eq!(Table::read_csv(&path).unwrap(), t);
    }

    #[test]
    fn write_csv_emits_header_without_index_column() {
        let mut out = Vec::new();
        table(&[&["7", "Germany", "1"]]).to_writer(&mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "id,geo,exited\n7,Germany,1\n");
    }

    #[test]
    fn select_preserves_requested_order() {
        let t = table(&[&["1", "a", "0"], &["2", "b", "0"], &["3", "c", "1"]]);
        let picked = t.select(&[2, 0]);
        assert_eq!(picked, table(&[&["3", "c", "1"], &["1", "a", "0"]]));
    }
}
