//! Seeded train/test partitioning.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use thiserror::Error;

use crate::table::Table;

/// Default share of rows assigned to the test partition.
pub const DEFAULT_TEST_FRACTION: f64 = 0.2;
/// Default shuffle seed, kept fixed so reruns reproduce the same partitions.
pub const DEFAULT_SEED: u64 = 42;

#[derive(Debug, Error, PartialEq)]
pub enum SplitError {
    #[error("invalid test fraction {0} (expected 0 < fraction < 1)")]
    InvalidFraction(f64),
    #[error("cannot split {rows} rows into {train} train and {test} test rows")]
    EmptyPartition {
        rows: usize,
        train: usize,
        test: usize,
    },
}

/// Parameters for [`train_test_split`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitOptions {
    pub test_fraction: f64,
    pub seed: u64,
}

impl Default for SplitOptions {
    fn default() -> Self {
        Self {
            test_fraction: DEFAULT_TEST_FRACTION,
            seed: DEFAULT_SEED,
        }
    }
}

impl SplitOptions {
    pub fn validate(&self) -> Result<(), SplitError> {
        if !(self.test_fraction > 0.0 && self.test_fraction < 1.0) {
            return Err(SplitError::InvalidFraction(self.test_fraction));
        }
        Ok(())
    }

    /// Train/test row counts for a table of `rows` rows.
    ///
    /// Train gets `round((1 - test_fraction) * rows)`, test the remainder.
    /// Either side coming out empty is an error rather than a degenerate
    /// split, so at the default fraction a table needs at least 3 rows; two
    /// rows yield `EmptyPartition` instead of a 1/1 split.
    pub fn partition_sizes(&self, rows: usize) -> Result<(usize, usize), SplitError> {
        self.validate()?;
        let train = (((1.0 - self.test_fraction) * rows as f64).round() as usize).min(rows);
        let test = rows - train;
        if train == 0 || test == 0 {
            return Err(SplitError::EmptyPartition { rows, train, test });
        }
        Ok((train, test))
    }
}

/// Shuffled row indices for each partition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitIndices {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Shuffle `0..rows` with a seeded RNG and cut it into train and test indices.
pub fn split_indices(rows: usize, options: SplitOptions) -> Result<SplitIndices, SplitError> {
    let (train_len, _) = options.partition_sizes(rows)?;
    let mut rng = StdRng::seed_from_u64(options.seed);
    let mut indices: Vec<usize> = (0..rows).collect();
    indices.shuffle(&mut rng);
    let test = indices.split_off(train_len);
    Ok(SplitIndices {
        train: indices,
        test,
    })
}

/// Partition `table` into `(train, test)` tables.
pub fn train_test_split(
    table: &Table,
    options: SplitOptions,
) -> Result<(Table, Table), SplitError> {
    let indices = split_indices(table.len(), options)?;
    Ok((table.select(&indices.train), table.select(&indices.test)))
}
