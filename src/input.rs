//! Shared plumbing for the comma-separated input logs.
//!
//! Both the window-title log and the ground-truth log are row-oriented text
//! files with a header line. Rows that fail to parse are skipped and reported
//! so a run never continues on silently corrupted records.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// A single input row that could not be parsed.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("line {line}: {reason}")]
pub struct RowError {
    /// 1-based line number in the source file (the header is line 1)
    pub line: usize,
    /// Human-readable description of the problem
    pub reason: String,
}

impl RowError {
    pub fn new(line: usize, reason: impl Into<String>) -> Self {
        Self {
            line,
            reason: reason.into(),
        }
    }
}

/// Records parsed from an input file, together with the rows that were skipped.
#[derive(Debug, Clone)]
pub struct Loaded<T> {
    pub records: Vec<T>,
    pub skipped: Vec<RowError>,
}

impl<T> Loaded<T> {
    /// Whether every data row parsed cleanly.
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty()
    }
}

/// Failure to read an input file at all.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Read a file as text, replacing invalid UTF-8 sequences instead of failing.
pub fn read_lossy(path: &Path) -> Result<String, LoadError> {
    let bytes = std::fs::read(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Iterate over the data rows of a log, skipping the header and blank lines.
///
/// Yields `(line_number, row)` with 1-based line numbers.
pub fn data_rows(text: &str) -> impl Iterator<Item = (usize, &str)> {
    text.lines()
        .enumerate()
        .skip(1)
        .map(|(i, line)| (i + 1, line.trim_end_matches('\r')))
        .filter(|(_, line)| !line.trim().is_empty())
}
