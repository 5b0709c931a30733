//! Loader for pretrained word2vec tables (binary and text formats).

use crate::embedding::EmbeddingTable;
use byteorder::{LittleEndian, ReadBytesExt};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use thiserror::Error;

/// Largest vector length accepted from a binary header.
const MAX_DIMENSIONS: usize = 1 << 16;

/// Entries reserved up front when reading a binary table.
const PRESIZE_WORDS: usize = 1 << 12;

/// On-disk layout of an embedding file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddingFormat {
    /// `"<vocab> <dim>\n"` header, then `<word> ` followed by `dim` little-endian f32.
    #[default]
    Binary,
    /// One `<word> <v1> <v2> ...` line per entry, with an optional count header.
    Text,
}

impl EmbeddingFormat {
    /// Guess the format from a file extension (`.txt`/`.vec` are text).
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("txt") | Some("vec") => EmbeddingFormat::Text,
            _ => EmbeddingFormat::Binary,
        }
    }
}

/// Errors while loading an embedding table.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid header: {0:?}")]
    InvalidHeader(String),
    #[error("entry {entry}: expected {expected} values, found {found}")]
    DimensionMismatch {
        entry: usize,
        expected: usize,
        found: usize,
    },
    #[error("entry {entry}: invalid value {value:?}")]
    InvalidValue { entry: usize, value: String },
    #[error("file ended after {read} of {expected} entries")]
    Truncated { expected: usize, read: usize },
    #[error("embedding table has zero dimensions")]
    ZeroDimensions,
}

/// An in-memory word2vec table.
#[derive(Debug, Clone)]
pub struct Word2VecTable {
    dimensions: usize,
    index: HashMap<String, usize>,
    values: Vec<f32>,
}

impl Word2VecTable {
    /// Create an empty table of the given dimensionality.
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions,
            index: HashMap::new(),
            values: Vec::new(),
        }
    }

    /// Build a table from `(word, vector)` pairs.
    pub fn from_entries<I, S>(dimensions: usize, entries: I) -> Result<Self, EmbeddingError>
    where
        I: IntoIterator<Item = (S, Vec<f32>)>,
        S: Into<String>,
    {
        if dimensions == 0 {
            return Err(EmbeddingError::ZeroDimensions);
        }
        let mut table = Self::new(dimensions);
        for (entry, (word, vector)) in entries.into_iter().enumerate() {
            if vector.len() != dimensions {
                return Err(EmbeddingError::DimensionMismatch {
                    entry,
                    expected: dimensions,
                    found: vector.len(),
                });
            }
            table.insert(word.into(), &vector);
        }
        Ok(table)
    }

    /// Load a table from disk.
    pub fn load(path: &Path, format: EmbeddingFormat) -> Result<Self, EmbeddingError> {
        let reader = BufReader::new(File::open(path)?);
        let table = match format {
            EmbeddingFormat::Binary => Self::read_binary(reader)?,
            EmbeddingFormat::Text => Self::read_text(reader)?,
        };
        tracing::info!(
            words = table.len(),
            dimensions = table.dimensions,
            "Loaded embedding table from {:?}",
            path
        );
        Ok(table)
    }

    /// Parse the word2vec binary format.
    pub fn read_binary<R: BufRead>(mut reader: R) -> Result<Self, EmbeddingError> {
        let mut header = String::new();
        reader.read_line(&mut header)?;
        let (count, dimensions) = parse_header(&header)
            .ok_or_else(|| EmbeddingError::InvalidHeader(header.trim().to_string()))?;
        if dimensions == 0 {
            return Err(EmbeddingError::ZeroDimensions);
        }
        let total = count.checked_mul(dimensions);
        if dimensions > MAX_DIMENSIONS || total.is_none() {
            return Err(EmbeddingError::InvalidHeader(header.trim().to_string()));
        }

        // the count is only a hint until entries are read
        let presize = count.min(PRESIZE_WORDS);
        let mut table = Self::new(dimensions);
        table.index.reserve(presize);
        table.values.reserve(presize * dimensions);
        let mut vector = vec![0f32; dimensions];

        for read in 0..count {
            let word = match read_word(&mut reader)? {
                Some(word) => word,
                None => {
                    return Err(EmbeddingError::Truncated {
                        expected: count,
                        read,
                    })
                }
            };
            reader
                .read_f32_into::<LittleEndian>(&mut vector)
                .map_err(|e| match e.kind() {
                    std::io::ErrorKind::UnexpectedEof => EmbeddingError::Truncated {
                        expected: count,
                        read,
                    },
                    _ => EmbeddingError::Io(e),
                })?;
            table.insert(word, &vector);
        }

        Ok(table)
    }

    /// Parse the word2vec text format.
    pub fn read_text<R: BufRead>(reader: R) -> Result<Self, EmbeddingError> {
        let mut table: Option<Self> = None;

        for (entry, line) in reader.lines().enumerate() {
            let line = line?;
            let mut fields = line.split_whitespace();
            let Some(word) = fields.next() else {
                continue;
            };
            let values: Vec<&str> = fields.collect();

            if entry == 0 && values.len() == 1 && parse_header(&line).is_some() {
                continue;
            }

            let vector = values
                .iter()
                .map(|v| {
                    v.parse::<f32>().map_err(|_| EmbeddingError::InvalidValue {
                        entry,
                        value: v.to_string(),
                    })
                })
                .collect::<Result<Vec<f32>, _>>()?;

            if table.is_none() && vector.is_empty() {
                return Err(EmbeddingError::ZeroDimensions);
            }
            let table = table.get_or_insert_with(|| Self::new(vector.len()));
            if vector.len() != table.dimensions {
                return Err(EmbeddingError::DimensionMismatch {
                    entry,
                    expected: table.dimensions,
                    found: vector.len(),
                });
            }
            table.insert(word.to_string(), &vector);
        }

        table.ok_or(EmbeddingError::ZeroDimensions)
    }

    /// Number of words in the table.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    fn insert(&mut self, word: String, vector: &[f32]) {
        match self.index.get(&word) {
            Some(&row) => {
                let start = row * self.dimensions;
                self.values[start..start + self.dimensions].copy_from_slice(vector);
            }
            None => {
                self.index.insert(word, self.index.len());
                self.values.extend_from_slice(vector);
            }
        }
    }
}

impl EmbeddingTable for Word2VecTable {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn embed(&self, token: &str) -> Option<&[f32]> {
        let row = *self.index.get(token)?;
        let start = row * self.dimensions;
        Some(&self.values[start..start + self.dimensions])
    }
}

fn parse_header(line: &str) -> Option<(usize, usize)> {
    let mut parts = line.split_whitespace();
    let count = parts.next()?.parse().ok()?;
    let dimensions = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some((count, dimensions))
}

/// Read one space-terminated word, skipping the newline some writers emit
/// between entries. Returns `None` at end of input.
fn read_word<R: Read>(reader: &mut R) -> Result<Option<String>, EmbeddingError> {
    let mut bytes = Vec::new();
    loop {
        let byte = match reader.read_u8() {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                if bytes.is_empty() {
                    return Ok(None);
                }
                break;
            }
            Err(e) => return Err(e.into()),
        };
        match byte {
            b' ' => break,
            b'\n' | b'\r' if bytes.is_empty() => continue,
            _ => bytes.push(byte),
        }
    }
    Ok(Some(String::from_utf8_lossy(&bytes).into_owned()))
}
