//! Word-embedding lookup.
//!
//! The table is loaded once per process and shared read-only by every bag.
//! Tokens missing from the table are reported as `None`, never as an error.

pub mod word2vec;

pub use word2vec::{EmbeddingError, EmbeddingFormat, Word2VecTable};

/// Read-only lookup from normalized token to a fixed-size vector.
pub trait EmbeddingTable {
    /// Length of every vector returned by [`EmbeddingTable::embed`].
    fn dimensions(&self) -> usize;

    /// Vector for `token`, or `None` if the token is unknown.
    fn embed(&self, token: &str) -> Option<&[f32]>;
}
