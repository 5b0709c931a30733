//! Text cleaning for window titles.
//!
//! The core only depends on the [`TextCleaner`] trait. [`TitleCleaner`] is the
//! pipeline used by the command-line tool: tokenize, drop stop words and
//! denylisted tokens, drop numbers, keep dictionary words, stem.

pub mod cleaner;
pub mod stopwords;

pub use cleaner::{CleanError, Dictionary, TitleCleaner, DEFAULT_DENYLIST, TOKEN_SEPARATORS};
pub use stopwords::{StopWords, ENGLISH_STOP_WORDS};

/// Maps one raw window title to a sequence of normalized tokens.
pub trait TextCleaner {
    fn clean(&self, title: &str) -> Result<Vec<String>, CleanError>;
}
