//! The default window-title cleaning pipeline.

use crate::text::stopwords::StopWords;
use crate::text::TextCleaner;
use rust_stemmers::{Algorithm, Stemmer};
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

/// Characters that split a title into tokens.
pub const TOKEN_SEPARATORS: [char; 4] = [' ', ',', '-', '_'];

/// Tokens dropped by default. Browser chrome adds these to most titles.
pub const DEFAULT_DENYLIST: [&str; 2] = ["google", "search"];

/// A title the cleaner refuses to process.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CleanError {
    #[error("title contains undecodable or control characters: {0:?}")]
    Malformed(String),
}

/// Word list used to reject tokens that are not real words.
#[derive(Debug, Clone)]
pub enum Dictionary {
    /// Accept any purely alphabetic token.
    Permissive,
    /// Accept only listed words (case-insensitive).
    Words(HashSet<String>),
}

impl Dictionary {
    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Dictionary::Words(
            words
                .into_iter()
                .map(|w| w.as_ref().trim().to_lowercase())
                .filter(|w| !w.is_empty())
                .collect(),
        )
    }

    /// Load a newline-separated word list.
    ///
    /// Hunspell-style `.dic` files are accepted: a leading count line is
    /// ignored and affix flags after `/` are stripped.
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(Self::from_words(
            content
                .lines()
                .filter(|l| !l.trim().chars().all(|c| c.is_ascii_digit()))
                .map(|l| l.split('/').next().unwrap_or(l)),
        ))
    }

    pub fn accepts(&self, token: &str) -> bool {
        if !token.chars().all(char::is_alphabetic) {
            return false;
        }
        match self {
            Dictionary::Permissive => true,
            Dictionary::Words(words) => words.contains(token),
        }
    }
}

/// Tokenize, filter and stem window titles.
pub struct TitleCleaner {
    stop_words: StopWords,
    denylist: HashSet<String>,
    dictionary: Dictionary,
    stemmer: Stemmer,
}

impl std::fmt::Debug for TitleCleaner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TitleCleaner")
            .field("stop_words", &self.stop_words.len())
            .field("denylist", &self.denylist)
            .field("dictionary", &self.dictionary_kind())
            .finish()
    }
}

impl Default for TitleCleaner {
    fn default() -> Self {
        Self::new(
            StopWords::english(),
            DEFAULT_DENYLIST.iter().copied(),
            Dictionary::Permissive,
        )
    }
}

impl TitleCleaner {
    pub fn new<I, S>(stop_words: StopWords, denylist: I, dictionary: Dictionary) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            stop_words,
            denylist: denylist
                .into_iter()
                .map(|w| w.as_ref().to_lowercase())
                .collect(),
            dictionary,
            stemmer: Stemmer::create(Algorithm::English),
        }
    }

    fn dictionary_kind(&self) -> &'static str {
        match self.dictionary {
            Dictionary::Permissive => "permissive",
            Dictionary::Words(_) => "word-list",
        }
    }

    fn keep(&self, token: &str) -> bool {
        if self.stop_words.contains(token) || self.denylist.contains(token) {
            return false;
        }
        if token.chars().all(|c| c.is_ascii_digit()) {
            return false;
        }
        self.dictionary.accepts(token)
    }
}

impl TextCleaner for TitleCleaner {
    fn clean(&self, title: &str) -> Result<Vec<String>, CleanError> {
        if title
            .chars()
            .any(|c| c == char::REPLACEMENT_CHARACTER || (c.is_control() && c != '\t'))
        {
            return Err(CleanError::Malformed(title.to_string()));
        }

        let tokens = title
            .split(&TOKEN_SEPARATORS[..])
            .map(|raw| {
                raw.trim_matches(|c: char| !c.is_alphanumeric())
                    .to_lowercase()
            })
            .filter(|token| !token.is_empty() && self.keep(token))
            .map(|token| self.stemmer.stem(&token).into_owned())
            .collect();

        Ok(tokens)
    }
}
