//! Window bags: the pruned term counts and mean embedding of one time window.
//!
//! A bag is built from the raw titles seen during its interval. Titles are
//! cleaned into tokens, counted, pruned to the most frequent fraction of
//! distinct terms, and averaged into a single embedding vector.

use crate::core::windowing::Interval;
use crate::embedding::EmbeddingTable;
use crate::text::TextCleaner;
use serde::Serialize;
use std::collections::HashMap;
use thiserror::Error;

/// Errors raised while building or merging a bag.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BagError {
    #[error("top percentile must be in (0, 1], got {0}")]
    InvalidPercentile(f64),
    #[error("none of the {candidates} terms in window {interval} resolved to an embedding")]
    UnresolvedTerms { interval: Interval, candidates: usize },
}

/// Term counts in a stable order.
///
/// Order matters: pruning breaks count ties by position.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
struct TermCounts {
    entries: Vec<(String, u32)>,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl TermCounts {
    fn from_entries(entries: Vec<(String, u32)>) -> Self {
        let index = entries
            .iter()
            .enumerate()
            .map(|(i, (term, _))| (term.clone(), i))
            .collect();
        Self { entries, index }
    }

    fn add(&mut self, term: &str, count: u32) {
        match self.index.get(term) {
            Some(&i) => self.entries[i].1 += count,
            None => {
                self.index.insert(term.to_string(), self.entries.len());
                self.entries.push((term.to_string(), count));
            }
        }
    }

    fn get(&self, term: &str) -> Option<u32> {
        self.index.get(term).map(|&i| self.entries[i].1)
    }

    /// Keep roughly the `top_percentile` most frequent distinct terms.
    fn pruned(mut self, top_percentile: f64) -> Self {
        self.entries.sort_by_key(|(_, count)| *count);
        let cut = prune_cut(self.entries.len(), top_percentile);
        self.entries.drain(..cut);
        Self::from_entries(self.entries)
    }
}

/// Number of least-frequent entries dropped from `len` distinct terms.
pub(crate) fn prune_cut(len: usize, top_percentile: f64) -> usize {
    ((len as f64) * (1.0 - top_percentile)).floor() as usize
}

/// The pruned, embedded representation of one time window.
#[derive(Debug, Clone, Serialize)]
pub struct WindowBag {
    terms: TermCounts,
    embedding: Vec<f64>,
    interval: Interval,
    task_id: Option<usize>,
    top_percentile: f64,
}

impl WindowBag {
    /// Build a bag from the raw titles focused during `interval`.
    ///
    /// Titles the cleaner rejects are skipped with a warning. Fails with
    /// [`BagError::UnresolvedTerms`] if no surviving term has an embedding.
    pub fn build<S, C, E>(
        titles: &[S],
        interval: Interval,
        top_percentile: f64,
        cleaner: &C,
        table: &E,
    ) -> Result<Self, BagError>
    where
        S: AsRef<str>,
        C: TextCleaner + ?Sized,
        E: EmbeddingTable + ?Sized,
    {
        validate_percentile(top_percentile)?;

        let mut terms = TermCounts::default();
        for title in titles {
            match cleaner.clean(title.as_ref()) {
                Ok(tokens) => {
                    for token in &tokens {
                        terms.add(token, 1);
                    }
                }
                Err(e) => tracing::warn!("Skipping title in window {}: {}", interval, e),
            }
        }

        let terms = terms.pruned(top_percentile);
        let embedding = average_embedding(&terms, interval, table)?;

        Ok(Self {
            terms,
            embedding,
            interval,
            task_id: None,
            top_percentile,
        })
    }

    /// Absorb `other` into this bag and extend the interval by `seconds_to_add`.
    ///
    /// Counts are summed, the combined terms re-pruned with this bag's
    /// threshold and the embedding recomputed. On error `self` is unchanged.
    pub fn merge<E>(
        &mut self,
        other: &WindowBag,
        seconds_to_add: u64,
        table: &E,
    ) -> Result<(), BagError>
    where
        E: EmbeddingTable + ?Sized,
    {
        let mut terms = self.terms.clone();
        for (term, count) in &other.terms.entries {
            terms.add(term, *count);
        }

        let interval = Interval::new(self.interval.start, self.interval.end + seconds_to_add);
        let terms = terms.pruned(self.top_percentile);
        let embedding = average_embedding(&terms, interval, table)?;

        self.terms = terms;
        self.embedding = embedding;
        self.interval = interval;
        Ok(())
    }

    /// Surviving terms and their counts, least frequent first.
    pub fn terms(&self) -> &[(String, u32)] {
        &self.terms.entries
    }

    /// Count for a single term, if it survived pruning.
    pub fn count(&self, term: &str) -> Option<u32> {
        self.terms.get(term)
    }

    /// Number of distinct surviving terms.
    pub fn len(&self) -> usize {
        self.terms.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.entries.is_empty()
    }

    pub fn embedding(&self) -> &[f64] {
        &self.embedding
    }

    pub fn interval(&self) -> Interval {
        self.interval
    }

    pub fn task_id(&self) -> Option<usize> {
        self.task_id
    }

    pub fn set_task_id(&mut self, task_id: usize) {
        self.task_id = Some(task_id);
    }

    pub fn top_percentile(&self) -> f64 {
        self.top_percentile
    }

    /// Cosine similarity between this bag's embedding and `other`.
    pub fn similarity(&self, other: &[f64]) -> f64 {
        cosine_similarity(&self.embedding, other)
    }
}

fn validate_percentile(top_percentile: f64) -> Result<(), BagError> {
    if top_percentile > 0.0 && top_percentile <= 1.0 {
        Ok(())
    } else {
        Err(BagError::InvalidPercentile(top_percentile))
    }
}

/// Mean of the embeddings of every term the table knows. Each term counts once.
fn average_embedding<E>(
    terms: &TermCounts,
    interval: Interval,
    table: &E,
) -> Result<Vec<f64>, BagError>
where
    E: EmbeddingTable + ?Sized,
{
    let mut sum = vec![0f64; table.dimensions()];
    let mut resolved = 0usize;

    for (term, _) in &terms.entries {
        let Some(vector) = table.embed(term) else {
            continue;
        };
        for (acc, v) in sum.iter_mut().zip(vector) {
            *acc += f64::from(*v);
        }
        resolved += 1;
    }

    if resolved == 0 {
        return Err(BagError::UnresolvedTerms {
            interval,
            candidates: terms.entries.len(),
        });
    }

    tracing::debug!(
        resolved,
        candidates = terms.entries.len(),
        "Averaged embeddings for window {}",
        interval
    );

    for acc in &mut sum {
        *acc /= resolved as f64;
    }
    Ok(sum)
}

/// Cosine similarity of two vectors; 0.0 when either has zero norm.
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    let dot: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}
