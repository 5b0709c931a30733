//! Task assignment: the segment stream consumed by the evaluator.
//!
//! A [`Clusterer`] decides which task each window bag belongs to. The
//! evaluator only relies on the contract: one segment per input bag, in
//! input order.

use crate::core::bag::{BagError, WindowBag};
use crate::core::windowing::Interval;
use crate::embedding::EmbeddingTable;
use serde::Serialize;

/// A window bag together with the task id it was assigned.
#[derive(Debug, Clone, Serialize)]
pub struct PredictedSegment {
    pub bag: WindowBag,
    pub task_id: usize,
}

impl PredictedSegment {
    /// Tag `bag` with `task_id`, also recording the id on the bag.
    pub fn new(mut bag: WindowBag, task_id: usize) -> Self {
        bag.set_task_id(task_id);
        Self { bag, task_id }
    }

    pub fn interval(&self) -> Interval {
        self.bag.interval()
    }
}

/// Strategy that assigns task ids to a time-ordered sequence of bags.
///
/// Implementations must return exactly one segment per bag, in input order.
pub trait Clusterer {
    fn cluster(&mut self, bags: Vec<WindowBag>) -> Vec<PredictedSegment>;
}

/// Running mean of the embeddings assigned to one task.
#[derive(Debug, Clone)]
struct TaskCentroid {
    sum: Vec<f64>,
    members: usize,
}

impl TaskCentroid {
    fn new(embedding: &[f64]) -> Self {
        Self {
            sum: embedding.to_vec(),
            members: 1,
        }
    }

    fn add(&mut self, embedding: &[f64]) {
        for (acc, v) in self.sum.iter_mut().zip(embedding) {
            *acc += v;
        }
        self.members += 1;
    }

    fn mean(&self) -> Vec<f64> {
        self.sum.iter().map(|v| v / self.members as f64).collect()
    }
}

/// Assigns each bag to the most similar existing task, or opens a new one.
///
/// Similarity is cosine similarity against each task's mean embedding. A bag
/// whose best similarity is below `threshold` starts a new task.
#[derive(Debug, Clone)]
pub struct CentroidClusterer {
    pub threshold: f64,
    centroids: Vec<TaskCentroid>,
}

impl CentroidClusterer {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            centroids: Vec::new(),
        }
    }

    /// Number of tasks discovered so far.
    pub fn task_count(&self) -> usize {
        self.centroids.len()
    }

    fn assign(&mut self, bag: &WindowBag) -> usize {
        let best = self
            .centroids
            .iter()
            .enumerate()
            .map(|(id, centroid)| (id, bag.similarity(&centroid.mean())))
            .filter(|(_, similarity)| *similarity >= self.threshold)
            .fold(None, |best: Option<(usize, f64)>, candidate| match best {
                Some((_, s)) if s >= candidate.1 => best,
                _ => Some(candidate),
            });

        match best {
            Some((id, _)) => {
                self.centroids[id].add(bag.embedding());
                id
            }
            None => {
                self.centroids.push(TaskCentroid::new(bag.embedding()));
                self.centroids.len() - 1
            }
        }
    }
}

impl Default for CentroidClusterer {
    fn default() -> Self {
        Self::new(0.6)
    }
}

impl Clusterer for CentroidClusterer {
    fn cluster(&mut self, bags: Vec<WindowBag>) -> Vec<PredictedSegment> {
        let segments: Vec<PredictedSegment> = bags
            .into_iter()
            .map(|bag| {
                let task_id = self.assign(&bag);
                tracing::debug!(task_id, "Assigned window {}", bag.interval());
                PredictedSegment::new(bag, task_id)
            })
            .collect();

        tracing::info!(
            windows = segments.len(),
            tasks = self.centroids.len(),
            "Clustered windows into tasks"
        );
        segments
    }
}

/// Merge maximal runs of adjacent segments sharing a task id.
///
/// Each run becomes one segment whose bag covers the whole run.
pub fn collapse_runs<E>(
    segments: Vec<PredictedSegment>,
    table: &E,
) -> Result<Vec<PredictedSegment>, BagError>
where
    E: EmbeddingTable + ?Sized,
{
    let mut runs: Vec<PredictedSegment> = Vec::new();

    for segment in segments {
        match runs.last_mut() {
            Some(run) if run.task_id == segment.task_id => {
                let seconds = segment.interval().end.saturating_sub(run.interval().end);
                run.bag.merge(&segment.bag, seconds, table)?;
            }
            _ => runs.push(segment),
        }
    }

    Ok(runs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::Word2VecTable;
    use crate::text::TitleCleaner;

    fn table() -> Word2VecTable {
        Word2VecTable::from_entries(
            2,
            [
                ("cat", vec![1.0, 0.0]),
                ("dog", vec![0.9, 0.1]),
                ("tax", vec![0.0, 1.0]),
                ("invoic", vec![0.1, 0.9]),
            ],
        )
        .unwrap()
    }

    fn bag(title: &str, index: u64) -> WindowBag {
        WindowBag::build(
            &[title],
            Interval::new(index * 10, (index + 1) * 10),
            1.0,
            &TitleCleaner::default(),
            &table(),
        )
        .unwrap()
    }

    #[test]
    fn test_centroid_clusterer_groups_similar_windows() {
        let bags = vec![
            bag("cats", 0),
            bag("dogs", 1),
            bag("tax invoice", 2),
            bag("cats and dogs", 3),
        ];

        let mut clusterer = CentroidClusterer::new(0.8);
        let segments = clusterer.cluster(bags);

        let ids: Vec<usize> = segments.iter().map(|s| s.task_id).collect();
        assert_eq!(ids, vec![0, 0, 1, 0]);
        assert_eq!(clusterer.task_count(), 2);
        assert_eq!(segments[2].bag.task_id(), Some(1));
    }

    #[test]
    fn test_cluster_preserves_order_and_count() {
        let bags: Vec<WindowBag> = (0..5).map(|i| bag("tax", i)).collect();
        let segments = CentroidClusterer::default().cluster(bags);
        assert_eq!(segments.len(), 5);
        for (i, segment) in segments.iter().enumerate() {
            assert_eq!(segment.interval().start, i as u64 * 10);
            assert_eq!(segment.task_id, 0);
        }
    }

    #[test]
    fn test_collapse_runs() {
        let segments = vec![
            PredictedSegment::new(bag("cats", 0), 0),
            PredictedSegment::new(bag("dogs", 1), 0),
            PredictedSegment::new(bag("tax", 2), 1),
            PredictedSegment::new(bag("cats", 3), 0),
        ];

        let runs = collapse_runs(segments, &table()).unwrap();

        assert_eq!(runs.len(), 3);
        assert_eq!(runs[0].interval(), Interval::new(0, 20));
        assert_eq!(runs[0].bag.count("cat"), Some(1));
        assert_eq!(runs[0].bag.count("dog"), Some(1));
        assert_eq!(runs[1].interval(), Interval::new(20, 30));
        assert_eq!(runs[2].task_id, 0);
    }
}
