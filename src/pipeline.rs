//! Batch construction of window bags.
//!
//! Windows are independent, so bags are built on a small pool of scoped
//! worker threads fed through a channel. Results are returned in window order.

use crate::core::bag::{BagError, WindowBag};
use crate::core::windowing::{Interval, TitleWindow};
use crate::embedding::EmbeddingTable;
use crate::text::TextCleaner;
use crossbeam_channel::unbounded;
use serde::Serialize;

/// A window whose bag could not be built.
#[derive(Debug, Clone, Serialize)]
pub struct DroppedWindow {
    pub index: usize,
    pub interval: Interval,
    pub reason: String,
}

/// Bags built from a run's windows, plus the windows that were dropped.
#[derive(Debug, Clone)]
pub struct BuildSummary {
    pub bags: Vec<WindowBag>,
    pub dropped: Vec<DroppedWindow>,
}

/// Build one bag per window using up to `workers` threads.
///
/// Windows with no resolvable terms are dropped and listed in the summary.
/// An invalid `top_percentile` fails the whole batch.
pub fn build_bags<C, E>(
    windows: &[TitleWindow],
    top_percentile: f64,
    workers: usize,
    cleaner: &C,
    table: &E,
) -> Result<BuildSummary, BagError>
where
    C: TextCleaner + Sync + ?Sized,
    E: EmbeddingTable + Sync + ?Sized,
{
    if !(top_percentile > 0.0 && top_percentile <= 1.0) {
        return Err(BagError::InvalidPercentile(top_percentile));
    }

    let workers = workers.clamp(1, windows.len().max(1));
    let (job_tx, job_rx) = unbounded::<&TitleWindow>();
    let (result_tx, result_rx) = unbounded();

    for window in windows {
        // receiver is held below; send cannot fail
        let _ = job_tx.send(window);
    }
    drop(job_tx);

    std::thread::scope(|scope| {
        for _ in 0..workers {
            let job_rx = job_rx.clone();
            let result_tx = result_tx.clone();
            scope.spawn(move || {
                for window in job_rx.iter() {
                    let result = WindowBag::build(
                        &window.titles,
                        window.interval,
                        top_percentile,
                        cleaner,
                        table,
                    );
                    if result_tx.send((window.index, window.interval, result)).is_err() {
                        break;
                    }
                }
            });
        }
    });
    drop(result_tx);

    let mut results: Vec<(usize, Interval, Result<WindowBag, BagError>)> =
        result_rx.iter().collect();
    results.sort_by_key(|(index, _, _)| *index);

    let mut bags = Vec::with_capacity(results.len());
    let mut dropped = Vec::new();
    for (index, interval, result) in results {
        match result {
            Ok(bag) => bags.push(bag),
            Err(e @ BagError::UnresolvedTerms { .. }) => {
                tracing::warn!("Dropping window {} {}: {}", index, interval, e);
                dropped.push(DroppedWindow {
                    index,
                    interval,
                    reason: e.to_string(),
                });
            }
            Err(e) => return Err(e),
        }
    }

    tracing::info!(
        built = bags.len(),
        dropped = dropped.len(),
        workers,
        "Built window bags"
    );

    Ok(BuildSummary { bags, dropped })
}
