//! Majority-vote scoring of a predicted segmentation against ground truth.
//!
//! A cursor walks time in steps of `window_size`. Inside each ground-truth
//! interval every step is matched to the predicted segment that fully
//! contains it, and the predicted task ids are tallied. The interval is
//! credited with the size of its largest tally; accuracy is credited points
//! over matched steps.

use crate::core::segments::PredictedSegment;
use crate::core::windowing::Interval;
use crate::eval::ground_truth::GroundTruthInterval;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors raised while scoring.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AlignError {
    /// No step was covered by any predicted segment; accuracy is undefined.
    #[error("no sub-window overlapped a predicted segment; insufficient overlap to score")]
    NoOverlap,
    #[error("window size must be positive")]
    InvalidWindowSize,
}

/// Scoring outcome for one ground-truth interval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntervalScore {
    pub interval: Interval,
    pub label_id: i64,
    /// Steps inside this interval that matched a predicted segment
    pub scored_windows: u64,
    /// Most frequent predicted task (lowest id on ties)
    pub majority_task: Option<usize>,
    /// Size of the largest tally; the points credited to this interval
    pub majority_count: u64,
    /// Matched steps per predicted task id
    pub tally: BTreeMap<usize, u64>,
}

/// Full scoring outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreReport {
    pub window_size: u64,
    pub correct_points: u64,
    pub total_points: u64,
    pub accuracy: f64,
    pub intervals: Vec<IntervalScore>,
}

/// Walks ground truth and predictions in lock-step.
#[derive(Debug, Clone, Copy)]
pub struct Aligner {
    window_size: u64,
    boundary_step: bool,
}

impl Aligner {
    /// Aligner with the cursor stepping one extra window between intervals.
    pub fn new(window_size: u64) -> Self {
        Self {
            window_size,
            boundary_step: true,
        }
    }

    /// Whether to advance the cursor an extra window after each interval.
    ///
    /// Enabled by default. The skipped step is never scored.
    pub fn with_boundary_step(mut self, enabled: bool) -> Self {
        self.boundary_step = enabled;
        self
    }

    pub fn evaluate(
        &self,
        predicted: &[PredictedSegment],
        ground_truth: &[GroundTruthInterval],
    ) -> Result<ScoreReport, AlignError> {
        let w = self.window_size;
        if w == 0 {
            return Err(AlignError::InvalidWindowSize);
        }

        let mut cur = 0u64;
        let mut correct_points = 0u64;
        let mut total_points = 0u64;
        let mut intervals = Vec::with_capacity(ground_truth.len());

        for truth in ground_truth {
            let gt_end = truth.interval.end;
            let mut tally: BTreeMap<usize, u64> = BTreeMap::new();
            let mut scored_windows = 0u64;

            while cur + w <= gt_end {
                if let Some(segment) = find_segment(predicted, cur, cur + w) {
                    *tally.entry(segment.task_id).or_insert(0) += 1;
                    scored_windows += 1;
                }
                cur += w;
            }
            if self.boundary_step {
                cur += w;
            }

            let (majority_task, majority_count) = majority(&tally);
            correct_points += majority_count;
            total_points += scored_windows;
            tracing::debug!(
                label = truth.label_id,
                "Interval {}: {} / {}",
                truth.interval,
                correct_points,
                total_points
            );

            intervals.push(IntervalScore {
                interval: truth.interval,
                label_id: truth.label_id,
                scored_windows,
                majority_task,
                majority_count,
                tally,
            });
        }

        if total_points == 0 {
            return Err(AlignError::NoOverlap);
        }

        let accuracy = correct_points as f64 / total_points as f64;
        tracing::info!(correct_points, total_points, accuracy, "Scored segmentation");

        Ok(ScoreReport {
            window_size: w,
            correct_points,
            total_points,
            accuracy,
            intervals,
        })
    }
}

/// Accuracy in `[0, 1]` of `predicted` against `ground_truth`.
pub fn score(
    predicted: &[PredictedSegment],
    ground_truth: &[GroundTruthInterval],
    window_size: u64,
) -> Result<f64, AlignError> {
    Aligner::new(window_size)
        .evaluate(predicted, ground_truth)
        .map(|report| report.accuracy)
}

/// First segment whose interval covers all of `[start, end)`.
pub fn find_segment(
    predicted: &[PredictedSegment],
    start: u64,
    end: u64,
) -> Option<&PredictedSegment> {
    predicted
        .iter()
        .find(|segment| segment.interval().covers(start, end))
}

fn majority(tally: &BTreeMap<usize, u64>) -> (Option<usize>, u64) {
    tally
        .iter()
        .fold((None, 0), |(best, best_count), (&task, &count)| {
            if count > best_count {
                (Some(task), count)
            } else {
                (best, best_count)
            }
        })
}
