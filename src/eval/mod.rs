//! Evaluation against hand-labeled ground truth.

pub mod aligner;
pub mod ground_truth;

pub use aligner::{find_segment, score, AlignError, Aligner, IntervalScore, ScoreReport};
pub use ground_truth::{load_ground_truth, parse_ground_truth, parse_time_of_day, GroundTruthInterval};
