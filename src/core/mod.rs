//! Core functionality for task inference.
//!
//! This module contains:
//! - Time windowing of the window-title log
//! - Window bags (pruned term counts plus mean embedding)
//! - The segment stream produced by task clustering

pub mod bag;
pub mod segments;
pub mod windowing;

// Re-export commonly used types
pub use bag::{cosine_similarity, BagError, WindowBag};
pub use segments::{collapse_runs, CentroidClusterer, Clusterer, PredictedSegment};
pub use windowing::{
    bucket_titles, load_title_log, parse_title_log, Interval, TitleRecord, TitleWindow,
};
