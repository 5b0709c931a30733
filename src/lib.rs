//! Task Summarizer - infers user tasks from window-title logs.
//!
//! The titles of windows a user focused are a noisy signal of what they were
//! working on. This library turns each fixed-length time window into a
//! "window bag" (pruned term counts plus a mean word embedding), lets a
//! clustering strategy assign task ids to the bags, and scores the resulting
//! segmentation against hand-labeled ground truth.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Task Summarizer                         │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐       │
//! │  │ Title log   │──▶│  Windowing  │──▶│ Window bags │       │
//! │  │   (CSV)     │   │ (N-sec bins)│   │ clean+embed │       │
//! │  └─────────────┘   └─────────────┘   └─────────────┘       │
//! │                                              │              │
//! │                                              ▼              │
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐       │
//! │  │ Ground truth│──▶│   Aligner   │◀──│  Clusterer  │       │
//! │  │   (CSV)     │   │ (majority)  │   │ (task ids)  │       │
//! │  └─────────────┘   └─────────────┘   └─────────────┘       │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use task_summarizer::core::{Interval, PredictedSegment, WindowBag};
//! use task_summarizer::embedding::Word2VecTable;
//! use task_summarizer::eval::{score, GroundTruthInterval};
//! use task_summarizer::text::TitleCleaner;
//!
//! let table = Word2VecTable::from_entries(2, [("cat", vec![1.0, 0.0])]).unwrap();
//! let cleaner = TitleCleaner::default();
//!
//! let predicted: Vec<PredictedSegment> = (0..2)
//!     .map(|i| {
//!         let interval = Interval::new(i * 5, (i + 1) * 5);
//!         let bag = WindowBag::build(&["Cats"], interval, 1.0, &cleaner, &table).unwrap();
//!         PredictedSegment::new(bag, 7)
//!     })
//!     .collect();
//!
//! let truth = [GroundTruthInterval::new(0, 10, 1)];
//! assert_eq!(score(&predicted, &truth, 5).unwrap(), 1.0);
//! ```

pub mod config;
pub mod core;
pub mod embedding;
pub mod eval;
pub mod input;
pub mod pipeline;
pub mod text;

// Re-export key types at crate root for convenience
pub use config::{Config, ConfigError, PathConfig};
pub use core::{
    bucket_titles, collapse_runs, BagError, CentroidClusterer, Clusterer, Interval,
    PredictedSegment, TitleWindow, WindowBag,
};
pub use embedding::{EmbeddingTable, Word2VecTable};
pub use eval::{score, AlignError, Aligner, GroundTruthInterval, ScoreReport};
pub use input::{LoadError, Loaded, RowError};
pub use pipeline::{build_bags, BuildSummary};
pub use text::{TextCleaner, TitleCleaner};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
