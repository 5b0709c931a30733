//! Task Summarizer CLI
//!
//! Builds window bags from a title log, clusters them into tasks and scores
//! the result against ground truth.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;
use task_summarizer::{
    build_bags, bucket_titles, collapse_runs,
    config::{Config, PathConfig},
    core::load_title_log,
    embedding::{EmbeddingFormat, Word2VecTable},
    eval::load_ground_truth,
    pipeline::DroppedWindow,
    text::{Dictionary, StopWords},
    AlignError, Aligner, CentroidClusterer, Clusterer, ScoreReport, TitleCleaner, TitleWindow,
    VERSION,
};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "task-summarizer")]
#[command(version = VERSION)]
#[command(about = "Infer tasks from window titles and score them against ground truth", long_about = None)]
struct Cli {
    /// Configuration file (defaults to the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build bags, cluster them into tasks and score against ground truth
    Evaluate {
        #[command(flatten)]
        run: RunArgs,

        /// Ground-truth label file
        #[arg(long)]
        truth: Option<PathBuf>,

        /// Minimum cosine similarity to join an existing task
        #[arg(long)]
        threshold: Option<f64>,

        /// Do not skip a window between ground-truth intervals
        #[arg(long)]
        no_boundary_step: bool,

        /// Write the full report as JSON
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Print the titles and surviving terms of every window
    Bags {
        #[command(flatten)]
        run: RunArgs,
    },

    /// Show configuration
    Config {
        /// Write the effective configuration to the config file
        #[arg(long)]
        save: bool,
    },
}

/// Inputs shared by every command that builds bags.
#[derive(Args)]
struct RunArgs {
    /// Window-title log
    #[arg(long)]
    titles: Option<PathBuf>,

    /// Pretrained word embeddings
    #[arg(long)]
    embeddings: Option<PathBuf>,

    /// Embedding file format (binary or text); guessed from the extension if omitted
    #[arg(long)]
    embedding_format: Option<String>,

    /// Dictionary word list
    #[arg(long)]
    dictionary: Option<PathBuf>,

    /// Stop-word list
    #[arg(long)]
    stop_words: Option<PathBuf>,

    /// Window size in seconds
    #[arg(long)]
    num_secs: Option<u64>,

    /// Fraction of distinct terms kept per window, in (0, 1]
    #[arg(long)]
    top_percentile: Option<f64>,

    /// Worker threads for bag construction
    #[arg(long)]
    workers: Option<usize>,
}

impl RunArgs {
    fn apply(self, config: &mut Config) -> Result<()> {
        if let Some(path) = self.titles {
            config.paths.titles = Some(path);
        }
        if let Some(path) = self.embeddings {
            config.embedding_format = EmbeddingFormat::from_path(&path);
            config.paths.embeddings = Some(path);
        }
        if let Some(format) = self.embedding_format {
            config.embedding_format = match format.as_str() {
                "binary" | "bin" => EmbeddingFormat::Binary,
                "text" | "txt" => EmbeddingFormat::Text,
                other => anyhow::bail!("unknown embedding format {other:?}"),
            };
        }
        if let Some(path) = self.dictionary {
            config.paths.dictionary = Some(path);
        }
        if let Some(path) = self.stop_words {
            config.paths.stop_words = Some(path);
        }
        if let Some(secs) = self.num_secs {
            config.window_size = Duration::from_secs(secs);
        }
        if let Some(p) = self.top_percentile {
            config.top_percentile = p;
        }
        if let Some(workers) = self.workers {
            config.workers = workers;
        }
        Ok(())
    }
}

/// Everything written by `evaluate --output`.
#[derive(Serialize)]
struct RunReport {
    run_id: Uuid,
    generated_at: DateTime<Utc>,
    version: &'static str,
    window_size: u64,
    top_percentile: f64,
    similarity_threshold: f64,
    windows: usize,
    dropped_windows: Vec<DroppedWindow>,
    tasks: Vec<TaskSummary>,
    score: ScoreReport,
}

/// One collapsed task segment.
#[derive(Serialize)]
struct TaskSummary {
    task_id: usize,
    start: u64,
    end: u64,
    top_terms: Vec<String>,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Evaluate {
            run,
            truth,
            threshold,
            no_boundary_step,
            output,
        } => load_config(cli.config.as_ref()).and_then(|mut config| {
            run.apply(&mut config)?;
            if let Some(path) = truth {
                config.paths.ground_truth = Some(path);
            }
            if let Some(threshold) = threshold {
                config.similarity_threshold = threshold;
            }
            if no_boundary_step {
                config.boundary_step = false;
            }
            cmd_evaluate(&config, output)
        }),
        Commands::Bags { run } => load_config(cli.config.as_ref()).and_then(|mut config| {
            run.apply(&mut config)?;
            cmd_bags(&config)
        }),
        Commands::Config { save } => {
            load_config(cli.config.as_ref()).and_then(|config| cmd_config(&config, save))
        }
    };

    if let Err(e) = result {
        if let Some(AlignError::NoOverlap) = e.downcast_ref::<AlignError>() {
            eprintln!("Error: insufficient overlap to score.");
            eprintln!("No predicted window fell inside any ground-truth interval.");
            eprintln!("Check that both logs start at the same origin and share a time scale.");
            std::process::exit(2);
        }
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&PathBuf>) -> Result<Config> {
    let config = match path {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    };
    config.context("failed to load configuration")
}

fn load_cleaner(config: &Config) -> Result<TitleCleaner> {
    let stop_words = match &config.paths.stop_words {
        Some(path) => StopWords::load(path)
            .with_context(|| format!("failed to read stop words from {path:?}"))?,
        None => StopWords::english(),
    };
    let dictionary = match &config.paths.dictionary {
        Some(path) => Dictionary::load(path)
            .with_context(|| format!("failed to read dictionary from {path:?}"))?,
        None => {
            tracing::warn!("No dictionary configured; accepting every alphabetic token");
            Dictionary::Permissive
        }
    };
    Ok(TitleCleaner::new(stop_words, &config.denylist, dictionary))
}

fn load_windows(config: &Config) -> Result<Vec<TitleWindow>> {
    let path = PathConfig::require(&config.paths.titles, "title log")?;
    let log = load_title_log(path)?;
    if !log.is_clean() {
        println!("Skipped {} malformed title row(s)", log.skipped.len());
    }
    Ok(bucket_titles(&log.records, config.window_secs()))
}

fn load_table(config: &Config) -> Result<Word2VecTable> {
    let path = PathConfig::require(&config.paths.embeddings, "embedding table")?;
    Word2VecTable::load(path, config.embedding_format)
        .with_context(|| format!("failed to load embeddings from {path:?}"))
}

fn cmd_evaluate(config: &Config, output: Option<PathBuf>) -> Result<()> {
    config.validate()?;

    println!("Task Summarizer v{VERSION}");
    println!();
    println!("  Window size: {}s", config.window_secs());
    println!("  Top percentile: {}", config.top_percentile);
    println!("  Similarity threshold: {}", config.similarity_threshold);
    println!(
        "  Boundary step: {}",
        if config.boundary_step {
            "enabled"
        } else {
            "disabled"
        }
    );
    println!();

    let truth_path = PathConfig::require(&config.paths.ground_truth, "ground truth")?;
    let ground_truth = load_ground_truth(truth_path)?;
    if !ground_truth.is_clean() {
        println!(
            "Skipped {} malformed ground-truth row(s)",
            ground_truth.skipped.len()
        );
    }

    let windows = load_windows(config)?;
    let cleaner = load_cleaner(config)?;
    let table = load_table(config)?;

    let summary = build_bags(
        &windows,
        config.top_percentile,
        config.workers,
        &cleaner,
        &table,
    )?;
    println!(
        "Built {} window bag(s), dropped {}",
        summary.bags.len(),
        summary.dropped.len()
    );

    let mut clusterer = CentroidClusterer::new(config.similarity_threshold);
    let segments = clusterer.cluster(summary.bags);

    let aligner = Aligner::new(config.window_secs()).with_boundary_step(config.boundary_step);
    let score = aligner.evaluate(&segments, &ground_truth.records)?;

    let tasks = collapse_runs(segments, &table)?;
    println!();
    println!("Tasks");
    println!("=====");
    let tasks: Vec<TaskSummary> = tasks
        .iter()
        .map(|segment| {
            let top_terms: Vec<String> = segment
                .bag
                .terms()
                .iter()
                .rev()
                .take(5)
                .map(|(term, _)| term.clone())
                .collect();
            println!(
                "  {:>6} - {:>6}  task {:>3}  {}",
                segment.interval().start,
                segment.interval().end,
                segment.task_id,
                top_terms.join(", ")
            );
            TaskSummary {
                task_id: segment.task_id,
                start: segment.interval().start,
                end: segment.interval().end,
                top_terms,
            }
        })
        .collect();

    println!();
    println!("Ground truth");
    println!("============");
    for interval in &score.intervals {
        println!(
            "  {:>6} - {:>6}  label {:>3}  majority {:>4}  {} / {}",
            interval.interval.start,
            interval.interval.end,
            interval.label_id,
            interval
                .majority_task
                .map(|t| t.to_string())
                .unwrap_or_else(|| "-".to_string()),
            interval.majority_count,
            interval.scored_windows
        );
    }
    println!();
    println!(
        "Accuracy: {:.4} ({} / {})",
        score.accuracy, score.correct_points, score.total_points
    );

    if let Some(path) = output {
        let report = RunReport {
            run_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            version: VERSION,
            window_size: config.window_secs(),
            top_percentile: config.top_percentile,
            similarity_threshold: config.similarity_threshold,
            windows: windows.len(),
            dropped_windows: summary.dropped,
            tasks,
            score,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&report)?;
        std::fs::write(&path, json).with_context(|| format!("failed to write {path:?}"))?;
        println!("Wrote report to {path:?}");
    }

    Ok(())
}

fn cmd_bags(config: &Config) -> Result<()> {
    config.validate()?;

    let windows = load_windows(config)?;
    let cleaner = load_cleaner(config)?;
    let table = load_table(config)?;
    let summary = build_bags(
        &windows,
        config.top_percentile,
        config.workers,
        &cleaner,
        &table,
    )?;

    let mut bags = summary.bags.iter().peekable();
    for window in &windows {
        for title in &window.titles {
            println!("{title}");
        }
        match bags.peek() {
            Some(bag) if bag.interval() == window.interval => {
                let terms: Vec<String> = bag
                    .terms()
                    .iter()
                    .map(|(term, count)| format!("{term}:{count}"))
                    .collect();
                println!("  terms: {}", terms.join(" "));
                bags.next();
            }
            _ => println!("  (dropped: no resolvable terms)"),
        }
        println!(
            "---------------------------- {}",
            format_clock(window.interval.end)
        );
    }

    Ok(())
}

fn cmd_config(config: &Config, save: bool) -> Result<()> {
    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {:?}", Config::config_path());
    println!();
    println!("{}", serde_json::to_string_pretty(config)?);

    if save {
        config.save()?;
        println!();
        println!("Saved to {:?}", Config::config_path());
    }
    Ok(())
}

/// Format seconds as `hh:mm:ss`.
fn format_clock(secs: u64) -> String {
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs / 60) % 60, secs % 60)
}
