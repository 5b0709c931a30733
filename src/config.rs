//! Configuration for the task summarizer.

use crate::embedding::EmbeddingFormat;
use crate::text::DEFAULT_DENYLIST;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Main configuration for an evaluation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Length of each time window
    #[serde(with = "duration_serde")]
    pub window_size: Duration,

    /// Fraction of distinct terms kept per window, in (0, 1]
    pub top_percentile: f64,

    /// Input files
    pub paths: PathConfig,

    /// Format of the embedding file
    pub embedding_format: EmbeddingFormat,

    /// Tokens always removed from titles (case-insensitive)
    pub denylist: Vec<String>,

    /// Minimum cosine similarity for a window to join an existing task
    pub similarity_threshold: f64,

    /// Advance the scoring cursor one window between ground-truth intervals
    pub boundary_step: bool,

    /// Threads used to build window bags
    pub workers: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            window_size: Duration::from_secs(60),
            top_percentile: 0.4,
            paths: PathConfig::default(),
            embedding_format: EmbeddingFormat::Binary,
            denylist: DEFAULT_DENYLIST.iter().map(|s| s.to_string()).collect(),
            similarity_threshold: 0.6,
            boundary_step: true,
            workers: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from `path`, falling back to defaults if it does not exist.
    pub fn load_from(path: &std::path::Path) -> Result<Self, ConfigError> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        let config_path = Self::config_path();

        // Ensure parent directory exists
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;

        Ok(())
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("task-summarizer")
            .join("config.json")
    }

    /// Window size in whole seconds.
    pub fn window_secs(&self) -> u64 {
        self.window_size.as_secs()
    }

    /// Check the run parameters before any input is read.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window_secs() == 0 {
            return Err(ConfigError::Invalid(
                "window size must be at least one second".to_string(),
            ));
        }
        if !(self.top_percentile > 0.0 && self.top_percentile <= 1.0) {
            return Err(ConfigError::Invalid(format!(
                "top percentile must be in (0, 1], got {}",
                self.top_percentile
            )));
        }
        if !(-1.0..=1.0).contains(&self.similarity_threshold) {
            return Err(ConfigError::Invalid(format!(
                "similarity threshold must be in [-1, 1], got {}",
                self.similarity_threshold
            )));
        }
        if self.workers == 0 {
            return Err(ConfigError::Invalid("workers must be positive".to_string()));
        }
        Ok(())
    }
}

/// Locations of the input files. Resolved once at startup.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PathConfig {
    /// Window-title log (CSV)
    pub titles: Option<PathBuf>,
    /// Ground-truth labels (CSV)
    pub ground_truth: Option<PathBuf>,
    /// Pretrained word embeddings
    pub embeddings: Option<PathBuf>,
    /// Word list used to reject non-words; all alphabetic tokens pass when unset
    pub dictionary: Option<PathBuf>,
    /// Stop-word list; the built-in English list is used when unset
    pub stop_words: Option<PathBuf>,
}

impl PathConfig {
    /// Return the configured path or a descriptive error naming the missing setting.
    pub fn require<'a>(
        path: &'a Option<PathBuf>,
        name: &'static str,
    ) -> Result<&'a PathBuf, ConfigError> {
        path.as_ref().ok_or(ConfigError::MissingPath(name))
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
    #[error("No {0} path configured")]
    MissingPath(&'static str),
}

/// Serde support for Duration.
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.window_secs(), 60);
        assert_eq!(config.top_percentile, 0.4);
        assert_eq!(config.denylist, vec!["google", "search"]);
        assert!(config.boundary_step);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: Config =
            serde_json::from_str(r#"{"window_size": 30, "paths": {"titles": "/tmp/t.csv"}}"#)
                .unwrap();
        assert_eq!(config.window_secs(), 30);
        assert_eq!(config.top_percentile, 0.4);
        assert_eq!(config.paths.titles, Some(PathBuf::from("/tmp/t.csv")));
        assert_eq!(config.paths.ground_truth, None);
    }

    #[test]
    fn test_round_trip_keeps_window_in_seconds() {
        let json = serde_json::to_value(Config::default()).unwrap();
        assert_eq!(json["window_size"], 60);
        assert_eq!(json["embedding_format"], "binary");
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.top_percentile = 0.0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = Config::default();
        config.window_size = Duration::from_millis(500);
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = Config::default();
        config.workers = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_path() {
        let paths = PathConfig::default();
        let err = PathConfig::require(&paths.titles, "title log").unwrap_err();
        assert_eq!(err.to_string(), "No title log path configured");
    }

    #[test]
    fn test_load_from_missing_file_gives_defaults() {
        let path = std::env::temp_dir().join("task-summarizer-no-such-config.json");
        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.window_secs(), 60);
    }
}
