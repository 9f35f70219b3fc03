//! Pipeline tuning knobs.
//!
//! Every delay, threshold, and gate the pipeline consults lives in
//! [`PipelineConfig`] so nothing operational hides inside the code. The
//! defaults match how the hosted ingestion runs; a YAML file with any
//! subset of the fields overrides them.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{PipelineError, Result};

/// Tunable parameters for polling, extraction, and scoring.
///
/// All fields are optional in YAML; missing fields keep their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Articles processed concurrently within one batch.
    pub max_concurrent_jobs: usize,
    /// Pause between consecutive feed fetches, in milliseconds.
    pub feed_delay_ms: u64,
    /// Pause between article batches, in milliseconds.
    pub batch_delay_ms: u64,
    /// Newest feed entries taken per feed.
    pub items_per_feed: usize,
    /// Timeout for the browser-style article fetch, in seconds.
    pub primary_timeout_secs: u64,
    /// Timeout for the lightweight retry fetch, in seconds.
    pub alternative_timeout_secs: u64,
    /// Timeout for RSS feed fetches, in seconds.
    pub feed_timeout_secs: u64,
    /// Responses smaller than this many bytes are treated as blocked.
    pub min_html_bytes: usize,
    /// Minimum body length (characters) to accept the primary fetch and to
    /// analyze an article during a cycle.
    pub min_article_chars: usize,
    /// Minimum body length to accept the retry fetch.
    pub min_alternative_chars: usize,
    /// Minimum body length for the on-demand analyze command.
    pub min_analyze_chars: usize,
    /// Minimum length before an extraction strategy's output is accepted.
    pub min_strategy_chars: usize,
    /// Minimum characters for a text block to count as a paragraph.
    pub min_paragraph_chars: usize,
    /// Minimum words for a text block to count as a paragraph.
    pub min_paragraph_words: usize,
    /// Body is cut off once it reaches this many words.
    pub max_total_words: usize,
    /// Paragraphs taken by the whole-page paragraph scan.
    pub max_scan_paragraphs: usize,
    /// The trending coin flip must exceed this value, so higher means
    /// fewer articles marked trending. Must lie in `[0, 1]`.
    pub trending_gate: f64,
    /// Articles older than this many hours are never trending.
    pub trending_recency_hours: i64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_concurrent_jobs: 3,
            feed_delay_ms: 1000,
            batch_delay_ms: 2000,
            items_per_feed: 10,
            primary_timeout_secs: 20,
            alternative_timeout_secs: 15,
            feed_timeout_secs: 15,
            min_html_bytes: 1000,
            min_article_chars: 100,
            min_alternative_chars: 50,
            min_analyze_chars: 50,
            min_strategy_chars: 200,
            min_paragraph_chars: 25,
            min_paragraph_words: 6,
            max_total_words: 8000,
            max_scan_paragraphs: 50,
            trending_gate: 0.7,
            trending_recency_hours: 6,
        }
    }
}

impl PipelineConfig {
    /// Load overrides from a YAML file on top of the defaults.
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: PipelineConfig = serde_yaml::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.max_concurrent_jobs == 0 {
            return Err(PipelineError::Config(
                "max_concurrent_jobs must be at least 1".to_string(),
            ));
        }
        if self.items_per_feed == 0 {
            return Err(PipelineError::Config(
                "items_per_feed must be at least 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.trending_gate) {
            return Err(PipelineError::Config(format!(
                "trending_gate must lie in [0, 1], got {}",
                self.trending_gate
            )));
        }
        if self.primary_timeout_secs == 0
            || self.alternative_timeout_secs == 0
            || self.feed_timeout_secs == 0
        {
            return Err(PipelineError::Config(
                "timeouts must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_hosted_profile() {
        let config = PipelineConfig::default();
        assert_eq!(config.max_concurrent_jobs, 3);
        assert_eq!(config.feed_delay_ms, 1000);
        assert_eq!(config.batch_delay_ms, 2000);
        assert_eq!(config.items_per_feed, 10);
        assert_eq!(config.primary_timeout_secs, 20);
        assert_eq!(config.min_html_bytes, 1000);
        assert_eq!(config.min_article_chars, 100);
        assert_eq!(config.min_alternative_chars, 50);
        assert_eq!(config.min_strategy_chars, 200);
        assert_eq!(config.min_paragraph_chars, 25);
        assert_eq!(config.min_paragraph_words, 6);
        assert_eq!(config.max_total_words, 8000);
        assert_eq!(config.max_scan_paragraphs, 50);
        assert!((config.trending_gate - 0.7).abs() < f64::EPSILON);
        assert_eq!(config.trending_recency_hours, 6);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_overrides_keep_other_defaults() {
        let yaml = "max_concurrent_jobs: 5\ntrending_gate: 0.9\n";
        let config: PipelineConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.max_concurrent_jobs, 5);
        assert!((config.trending_gate - 0.9).abs() < f64::EPSILON);
        assert_eq!(config.items_per_feed, 10);
        assert_eq!(config.batch_delay_ms, 2000);
    }

    #[test]
    fn test_validate_rejects_zero_concurrency() {
        let config = PipelineConfig {
            max_concurrent_jobs: 0,
            ..PipelineConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_gate_outside_unit_interval() {
        let config = PipelineConfig {
            trending_gate: 1.5,
            ..PipelineConfig::default()
        };
        assert!(config.validate().is_err());
        let config = PipelineConfig {
            trending_gate: -0.1,
            ..PipelineConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
