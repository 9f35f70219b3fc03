//! Command-line interface definitions for BiasLens.
//!
//! This module defines the CLI arguments and subcommands using the `clap`
//! crate. Global flags select the article store and optional configuration
//! overrides; the subcommand picks the operation.

use clap::{Parser, Subcommand};

/// Command-line arguments for the BiasLens application.
///
/// Global options choose where articles are stored and which configuration
/// files override the embedded defaults. Each subcommand is one operation:
/// a full ingestion cycle, a single-URL analysis, or store statistics.
///
/// # Examples
///
/// ```sh
/// # Poll every registered feed and ingest new articles
/// biaslens cycle
///
/// # Score one article ad hoc
/// biaslens analyze https://www.thehindu.com/news/national/article123.ece
///
/// # Store statistics, pretty-printed
/// biaslens --pretty stats
///
/// # Custom store location and source roster
/// biaslens -r /var/lib/biaslens/articles.json --sources ./sources.yaml cycle
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Path to the JSON article store
    #[arg(short, long, default_value = "articles.json")]
    pub repo: String,

    /// Optional path to a sources.yaml overriding the embedded roster
    #[arg(long)]
    pub sources: Option<String>,

    /// Optional path to a lexicon.yaml overriding the built-in keyword lists
    #[arg(long)]
    pub lexicon: Option<String>,

    /// Optional path to a config.yaml with pipeline tuning overrides
    #[arg(short, long)]
    pub config: Option<String>,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Poll all registered feeds and ingest new articles
    Cycle,
    /// Extract and score a single article URL
    Analyze {
        /// The article URL to analyze
        url: String,
    },
    /// Print statistics about the article store
    Stats,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["biaslens", "cycle"]);

        assert_eq!(cli.repo, "articles.json");
        assert!(cli.sources.is_none());
        assert!(cli.lexicon.is_none());
        assert!(cli.config.is_none());
        assert!(!cli.pretty);
        assert!(matches!(cli.command, Commands::Cycle));
    }

    #[test]
    fn test_cli_analyze_subcommand() {
        let cli = Cli::parse_from([
            "biaslens",
            "--pretty",
            "analyze",
            "https://example.com/story",
        ]);

        assert!(cli.pretty);
        match cli.command {
            Commands::Analyze { url } => assert_eq!(url, "https://example.com/story"),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_cli_short_flags() {
        let cli = Cli::parse_from([
            "biaslens",
            "-r",
            "/tmp/articles.json",
            "-c",
            "/tmp/config.yaml",
            "stats",
        ]);

        assert_eq!(cli.repo, "/tmp/articles.json");
        assert_eq!(cli.config.as_deref(), Some("/tmp/config.yaml"));
        assert!(matches!(cli.command, Commands::Stats));
    }
}
