//! # BiasLens
//!
//! A news ingestion and bias analysis pipeline that polls RSS feeds from
//! Indian news publishers, extracts article bodies from cluttered HTML,
//! scores each article for political bias, sentiment, and credibility, and
//! persists the results to a JSON article store.
//!
//! ## Features
//!
//! - Polls RSS/Atom feeds from a registry of publisher profiles (Times of
//!   India, The Hindu, NDTV, Indian Express, and others)
//! - Extracts article text through a four-strategy ladder, from per-domain
//!   selectors down to a document-wide paragraph scan
//! - Scores bias against per-source priors, splits sentiment, flags bias
//!   indicators, and estimates credibility factors
//! - Classifies category and party affinity from keyword evidence
//! - Ad hoc single-URL analysis alongside the batch ingestion cycle
//!
//! ## Usage
//!
//! ```sh
//! biaslens cycle
//! biaslens analyze https://www.thehindu.com/news/national/article123.ece
//! biaslens --pretty stats
//! ```
//!
//! ## Architecture
//!
//! The application follows a pipeline architecture:
//! 1. **Polling**: Fetch every registered feed sequentially, politely spaced
//! 2. **Extraction**: Download and parse article HTML in bounded batches
//! 3. **Analysis**: Score bias, sentiment, credibility; classify topic and
//!    party affinity
//! 4. **Persistence**: Deduplicate by URL and append to the article store

use std::error::Error;
use std::sync::Arc;

use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::{fmt as tfmt, EnvFilter};

mod analysis;
mod cli;
mod config;
mod error;
mod extractor;
mod feeds;
mod models;
mod pipeline;
mod repository;
mod sources;
mod utils;

use analysis::lexicon::Lexicon;
use cli::{Cli, Commands};
use config::PipelineConfig;
use pipeline::Pipeline;
use repository::JsonFileRepository;
use sources::SourceRegistry;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("biaslens starting up");

    let args = Cli::parse();
    debug!(?args.repo, ?args.sources, ?args.config, "Parsed CLI arguments");

    let registry = match &args.sources {
        Some(path) => SourceRegistry::from_yaml_file(path)?,
        None => SourceRegistry::embedded()?,
    };
    let lexicon = match &args.lexicon {
        Some(path) => Lexicon::from_yaml_file(path)?,
        None => Lexicon::default(),
    };
    let config = match &args.config {
        Some(path) => PipelineConfig::from_yaml_file(path)?,
        None => PipelineConfig::default(),
    };
    info!(
        sources = registry.profiles().len(),
        store = %args.repo,
        "Configuration loaded"
    );

    let repo = Arc::new(JsonFileRepository::open(&args.repo).await?);
    let pipeline = Pipeline::new(Arc::new(registry), &lexicon, Arc::new(config), repo)?;

    match args.command {
        Commands::Cycle => {
            let stats = pipeline.run_cycle().await?;
            print_json(&stats, args.pretty)?;
        }
        Commands::Analyze { url } => {
            let article = pipeline.analyze_url(&url).await?;
            print_json(&article, args.pretty)?;
        }
        Commands::Stats => {
            let stats = pipeline.stats().await?;
            print_json(&stats, args.pretty)?;
        }
    }

    let elapsed = start_time.elapsed();
    info!(
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );

    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T, pretty: bool) -> Result<(), Box<dyn Error>> {
    let rendered = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{rendered}");
    Ok(())
}
