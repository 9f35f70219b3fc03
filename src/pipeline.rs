//! The ingestion pipeline: poll feeds, dedup against the repository,
//! extract and score in bounded batches, classify, persist.
//!
//! One [`Pipeline::run_cycle`] call is one complete pass over every
//! registered feed. Feeds are polled sequentially with a polite delay;
//! candidate articles are then processed in fixed-size concurrent batches,
//! each batch joined before the next starts, so outbound load stays
//! bounded regardless of feed size. Per-item failures are counted, never
//! propagated; the cycle itself only fails when every feed fetch fails.
//!
//! [`Pipeline::analyze_url`] is the ad hoc path: one URL straight through
//! extraction and scoring, with the same repository dedup check first.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use futures::future;
use itertools::Itertools;
use reqwest::redirect::Policy;
use reqwest::Client;
use tokio::time::sleep;
use tracing::{debug, error, info, instrument, warn};
use url::Url;

use crate::analysis::lexicon::Lexicon;
use crate::analysis::BiasAnalyzer;
use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};
use crate::extractor::ContentExtractor;
use crate::feeds::FeedPoller;
use crate::models::{
    AnalysisResult, Article, Category, CycleStats, ExtractionResult, FeedItem, PartyAffinity,
    PoliticalLean, RepoStats,
};
use crate::repository::ArticleRepository;
use crate::sources::SourceRegistry;
use crate::utils::{count_words, excerpt, read_time_minutes, RandomSource, ThreadRandom};

/// What happened to one candidate item within a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ItemOutcome {
    Saved,
    Duplicate,
    Skipped,
    Failed,
}

pub struct Pipeline {
    registry: Arc<SourceRegistry>,
    config: Arc<PipelineConfig>,
    extractor: ContentExtractor,
    analyzer: BiasAnalyzer,
    poller: FeedPoller,
    repo: Arc<dyn ArticleRepository>,
    random: Arc<dyn RandomSource>,
}

impl Pipeline {
    pub fn new(
        registry: Arc<SourceRegistry>,
        lexicon: &Lexicon,
        config: Arc<PipelineConfig>,
        repo: Arc<dyn ArticleRepository>,
    ) -> Result<Self> {
        Self::with_random_source(registry, lexicon, config, repo, Arc::new(ThreadRandom))
    }

    /// Like [`Pipeline::new`] with an explicit randomness source, so tests
    /// can pin the user-agent rotation and the trending gate.
    pub fn with_random_source(
        registry: Arc<SourceRegistry>,
        lexicon: &Lexicon,
        config: Arc<PipelineConfig>,
        repo: Arc<dyn ArticleRepository>,
        random: Arc<dyn RandomSource>,
    ) -> Result<Self> {
        let client = Client::builder().redirect(Policy::limited(10)).build()?;
        let poller = FeedPoller::new(
            client.clone(),
            Arc::clone(&config),
            &registry.source_names(),
        );
        let analyzer = BiasAnalyzer::new(lexicon, Arc::clone(&registry))?;
        let extractor = ContentExtractor::new(
            client,
            Arc::clone(&registry),
            Arc::clone(&config),
            Arc::clone(&random),
        );
        Ok(Self {
            registry,
            config,
            extractor,
            analyzer,
            poller,
            repo,
            random,
        })
    }

    /// Run one full ingestion cycle and return its statistics.
    #[instrument(level = "info", skip_all)]
    pub async fn run_cycle(&self) -> Result<CycleStats> {
        let started = Instant::now();
        let feeds = self.registry.feeds();
        info!(feeds = feeds.len(), "Starting ingestion cycle");

        let mut items: Vec<FeedItem> = Vec::new();
        let mut feed_failures = 0usize;
        for (profile, feed) in &feeds {
            match self.poller.fetch_items(profile, feed).await {
                Ok(batch) => items.extend(batch),
                Err(e) => {
                    warn!(source = %profile.name, feed = %feed.url, error = %e, "Feed fetch failed");
                    feed_failures += 1;
                }
            }
            sleep(Duration::from_millis(self.config.feed_delay_ms)).await;
        }
        if !feeds.is_empty() && feed_failures == feeds.len() {
            return Err(PipelineError::CycleFailed(format!(
                "all {} feed fetches failed",
                feeds.len()
            )));
        }

        // Feeds of the same publisher often repeat stories; drop repeats
        // before spending fetches on them. The repository remains the
        // arbiter of cross-cycle duplicates.
        let candidates: Vec<FeedItem> = items.into_iter().unique_by(|i| i.url.clone()).collect();
        info!(candidates = candidates.len(), "Feed polling complete");

        let mut stats = self.process_candidates(&candidates).await;
        stats.duration_ms = started.elapsed().as_millis() as u64;
        info!(
            processed = stats.processed,
            saved = stats.saved,
            duplicates = stats.duplicates,
            skipped = stats.skipped,
            errors = stats.errors,
            duration_ms = stats.duration_ms,
            "Cycle complete"
        );
        Ok(stats)
    }

    /// Work through candidates in fixed-size batches. Each batch is joined
    /// before the next starts, so at most `max_concurrent_jobs` items are
    /// ever in flight at once.
    async fn process_candidates(&self, candidates: &[FeedItem]) -> CycleStats {
        let mut stats = CycleStats::default();
        let batch_size = self.config.max_concurrent_jobs.max(1);
        for batch in candidates.chunks(batch_size) {
            let outcomes = future::join_all(batch.iter().map(|item| self.process_item(item))).await;
            for outcome in outcomes {
                stats.processed += 1;
                match outcome {
                    ItemOutcome::Saved => stats.saved += 1,
                    ItemOutcome::Duplicate => stats.duplicates += 1,
                    ItemOutcome::Skipped => stats.skipped += 1,
                    ItemOutcome::Failed => stats.errors += 1,
                }
            }
            sleep(Duration::from_millis(self.config.batch_delay_ms)).await;
        }
        stats
    }

    /// Process one candidate: dedup check, extract, score, classify,
    /// persist. Every failure mode maps to an outcome; nothing escapes to
    /// abort the batch.
    async fn process_item(&self, item: &FeedItem) -> ItemOutcome {
        match self.repo.find_by_url(&item.url).await {
            Ok(Some(_)) => {
                debug!(url = %item.url, "Skipping known article");
                return ItemOutcome::Duplicate;
            }
            Ok(None) => {}
            Err(e) => {
                warn!(url = %item.url, error = %e, "Repository lookup failed");
                return ItemOutcome::Failed;
            }
        }

        let extraction = match self.extractor.extract(&item.url).await {
            Ok(extraction) => extraction,
            Err(e) => {
                error!(url = %item.url, error = %e, "Extraction failed");
                return ItemOutcome::Failed;
            }
        };
        if extraction.content.chars().count() < self.config.min_article_chars {
            debug!(url = %item.url, "Body too short after extraction");
            return ItemOutcome::Skipped;
        }

        let analysis =
            self.analyzer
                .analyze(&extraction.title, &extraction.content, &extraction.source_name);
        let category =
            self.analyzer
                .categorize(&extraction.title, &extraction.content, item.topic_hint);
        let affinity = self
            .analyzer
            .party_affinity(&extraction.title, &extraction.content);
        let article = assemble_article(
            extraction,
            analysis,
            category,
            affinity,
            &self.config,
            self.random.as_ref(),
        );

        match self.repo.insert(article).await {
            Ok(stored) => {
                info!(id = ?stored.id, title = %stored.title, "Article saved");
                ItemOutcome::Saved
            }
            Err(PipelineError::AlreadyStored(_)) => {
                debug!(url = %item.url, "Raced another writer to the same URL");
                ItemOutcome::Duplicate
            }
            Err(e) => {
                error!(url = %item.url, error = %e, "Persisting article failed");
                ItemOutcome::Failed
            }
        }
    }

    /// Ad hoc single-URL analysis. A URL already in the repository is
    /// served from the store with its view count bumped; persistence
    /// failures degrade to a warning rather than losing the analysis.
    #[instrument(level = "info", skip_all, fields(url = %raw_url))]
    pub async fn analyze_url(&self, raw_url: &str) -> Result<Article> {
        let parsed =
            Url::parse(raw_url).map_err(|_| PipelineError::InvalidUrl(raw_url.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(PipelineError::InvalidUrl(raw_url.to_string()));
        }

        if let Some(mut existing) = self.repo.find_by_url(raw_url).await? {
            debug!("Serving stored analysis");
            if let Some(id) = existing.id {
                match self.repo.increment_views(id).await {
                    Ok(()) => existing.views += 1,
                    Err(e) => warn!(error = %e, "View-count bump failed"),
                }
            }
            return Ok(existing);
        }

        let extraction = self.extractor.extract(raw_url).await?;
        let chars = extraction.content.chars().count();
        if chars < self.config.min_analyze_chars {
            return Err(PipelineError::Insufficient(format!(
                "{raw_url} ({chars} characters)"
            )));
        }

        let analysis =
            self.analyzer
                .analyze(&extraction.title, &extraction.content, &extraction.source_name);
        let category = self
            .analyzer
            .categorize(&extraction.title, &extraction.content, None);
        let affinity = self
            .analyzer
            .party_affinity(&extraction.title, &extraction.content);
        let article = assemble_article(
            extraction,
            analysis,
            category,
            affinity,
            &self.config,
            self.random.as_ref(),
        );

        match self.repo.insert(article.clone()).await {
            Ok(stored) => Ok(stored),
            Err(PipelineError::AlreadyStored(_)) => Ok(article),
            Err(e) => {
                warn!(error = %e, "Could not persist ad hoc analysis");
                Ok(article)
            }
        }
    }

    pub async fn stats(&self) -> Result<RepoStats> {
        self.repo.stats().await
    }
}

/// Combine extraction and analysis into the persisted article record.
///
/// The trending flag needs all three of: recency under the configured
/// horizon, a strong emotional or extreme-bias signal, and a random draw
/// clearing the sampling gate.
fn assemble_article(
    extraction: ExtractionResult,
    analysis: AnalysisResult,
    category: Category,
    affinity: PartyAffinity,
    config: &PipelineConfig,
    random: &dyn RandomSource,
) -> Article {
    let now = Utc::now();
    let word_count = count_words(&extraction.content);
    let excerpt_text = excerpt(&extraction.content, 200);
    let content_quality = (extraction.content.chars().count() / 100).min(100) as u32;

    let scores = analysis.scores;
    let age_hours = (now - extraction.published_at).num_hours();
    let strong_signal = scores.emotional > 40 || scores.overall < 30 || scores.overall > 70;
    let is_trending = age_hours < config.trending_recency_hours
        && strong_signal
        && random.unit() > config.trending_gate;

    Article {
        id: None,
        title: extraction.title,
        content: extraction.content,
        excerpt: excerpt_text,
        url: extraction.url,
        source_name: extraction.source_name,
        author: extraction.author,
        category,
        party_affinity: affinity,
        political_lean: PoliticalLean::from_overall(scores.overall),
        published_at: extraction.published_at,
        scraped_at: now,
        extraction_method: extraction.method,
        content_quality,
        word_count,
        read_time_minutes: read_time_minutes(word_count),
        is_trending,
        views: 0,
        analysis,
    }
}
