//! Article persistence behind a narrow async trait.
//!
//! The pipeline only ever needs four operations: lookup by canonical URL,
//! insert, a view-count bump, and aggregate statistics. Two
//! implementations are provided: [`MemoryRepository`] for tests and
//! ephemeral runs, and [`JsonFileRepository`], which keeps the whole store
//! as one pretty-printed JSON file rewritten on every mutation. Article
//! volumes here are small enough that rewriting beats the bookkeeping of
//! an incremental format.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::error::{PipelineError, Result};
use crate::models::{Article, RepoStats};

/// The four persistence operations the pipeline relies on.
///
/// `insert` must reject an article whose URL is already stored; callers
/// are expected to check [`ArticleRepository::find_by_url`] before doing
/// heavy work, and treat the insert-time rejection as a duplicate, not a
/// failure.
#[async_trait]
pub trait ArticleRepository: Send + Sync {
    async fn find_by_url(&self, url: &str) -> Result<Option<Article>>;
    async fn insert(&self, article: Article) -> Result<Article>;
    async fn increment_views(&self, id: i64) -> Result<()>;
    async fn stats(&self) -> Result<RepoStats>;
}

#[derive(Debug, Serialize, Deserialize)]
struct StoreState {
    next_id: i64,
    articles: Vec<Article>,
}

impl Default for StoreState {
    fn default() -> Self {
        Self {
            next_id: 1,
            articles: Vec::new(),
        }
    }
}

impl StoreState {
    fn find_by_url(&self, url: &str) -> Option<Article> {
        self.articles.iter().find(|a| a.url == url).cloned()
    }

    fn insert(&mut self, mut article: Article) -> Result<Article> {
        if self.articles.iter().any(|a| a.url == article.url) {
            return Err(PipelineError::AlreadyStored(article.url));
        }
        article.id = Some(self.next_id);
        self.next_id += 1;
        self.articles.push(article.clone());
        Ok(article)
    }

    fn increment_views(&mut self, id: i64) -> Result<()> {
        let article = self
            .articles
            .iter_mut()
            .find(|a| a.id == Some(id))
            .ok_or_else(|| PipelineError::Storage(format!("no article with id {id}")))?;
        article.views += 1;
        Ok(())
    }

    fn stats(&self) -> RepoStats {
        let now = Utc::now();
        let cutoff = now - Duration::hours(24);
        let mut by_category: BTreeMap<String, usize> = BTreeMap::new();
        for article in &self.articles {
            *by_category
                .entry(article.category.as_str().to_string())
                .or_default() += 1;
        }
        RepoStats {
            total_articles: self.articles.len(),
            recent_articles: self.articles.iter().filter(|a| a.scraped_at >= cutoff).count(),
            trending_articles: self.articles.iter().filter(|a| a.is_trending).count(),
            by_category,
            last_updated: now,
        }
    }
}

/// In-memory store. Used by tests and by runs that do not need articles
/// to survive the process.
#[derive(Default)]
pub struct MemoryRepository {
    state: RwLock<StoreState>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ArticleRepository for MemoryRepository {
    async fn find_by_url(&self, url: &str) -> Result<Option<Article>> {
        Ok(self.state.read().await.find_by_url(url))
    }

    async fn insert(&self, article: Article) -> Result<Article> {
        self.state.write().await.insert(article)
    }

    async fn increment_views(&self, id: i64) -> Result<()> {
        self.state.write().await.increment_views(id)
    }

    async fn stats(&self) -> Result<RepoStats> {
        Ok(self.state.read().await.stats())
    }
}

/// File-backed store: one JSON document holding every article, rewritten
/// after each mutation while the write lock is held.
pub struct JsonFileRepository {
    path: PathBuf,
    state: RwLock<StoreState>,
}

impl JsonFileRepository {
    /// Open the store at `path`, creating an empty one if the file does
    /// not exist. A file that exists but fails to parse is an error;
    /// silently starting fresh would lose data.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let state: StoreState = match tokio::fs::read_to_string(&path).await {
            Ok(text) => serde_json::from_str(&text)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => StoreState::default(),
            Err(e) => return Err(e.into()),
        };
        info!(
            path = %path.display(),
            articles = state.articles.len(),
            "Opened article store"
        );
        Ok(Self {
            path,
            state: RwLock::new(state),
        })
    }

    async fn persist(&self, state: &StoreState) -> Result<()> {
        let json = serde_json::to_string_pretty(state)?;
        tokio::fs::write(&self.path, json).await?;
        Ok(())
    }
}

#[async_trait]
impl ArticleRepository for JsonFileRepository {
    async fn find_by_url(&self, url: &str) -> Result<Option<Article>> {
        Ok(self.state.read().await.find_by_url(url))
    }

    async fn insert(&self, article: Article) -> Result<Article> {
        let mut state = self.state.write().await;
        let stored = state.insert(article)?;
        self.persist(&state).await?;
        debug!(id = ?stored.id, url = %stored.url, "Article persisted");
        Ok(stored)
    }

    async fn increment_views(&self, id: i64) -> Result<()> {
        let mut state = self.state.write().await;
        state.increment_views(id)?;
        self.persist(&state).await
    }

    async fn stats(&self) -> Result<RepoStats> {
        Ok(self.state.read().await.stats())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        AnalysisResult, BiasScores, Category, CredibilityFactors, ExtractionMethod, KeyPhrases,
        PartyAffinity, PoliticalLean, Sentiment,
    };

    fn sample_analysis() -> AnalysisResult {
        AnalysisResult {
            scores: BiasScores {
                overall: 50,
                emotional: 10,
                factual: 20,
                balanced: 5,
            },
            sentiment: Sentiment {
                positive: 20,
                negative: 10,
                neutral: 70,
            },
            indicators: vec![],
            key_phrases: KeyPhrases::default(),
            credibility: CredibilityFactors {
                source_reliability: 70,
                fact_checking: 70,
                transparency: 70,
                author_expertise: 65,
            },
            highlighted_content: String::new(),
        }
    }

    fn sample_article(url: &str, category: Category, trending: bool) -> Article {
        Article {
            id: None,
            title: "Sample headline".to_string(),
            content: "Sample body text.".to_string(),
            excerpt: "Sample body text.".to_string(),
            url: url.to_string(),
            source_name: "The Hindu".to_string(),
            author: "Staff Reporter".to_string(),
            category,
            party_affinity: PartyAffinity::Neutral,
            political_lean: PoliticalLean::Center,
            published_at: Utc::now(),
            scraped_at: Utc::now(),
            extraction_method: ExtractionMethod::Full,
            content_quality: 10,
            word_count: 3,
            read_time_minutes: 1,
            is_trending: trending,
            views: 0,
            analysis: sample_analysis(),
        }
    }

    #[tokio::test]
    async fn test_memory_insert_assigns_ids() {
        let repo = MemoryRepository::new();
        let a = repo
            .insert(sample_article("https://x.example/1", Category::Politics, false))
            .await
            .unwrap();
        let b = repo
            .insert(sample_article("https://x.example/2", Category::Politics, false))
            .await
            .unwrap();
        assert_eq!(a.id, Some(1));
        assert_eq!(b.id, Some(2));
    }

    #[tokio::test]
    async fn test_memory_find_by_url() {
        let repo = MemoryRepository::new();
        repo.insert(sample_article("https://x.example/1", Category::Sports, false))
            .await
            .unwrap();
        let found = repo.find_by_url("https://x.example/1").await.unwrap();
        assert!(found.is_some());
        assert!(repo.find_by_url("https://x.example/2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_memory_rejects_duplicate_url() {
        let repo = MemoryRepository::new();
        repo.insert(sample_article("https://x.example/1", Category::General, false))
            .await
            .unwrap();
        let err = repo
            .insert(sample_article("https://x.example/1", Category::General, false))
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::AlreadyStored(_)));
    }

    #[tokio::test]
    async fn test_memory_increment_views() {
        let repo = MemoryRepository::new();
        let stored = repo
            .insert(sample_article("https://x.example/1", Category::General, false))
            .await
            .unwrap();
        let id = stored.id.unwrap();
        repo.increment_views(id).await.unwrap();
        repo.increment_views(id).await.unwrap();
        let found = repo.find_by_url("https://x.example/1").await.unwrap().unwrap();
        assert_eq!(found.views, 2);

        let missing = repo.increment_views(999).await.unwrap_err();
        assert!(matches!(missing, PipelineError::Storage(_)));
    }

    #[tokio::test]
    async fn test_memory_stats_histogram() {
        let repo = MemoryRepository::new();
        repo.insert(sample_article("https://x.example/1", Category::Politics, true))
            .await
            .unwrap();
        repo.insert(sample_article("https://x.example/2", Category::Politics, false))
            .await
            .unwrap();
        repo.insert(sample_article("https://x.example/3", Category::Sports, false))
            .await
            .unwrap();
        let stats = repo.stats().await.unwrap();
        assert_eq!(stats.total_articles, 3);
        assert_eq!(stats.recent_articles, 3);
        assert_eq!(stats.trending_articles, 1);
        assert_eq!(stats.by_category.get("politics"), Some(&2));
        assert_eq!(stats.by_category.get("sports"), Some(&1));
    }

    #[tokio::test]
    async fn test_json_store_survives_reopen() {
        let path = std::env::temp_dir().join(format!(
            "biaslens-store-reopen-{}.json",
            std::process::id()
        ));
        let _ = tokio::fs::remove_file(&path).await;

        {
            let repo = JsonFileRepository::open(&path).await.unwrap();
            repo.insert(sample_article("https://x.example/1", Category::Business, false))
                .await
                .unwrap();
        }
        let reopened = JsonFileRepository::open(&path).await.unwrap();
        let found = reopened.find_by_url("https://x.example/1").await.unwrap();
        assert!(found.is_some());
        let next = reopened
            .insert(sample_article("https://x.example/2", Category::Business, false))
            .await
            .unwrap();
        // The id counter survives the reopen too.
        assert_eq!(next.id, Some(2));

        tokio::fs::remove_file(&path).await.unwrap();
    }

    #[tokio::test]
    async fn test_json_store_rejects_corrupt_file() {
        let path = std::env::temp_dir().join(format!(
            "biaslens-store-corrupt-{}.json",
            std::process::id()
        ));
        tokio::fs::write(&path, "not json at all").await.unwrap();
        assert!(JsonFileRepository::open(&path).await.is_err());
        tokio::fs::remove_file(&path).await.unwrap();
    }
}
