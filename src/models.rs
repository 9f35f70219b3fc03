//! Data models for feed items, extracted articles, and analysis output.
//!
//! This module defines the core data structures used throughout the application:
//! - [`FeedItem`]: A candidate article discovered while polling RSS feeds
//! - [`ExtractionResult`]: Title, body, and byline recovered from an article page
//! - [`AnalysisResult`]: Bias, sentiment, and credibility profile for one article
//! - [`Article`]: The persisted record combining extraction and analysis
//! - [`CycleStats`] / [`RepoStats`]: Counters reported by the ingestion cycle
//!   and the article store
//!
//! All scores live on a 0-100 scale. Enum values serialize as lowercase
//! strings (kebab-case for [`BiasPrior`]) so they read naturally in JSON and
//! YAML.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Editorial topic assigned to an article.
///
/// Categories are decided by keyword voting over the title and body; a feed
/// may carry a topic hint that boosts its own category during the vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Politics,
    Business,
    Sports,
    Opinion,
    General,
}

impl Category {
    /// Stable lowercase name, used as a histogram key in [`RepoStats`].
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Politics => "politics",
            Category::Business => "business",
            Category::Sports => "sports",
            Category::Opinion => "opinion",
            Category::General => "general",
        }
    }
}

/// Which political camp an article's vocabulary leans toward, if any.
///
/// Requires at least two keyword hits for the leading camp; anything weaker
/// stays [`PartyAffinity::Neutral`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartyAffinity {
    Bjp,
    Congress,
    Aap,
    Regional,
    Neutral,
}

impl PartyAffinity {
    pub fn as_str(&self) -> &'static str {
        match self {
            PartyAffinity::Bjp => "bjp",
            PartyAffinity::Congress => "congress",
            PartyAffinity::Aap => "aap",
            PartyAffinity::Regional => "regional",
            PartyAffinity::Neutral => "neutral",
        }
    }
}

/// Editorial stance attributed to a publisher in the source registry.
///
/// The prior seeds the overall bias score before keyword evidence shifts it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BiasPrior {
    Left,
    Center,
    CenterRight,
    Right,
}

impl BiasPrior {
    /// Baseline overall bias score for this stance, on the 0 (left) to
    /// 100 (right) scale.
    pub fn baseline(&self) -> i64 {
        match self {
            BiasPrior::Left => 25,
            BiasPrior::Center => 50,
            BiasPrior::CenterRight => 60,
            BiasPrior::Right => 75,
        }
    }
}

/// Coarse left/center/right label derived from the overall bias score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PoliticalLean {
    Left,
    Center,
    Right,
}

impl PoliticalLean {
    /// Map an overall bias score to a lean: below 40 is left, above 60 is
    /// right, everything between is center.
    pub fn from_overall(overall: u32) -> Self {
        if overall < 40 {
            PoliticalLean::Left
        } else if overall > 60 {
            PoliticalLean::Right
        } else {
            PoliticalLean::Center
        }
    }
}

/// How the article body was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionMethod {
    /// The browser-style fetch returned genuine page content.
    Full,
    /// The retry with the lightweight bot profile returned content.
    Alternative,
    /// Both fetches came back empty or blocked; the body is synthetic.
    Fallback,
}

impl ExtractionMethod {
    pub fn is_fallback(&self) -> bool {
        matches!(self, ExtractionMethod::Fallback)
    }
}

/// A candidate article discovered in an RSS feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedItem {
    /// Headline after publisher-suffix cleanup.
    pub title: String,
    /// Canonical article URL, used for deduplication.
    pub url: String,
    /// Short description with markup and entities stripped.
    pub description: String,
    /// Publication time from the feed, or the poll time when absent.
    pub published_at: DateTime<Utc>,
    /// Registry name of the publisher the feed belongs to.
    pub source_name: String,
    /// Topic the feed is dedicated to, if any; boosts category voting.
    pub topic_hint: Option<Category>,
}

/// Everything the extractor recovered from one article page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub url: String,
    /// Registry name of the publisher, or one derived from the host.
    pub source_name: String,
    pub title: String,
    /// Article body as paragraphs joined by blank lines.
    pub content: String,
    pub author: String,
    pub published_at: DateTime<Utc>,
    pub method: ExtractionMethod,
}

/// The four bias sub-scores, each 0-100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BiasScores {
    /// Political position: 0 is far left, 100 is far right, 50 is neutral.
    pub overall: u32,
    /// Density of emotionally charged vocabulary.
    pub emotional: u32,
    /// Density of numbers, quotes, and attribution phrases.
    pub factual: u32,
    /// Density of balance markers (however, critics, supporters, ...).
    pub balanced: u32,
}

/// Sentiment split as percentages. The three fields always sum to 100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sentiment {
    pub positive: u32,
    pub negative: u32,
    pub neutral: u32,
}

/// How strongly a bias indicator is expected to color the reader's view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Impact {
    Low,
    Medium,
    High,
}

/// A single named finding from the bias analysis, e.g. loaded language or
/// one-sided political framing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BiasIndicator {
    pub label: String,
    pub description: String,
    pub impact: Impact,
    /// Concrete evidence: matched keywords or short factual notes.
    pub examples: Vec<String>,
}

/// Credibility sub-scores, each anchored on the publisher's registry
/// reliability and adjusted by in-text evidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredibilityFactors {
    pub source_reliability: u32,
    pub fact_checking: u32,
    pub transparency: u32,
    pub author_expertise: u32,
}

/// Short text windows around matched sentiment vocabulary, grouped by tone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeyPhrases {
    pub positive: Vec<String>,
    pub negative: Vec<String>,
    pub neutral: Vec<String>,
}

/// Complete analysis profile for one article.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub scores: BiasScores,
    pub sentiment: Sentiment,
    pub indicators: Vec<BiasIndicator>,
    pub key_phrases: KeyPhrases,
    pub credibility: CredibilityFactors,
    /// Article body with `<mark>` wraps around charged and political terms.
    pub highlighted_content: String,
}

/// The persisted article record.
///
/// `id` is `None` until the repository assigns one on insert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub id: Option<i64>,
    pub title: String,
    pub content: String,
    /// First 200 characters of the body, for list views.
    pub excerpt: String,
    pub url: String,
    pub source_name: String,
    pub author: String,
    pub category: Category,
    pub party_affinity: PartyAffinity,
    pub political_lean: PoliticalLean,
    pub published_at: DateTime<Utc>,
    pub scraped_at: DateTime<Utc>,
    pub extraction_method: ExtractionMethod,
    /// Body length in characters divided by 100, capped at 100.
    pub content_quality: u32,
    pub word_count: usize,
    /// Estimated reading time at 200 words per minute.
    pub read_time_minutes: u32,
    /// Recent plus emotionally engaging, gated by a coin flip.
    pub is_trending: bool,
    pub views: u64,
    pub analysis: AnalysisResult,
}

/// Counters for one ingestion cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleStats {
    /// Feed items that entered processing after deduplication.
    pub processed: usize,
    /// Articles stored this cycle.
    pub saved: usize,
    /// Items already present in the repository.
    pub duplicates: usize,
    /// Items whose extracted body was too thin to analyze.
    pub skipped: usize,
    /// Items that failed to fetch, parse, or store.
    pub errors: usize,
    pub duration_ms: u64,
}

/// Aggregate repository statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepoStats {
    pub total_articles: usize,
    /// Articles stored within the last 24 hours.
    pub recent_articles: usize,
    pub trending_articles: usize,
    /// Article count per category name, in stable alphabetical order.
    pub by_category: BTreeMap<String, usize>,
    pub last_updated: DateTime<Utc>,
}
