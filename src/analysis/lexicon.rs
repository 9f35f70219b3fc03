//! Keyword corpora driving every analysis heuristic, and their compiled
//! regex form.
//!
//! The lists live in a [`Lexicon`] so they can be versioned and tuned as
//! data: the built-in tables are the defaults, and any subset can be
//! overridden from a YAML file without recompiling. [`CompiledLexicon`]
//! turns each list into a case-insensitive word-boundary matcher once, at
//! startup.

use std::collections::HashMap;
use std::path::Path;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{PipelineError, Result};
use crate::models::{Category, PartyAffinity};

fn words(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

/// The raw keyword tables. Every field is a plain list of lowercase words
/// or phrases; omitted fields in an override file keep their defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Lexicon {
    /// Full party vocabularies used for bias scoring and highlighting.
    pub bjp: Vec<String>,
    pub congress: Vec<String>,
    pub aap: Vec<String>,
    /// Sentiment vocabularies.
    pub positive: Vec<String>,
    pub negative: Vec<String>,
    pub neutral: Vec<String>,
    /// Attribution phrases feeding the factual score.
    pub attribution: Vec<String>,
    /// Phrases counted for the source-diversity indicator.
    pub diversity: Vec<String>,
    /// Phrases counted for the transparency credibility factor.
    pub transparency: Vec<String>,
    /// Phrases counted for the fact-checking credibility factor.
    pub verification: Vec<String>,
    /// Contrastive markers feeding the balance score.
    pub balance: Vec<String>,
    /// Short, high-precision lists used only for party-affinity voting.
    pub affinity_bjp: Vec<String>,
    pub affinity_congress: Vec<String>,
    pub affinity_aap: Vec<String>,
    pub affinity_regional: Vec<String>,
    /// Topic vocabularies for category voting.
    pub category_politics: Vec<String>,
    pub category_business: Vec<String>,
    pub category_sports: Vec<String>,
    pub category_opinion: Vec<String>,
}

impl Default for Lexicon {
    fn default() -> Self {
        Self {
            bjp: words(&[
                "modi",
                "bjp",
                "bharatiya janata party",
                "saffron",
                "hindutva",
                "nationalism",
                "development",
                "digital india",
                "make in india",
                "atmanirbhar",
                "vikas",
            ]),
            congress: words(&[
                "congress",
                "rahul gandhi",
                "sonia gandhi",
                "secular",
                "inclusive",
                "social justice",
                "minorities",
                "farmers",
                "employment",
            ]),
            aap: words(&[
                "aap",
                "arvind kejriwal",
                "aam aadmi",
                "corruption",
                "transparency",
                "education",
                "healthcare",
                "common man",
            ]),
            positive: words(&[
                "remarkable",
                "outstanding",
                "excellent",
                "breakthrough",
                "revolutionary",
                "historic",
                "unprecedented",
                "successful",
                "achievement",
                "progress",
                "boost",
                "enhance",
                "strengthen",
                "improve",
                "advance",
            ]),
            negative: words(&[
                "disaster",
                "failure",
                "crisis",
                "scandal",
                "controversy",
                "alarming",
                "devastating",
                "shocking",
                "outrageous",
                "condemn",
                "criticize",
                "attack",
                "slam",
                "blast",
                "question",
                "doubt",
            ]),
            neutral: words(&[
                "announced",
                "stated",
                "reported",
                "according",
                "officials",
                "government",
                "policy",
                "implementation",
                "measures",
                "initiative",
            ]),
            attribution: words(&[
                "according to",
                "officials said",
                "data shows",
                "study reveals",
                "research indicates",
                "statistics show",
                "report states",
                "survey found",
                "analysis shows",
            ]),
            diversity: words(&["according to", "officials said", "sources", "spokesperson"]),
            transparency: words(&["according to", "sources", "officials", "spokesperson"]),
            verification: words(&["according to", "data shows", "study reveals"]),
            balance: words(&["however", "but", "although", "while", "critics", "supporters"]),
            affinity_bjp: words(&[
                "modi",
                "bjp",
                "bharatiya janata",
                "saffron",
                "hindutva",
                "nationalism",
            ]),
            affinity_congress: words(&[
                "congress",
                "rahul gandhi",
                "sonia gandhi",
                "secular",
                "inclusive",
            ]),
            affinity_aap: words(&[
                "aap",
                "arvind kejriwal",
                "aam aadmi",
                "corruption",
                "transparency",
            ]),
            affinity_regional: words(&[
                "trinamool",
                "tmc",
                "mamata banerjee",
                "dmk",
                "aiadmk",
                "shiv sena",
                "nitish kumar",
                "akali dal",
            ]),
            category_politics: words(&[
                "parliament",
                "election",
                "modi",
                "congress",
                "bjp",
                "government",
                "minister",
                "policy",
                "politics",
                "vote",
                "campaign",
                "party",
                "opposition",
                "ruling",
                "cabinet",
                "lok sabha",
                "rajya sabha",
                "assembly",
                "chief minister",
                "governor",
                "supreme court",
                "high court",
                "constitution",
                "law",
                "bill",
                "amendment",
            ]),
            category_business: words(&[
                "economy",
                "gdp",
                "market",
                "stock",
                "business",
                "finance",
                "investment",
                "bank",
                "rupee",
                "inflation",
                "trade",
                "export",
                "import",
                "industry",
                "corporate",
                "company",
                "revenue",
                "profit",
                "loss",
                "economic",
                "financial",
                "rbi",
                "reserve bank",
                "sensex",
                "nifty",
                "bse",
                "nse",
                "startup",
                "ipo",
                "merger",
                "acquisition",
                "quarterly",
                "earnings",
                "shares",
                "dividend",
            ]),
            category_sports: words(&[
                "cricket",
                "football",
                "hockey",
                "tennis",
                "badminton",
                "olympics",
                "match",
                "tournament",
                "championship",
                "world cup",
                "ipl",
                "premier league",
                "fifa",
                "athlete",
                "player",
                "coach",
                "team",
                "score",
                "goal",
                "wicket",
                "run",
                "medal",
                "victory",
                "defeat",
                "sports",
                "game",
                "league",
                "season",
            ]),
            category_opinion: words(&[
                "opinion",
                "editorial",
                "analysis",
                "commentary",
                "perspective",
                "viewpoint",
                "column",
                "op-ed",
                "debate",
                "discussion",
                "argument",
                "critique",
                "review",
            ]),
        }
    }
}

impl Lexicon {
    /// Load keyword tables from a YAML file. Fields absent from the file
    /// keep their built-in defaults.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let lexicon = Self::from_yaml(&text)?;
        debug!(path = %path.as_ref().display(), "Loaded lexicon overrides");
        Ok(lexicon)
    }

    fn from_yaml(text: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(text)?)
    }
}

/// One keyword list compiled into a case-insensitive, word-boundary
/// matcher. Longer entries sort first in the alternation so phrases beat
/// their own prefixes.
pub(crate) struct KeywordSet {
    words: Vec<String>,
    rx: Option<Regex>,
}

impl KeywordSet {
    fn compile(list: &[String], label: &str) -> Result<Self> {
        let words: Vec<String> = list.iter().map(|w| w.to_lowercase()).collect();
        let rx = if words.is_empty() {
            None
        } else {
            let mut sorted = words.clone();
            sorted.sort_by(|a, b| b.len().cmp(&a.len()));
            let alternation: Vec<String> = sorted.iter().map(|w| regex::escape(w)).collect();
            let pattern = format!(r"(?i)\b(?:{})\b", alternation.join("|"));
            Some(Regex::new(&pattern).map_err(|e| {
                PipelineError::Config(format!("keyword list {label}: {e}"))
            })?)
        };
        Ok(Self { words, rx })
    }

    /// Number of matches in `text`.
    pub(crate) fn count(&self, text: &str) -> usize {
        self.rx.as_ref().map_or(0, |rx| rx.find_iter(text).count())
    }

    /// The list entries present in the lowercased `text`, capped.
    pub(crate) fn matched_words(&self, lower_text: &str, cap: usize) -> Vec<String> {
        self.words
            .iter()
            .filter(|w| lower_text.contains(w.as_str()))
            .take(cap)
            .cloned()
            .collect()
    }

    pub(crate) fn words(&self) -> &[String] {
        &self.words
    }
}

/// All keyword sets in compiled form, plus the combined highlighter.
pub struct CompiledLexicon {
    pub(crate) bjp: KeywordSet,
    pub(crate) congress: KeywordSet,
    pub(crate) aap: KeywordSet,
    pub(crate) positive: KeywordSet,
    pub(crate) negative: KeywordSet,
    pub(crate) neutral: KeywordSet,
    pub(crate) attribution: KeywordSet,
    pub(crate) diversity: KeywordSet,
    pub(crate) transparency: KeywordSet,
    pub(crate) verification: KeywordSet,
    pub(crate) balance: KeywordSet,
    /// Affinity voting order is fixed; ties go to the earlier party.
    pub(crate) affinity: [(PartyAffinity, KeywordSet); 4],
    /// Category voting order is fixed; ties go to the earlier category.
    pub(crate) categories: [(Category, KeywordSet); 4],
    highlight_classes: HashMap<String, &'static str>,
    highlight_rx: Option<Regex>,
}

impl CompiledLexicon {
    pub fn compile(lexicon: &Lexicon) -> Result<Self> {
        // Later inserts win, so precedence is positive over negative over
        // political for words appearing in more than one list.
        let mut highlight_classes: HashMap<String, &'static str> = HashMap::new();
        for word in lexicon
            .bjp
            .iter()
            .chain(&lexicon.congress)
            .chain(&lexicon.aap)
        {
            highlight_classes.insert(word.to_lowercase(), "political");
        }
        for word in &lexicon.negative {
            highlight_classes.insert(word.to_lowercase(), "negative");
        }
        for word in &lexicon.positive {
            highlight_classes.insert(word.to_lowercase(), "positive");
        }
        let highlight_rx = if highlight_classes.is_empty() {
            None
        } else {
            let mut all: Vec<&String> = highlight_classes.keys().collect();
            all.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
            let alternation: Vec<String> = all.iter().map(|w| regex::escape(w)).collect();
            let pattern = format!(r"(?i)\b(?:{})\b", alternation.join("|"));
            Some(Regex::new(&pattern).map_err(|e| {
                PipelineError::Config(format!("highlight pattern: {e}"))
            })?)
        };

        Ok(Self {
            bjp: KeywordSet::compile(&lexicon.bjp, "bjp")?,
            congress: KeywordSet::compile(&lexicon.congress, "congress")?,
            aap: KeywordSet::compile(&lexicon.aap, "aap")?,
            positive: KeywordSet::compile(&lexicon.positive, "positive")?,
            negative: KeywordSet::compile(&lexicon.negative, "negative")?,
            neutral: KeywordSet::compile(&lexicon.neutral, "neutral")?,
            attribution: KeywordSet::compile(&lexicon.attribution, "attribution")?,
            diversity: KeywordSet::compile(&lexicon.diversity, "diversity")?,
            transparency: KeywordSet::compile(&lexicon.transparency, "transparency")?,
            verification: KeywordSet::compile(&lexicon.verification, "verification")?,
            balance: KeywordSet::compile(&lexicon.balance, "balance")?,
            affinity: [
                (
                    PartyAffinity::Bjp,
                    KeywordSet::compile(&lexicon.affinity_bjp, "affinity_bjp")?,
                ),
                (
                    PartyAffinity::Congress,
                    KeywordSet::compile(&lexicon.affinity_congress, "affinity_congress")?,
                ),
                (
                    PartyAffinity::Aap,
                    KeywordSet::compile(&lexicon.affinity_aap, "affinity_aap")?,
                ),
                (
                    PartyAffinity::Regional,
                    KeywordSet::compile(&lexicon.affinity_regional, "affinity_regional")?,
                ),
            ],
            categories: [
                (
                    Category::Politics,
                    KeywordSet::compile(&lexicon.category_politics, "category_politics")?,
                ),
                (
                    Category::Business,
                    KeywordSet::compile(&lexicon.category_business, "category_business")?,
                ),
                (
                    Category::Sports,
                    KeywordSet::compile(&lexicon.category_sports, "category_sports")?,
                ),
                (
                    Category::Opinion,
                    KeywordSet::compile(&lexicon.category_opinion, "category_opinion")?,
                ),
            ],
            highlight_classes,
            highlight_rx,
        })
    }

    /// Wrap every lexicon match in the original-case body with a
    /// category-tagged `<mark>` element.
    pub(crate) fn highlight(&self, content: &str) -> String {
        let Some(rx) = &self.highlight_rx else {
            return content.to_string();
        };
        rx.replace_all(content, |caps: &regex::Captures| {
            let matched = &caps[0];
            let class = self
                .highlight_classes
                .get(&matched.to_lowercase())
                .copied()
                .unwrap_or("political");
            format!("<mark class=\"{class}\">{matched}</mark>")
        })
        .into_owned()
    }
}
