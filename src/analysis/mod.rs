//! Heuristic bias, sentiment, and credibility scoring.
//!
//! [`BiasAnalyzer::analyze`] is pure and deterministic for a fixed
//! [`Lexicon`]: the same title, body, and source always produce the same
//! [`AnalysisResult`]. The numbers are keyword-driven heuristics, not a
//! trained model:
//!
//! - **overall** starts from the publisher's registered prior and shifts
//!   15 points when one major party's vocabulary outweighs the other's by
//!   more than half again
//! - **emotional**, **factual**, and **balanced** are per-word densities
//!   scaled to 0-100
//! - **sentiment** splits lexicon hits into percentages that always sum
//!   to exactly 100
//! - **indicators** are rule-based findings with concrete examples drawn
//!   from the text
//!
//! Topic and party classification ([`BiasAnalyzer::categorize`],
//! [`BiasAnalyzer::party_affinity`]) vote the same keyword tables.

pub mod lexicon;

use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::instrument;

use crate::error::Result;
use crate::models::{
    AnalysisResult, BiasIndicator, BiasPrior, BiasScores, Category, CredibilityFactors, Impact,
    KeyPhrases, PartyAffinity, Sentiment,
};
use crate::sources::SourceRegistry;
use self::lexicon::{CompiledLexicon, Lexicon};

static DIGITS_RX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").unwrap());

/// Reliability assumed for publishers the registry has never heard of.
const DEFAULT_CREDIBILITY: u32 = 70;

pub struct BiasAnalyzer {
    lexicon: CompiledLexicon,
    registry: Arc<SourceRegistry>,
}

impl BiasAnalyzer {
    pub fn new(lexicon: &Lexicon, registry: Arc<SourceRegistry>) -> Result<Self> {
        Ok(Self {
            lexicon: CompiledLexicon::compile(lexicon)?,
            registry,
        })
    }

    /// Score one article. `source_name` selects the bias and reliability
    /// priors; unknown names get center/70.
    #[instrument(level = "debug", skip_all, fields(source = %source_name))]
    pub fn analyze(&self, title: &str, content: &str, source_name: &str) -> AnalysisResult {
        let full_text = format!("{title} {content}").to_lowercase();
        let lower_content = content.to_lowercase();
        let total_words = full_text.split_whitespace().count().max(1);

        let bjp_count = self.lexicon.bjp.count(&full_text);
        let congress_count = self.lexicon.congress.count(&full_text);
        let positive_count = self.lexicon.positive.count(&full_text);
        let negative_count = self.lexicon.negative.count(&full_text);
        let neutral_count = self.lexicon.neutral.count(&full_text);
        let attribution_count = self.lexicon.attribution.count(&full_text);
        let balance_count = self.lexicon.balance.count(&full_text);
        let digits = DIGITS_RX.find_iter(&full_text).count();
        let quotes = full_text.chars().filter(|c| *c == '"' || *c == '\'').count();

        let (prior, base) = self
            .registry
            .profile_by_name(source_name)
            .map(|p| (p.bias_prior, p.credibility_base))
            .unwrap_or((BiasPrior::Center, DEFAULT_CREDIBILITY));

        let mut overall = prior.baseline();
        if bjp_count as f64 > congress_count as f64 * 1.5 {
            overall += 15;
        } else if congress_count as f64 > bjp_count as f64 * 1.5 {
            overall -= 15;
        }
        let scores = BiasScores {
            overall: overall.clamp(0, 100) as u32,
            emotional: ratio_score(positive_count + negative_count, total_words, 1000.0),
            factual: ratio_score(digits + quotes + attribution_count, total_words, 500.0),
            balanced: ratio_score(balance_count, total_words, 1000.0),
        };

        let sentiment = split_sentiment(positive_count, negative_count, neutral_count);

        let key_phrases = KeyPhrases {
            positive: extract_phrases(&full_text, self.lexicon.positive.words()),
            negative: extract_phrases(&full_text, self.lexicon.negative.words()),
            neutral: extract_phrases(&full_text, self.lexicon.neutral.words()),
        };

        let mut indicators = Vec::new();

        let emotional_ratio = (positive_count + negative_count) as f64 / total_words as f64;
        if emotional_ratio > 0.05 {
            let mut examples = self.lexicon.positive.matched_words(&full_text, 3);
            if examples.len() < 3 {
                let room = 3 - examples.len();
                examples.extend(self.lexicon.negative.matched_words(&full_text, room));
            }
            indicators.push(BiasIndicator {
                label: "Loaded Language".to_string(),
                description: "Emotionally charged vocabulary that signals a viewpoint".to_string(),
                impact: if emotional_ratio > 0.1 {
                    Impact::High
                } else {
                    Impact::Medium
                },
                examples,
            });
        }

        let diversity_count = self.lexicon.diversity.count(&lower_content);
        if diversity_count < 2 && content.chars().count() > 500 {
            indicators.push(BiasIndicator {
                label: "Limited Source Diversity".to_string(),
                description: "Few attributed sources for a story of this length".to_string(),
                impact: Impact::Medium,
                examples: vec![
                    "Single-source reporting".to_string(),
                    "No independent verification cited".to_string(),
                ],
            });
        }

        let party_gap = (bjp_count as i64 - congress_count as i64).abs();
        if party_gap > 3 {
            let dominant = if bjp_count > congress_count {
                &self.lexicon.bjp
            } else {
                &self.lexicon.congress
            };
            indicators.push(BiasIndicator {
                label: "Political Framing".to_string(),
                description: "Coverage weighted heavily toward one party's vocabulary".to_string(),
                impact: Impact::High,
                examples: dominant.matched_words(&full_text, 3),
            });
        }

        let attribution_in_content = self.lexicon.attribution.count(&lower_content);
        let factual_ratio = (digits + attribution_in_content) as f64 / total_words as f64;
        if factual_ratio > 0.05 {
            let mut examples = Vec::new();
            if digits > 5 {
                examples.push(format!("{digits} numerical references"));
            }
            if attribution_in_content > 2 {
                examples.push(format!("{attribution_in_content} factual attribution phrases"));
            }
            indicators.push(BiasIndicator {
                label: "High Factual Content".to_string(),
                description: "Dense use of figures and attributed statements".to_string(),
                impact: Impact::Low,
                examples,
            });
        } else if factual_ratio < 0.02 {
            indicators.push(BiasIndicator {
                label: "Limited Factual Content".to_string(),
                description: "Few verifiable figures or attributed statements".to_string(),
                impact: Impact::Medium,
                examples: vec![
                    "Few specific figures".to_string(),
                    "Limited attribution".to_string(),
                    "Opinion-heavy language".to_string(),
                ],
            });
        }

        let verification_count = self.lexicon.verification.count(&lower_content);
        let transparency_count = self.lexicon.transparency.count(&lower_content);
        let credibility = CredibilityFactors {
            source_reliability: base.min(100),
            fact_checking: (base + 2 * (digits + verification_count) as u32).min(100),
            transparency: (base + 3 * transparency_count as u32).min(100),
            author_expertise: base.saturating_sub(5),
        };

        AnalysisResult {
            scores,
            sentiment,
            indicators,
            key_phrases,
            credibility,
            highlighted_content: self.lexicon.highlight(content),
        }
    }

    /// Vote the topic category over title and body. The feed's hint adds
    /// five points to its own category; a category needs more than two
    /// points to displace general.
    pub fn categorize(&self, title: &str, content: &str, hint: Option<Category>) -> Category {
        let text = format!("{title} {content}").to_lowercase();
        let mut best = Category::General;
        let mut max_score = 2usize;
        for (category, set) in &self.lexicon.categories {
            let mut score = set.count(&text);
            if hint == Some(*category) {
                score += 5;
            }
            if score > max_score {
                max_score = score;
                best = *category;
            }
        }
        best
    }

    /// Vote party affinity the same way. The leading party needs at least
    /// two keyword hits, otherwise the article stays neutral.
    pub fn party_affinity(&self, title: &str, content: &str) -> PartyAffinity {
        let text = format!("{title} {content}").to_lowercase();
        let mut best = PartyAffinity::Neutral;
        let mut max_score = 1usize;
        for (party, set) in &self.lexicon.affinity {
            let score = set.count(&text);
            if score > max_score {
                max_score = score;
                best = *party;
            }
        }
        best
    }
}

fn ratio_score(count: usize, total_words: usize, scale: f64) -> u32 {
    let scaled = (count as f64 / total_words as f64 * scale).round();
    scaled.min(100.0) as u32
}

/// Normalize raw sentiment hits into percentages summing to exactly 100.
/// Zero hits across the board reads as fully neutral.
fn split_sentiment(positive: usize, negative: usize, neutral: usize) -> Sentiment {
    let total = (positive + negative + neutral).max(1) as f64;
    let positive_pct = (positive as f64 / total * 100.0).round() as u32;
    let negative_pct = ((negative as f64 / total * 100.0).round() as u32).min(100 - positive_pct);
    Sentiment {
        positive: positive_pct,
        negative: negative_pct,
        neutral: 100 - positive_pct - negative_pct,
    }
}

/// Pull a short window around the first occurrence of each lexicon entry.
/// Windows wider than six words are discarded rather than trimmed.
fn extract_phrases(text: &str, entries: &[String]) -> Vec<String> {
    let mut phrases = Vec::new();
    for entry in entries {
        if phrases.len() >= 5 {
            break;
        }
        if let Some(index) = text.find(entry.as_str()) {
            let start = snap_left(text, index.saturating_sub(20));
            let end = snap_right(text, (index + entry.len() + 20).min(text.len()));
            let phrase = text[start..end].trim();
            if !phrase.is_empty() && phrase.split_whitespace().count() <= 6 {
                phrases.push(phrase.to_string());
            }
        }
    }
    phrases
}

fn snap_left(text: &str, mut i: usize) -> usize {
    while i > 0 && !text.is_char_boundary(i) {
        i -= 1;
    }
    i
}

fn snap_right(text: &str, mut i: usize) -> usize {
    while i < text.len() && !text.is_char_boundary(i) {
        i += 1;
    }
    i
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyzer() -> BiasAnalyzer {
        let registry = Arc::new(SourceRegistry::embedded().unwrap());
        BiasAnalyzer::new(&Lexicon::default(), registry).unwrap()
    }

    const NEUTRAL_BODY: &str = "The committee met on Monday to review the draft rules. \
        Members examined the submissions received during the consultation window and \
        agreed to circulate a revised draft before the next sitting.";

    #[test]
    fn test_scores_stay_in_bounds() {
        let result = analyzer().analyze(
            "Historic breakthrough as markets surge",
            "A remarkable achievement. \"We are pleased,\" officials said. 42 points gained. \
             However, critics doubt the outstanding numbers. Disaster was avoided twice.",
            "Times of India",
        );
        assert!(result.scores.overall <= 100);
        assert!(result.scores.emotional <= 100);
        assert!(result.scores.factual <= 100);
        assert!(result.scores.balanced <= 100);
        let s = result.sentiment;
        assert_eq!(s.positive + s.negative + s.neutral, 100);
    }

    #[test]
    fn test_analysis_is_deterministic() {
        let a = analyzer();
        let first = a.analyze("Modi announces package", NEUTRAL_BODY, "The Hindu");
        let second = a.analyze("Modi announces package", NEUTRAL_BODY, "The Hindu");
        assert_eq!(first, second);
    }

    #[test]
    fn test_overall_starts_from_source_prior() {
        let a = analyzer();
        let left = a.analyze("Draft rules reviewed", NEUTRAL_BODY, "The Hindu");
        let right = a.analyze("Draft rules reviewed", NEUTRAL_BODY, "Zee News");
        let unknown = a.analyze("Draft rules reviewed", NEUTRAL_BODY, "Some Blog");
        assert_eq!(left.scores.overall, 25);
        assert_eq!(right.scores.overall, 75);
        assert_eq!(unknown.scores.overall, 50);
    }

    #[test]
    fn test_party_vocabulary_shifts_overall() {
        let a = analyzer();
        let tilted = a.analyze(
            "Modi lists BJP development record",
            "The bjp campaign stressed vikas and hindutva themes across rallies.",
            "The Hindu",
        );
        // Left prior 25 plus the +15 party shift.
        assert_eq!(tilted.scores.overall, 40);
    }

    #[test]
    fn test_zero_sentiment_hits_read_neutral() {
        let result = analyzer().analyze("Quiet day", "Nothing much happened today.", "The Hindu");
        assert_eq!(result.sentiment.neutral, 100);
        assert_eq!(result.sentiment.positive, 0);
    }

    #[test]
    fn test_factual_score_rises_with_figures() {
        let a = analyzer();
        let factual = a.analyze(
            "Budget numbers",
            "According to the ministry, outlay rose 12 percent to 4200 crore in 2024, \
             data shows. \"The trend is stable,\" a spokesperson said.",
            "Mint",
        );
        let vague = a.analyze("Budget mood", "People feel things are changing somehow.", "Mint");
        assert!(factual.scores.factual > vague.scores.factual);
    }

    #[test]
    fn test_spec_like_headline_scores_center_band() {
        let result = analyzer().analyze(
            "Modi Announces 1.2 Lakh Crore Economic Package for Middle Class",
            "The package includes credit support for small businesses and a housing push.",
            "Times of India",
        );
        assert!((50..=65).contains(&result.scores.overall));
        assert!(result.scores.factual > 0);
    }

    #[test]
    fn test_loaded_language_indicator_fires_high() {
        let result = analyzer().analyze(
            "Remarkable win",
            "A historic breakthrough and a remarkable achievement for the staff.",
            "The Hindu",
        );
        let loaded = result
            .indicators
            .iter()
            .find(|i| i.label == "Loaded Language")
            .unwrap();
        assert_eq!(loaded.impact, Impact::High);
        assert!(!loaded.examples.is_empty());
        assert!(loaded.examples.len() <= 3);
    }

    #[test]
    fn test_political_framing_indicator() {
        let result = analyzer().analyze(
            "Party coverage",
            "modi modi modi modi modi said nothing about the schedule.",
            "The Hindu",
        );
        assert!(result
            .indicators
            .iter()
            .any(|i| i.label == "Political Framing" && i.impact == Impact::High));
    }

    #[test]
    fn test_limited_source_diversity_needs_long_body() {
        let long_body = NEUTRAL_BODY.repeat(4);
        assert!(long_body.chars().count() > 500);
        let result = analyzer().analyze("Draft rules", &long_body, "The Hindu");
        assert!(result
            .indicators
            .iter()
            .any(|i| i.label == "Limited Source Diversity"));

        let short = analyzer().analyze("Draft rules", NEUTRAL_BODY, "The Hindu");
        assert!(!short
            .indicators
            .iter()
            .any(|i| i.label == "Limited Source Diversity"));
    }

    #[test]
    fn test_credibility_anchored_on_source_base() {
        let result = analyzer().analyze("Quiet day", "Nothing much happened.", "The Hindu");
        // The Hindu carries a reliability base of 90.
        assert_eq!(result.credibility.source_reliability, 90);
        assert_eq!(result.credibility.author_expertise, 85);
        assert!(result.credibility.fact_checking >= 90);
        assert!(result.credibility.transparency <= 100);
    }

    #[test]
    fn test_highlighting_marks_lexicon_words() {
        let result = analyzer().analyze(
            "Historic day",
            "A historic decision drew criticism from Congress leaders.",
            "The Hindu",
        );
        assert!(result.highlighted_content.contains("<mark class=\"positive\">historic</mark>"));
        assert!(result
            .highlighted_content
            .contains("<mark class=\"political\">Congress</mark>"));
    }

    #[test]
    fn test_key_phrases_capped_and_short() {
        let body = "remarkable outstanding excellent breakthrough revolutionary historic \
                    unprecedented successful achievement progress boost enhance";
        let result = analyzer().analyze("Adjective parade", body, "The Hindu");
        assert!(result.key_phrases.positive.len() <= 5);
        for phrase in &result.key_phrases.positive {
            assert!(phrase.split_whitespace().count() <= 6);
        }
    }

    #[test]
    fn test_categorize_by_keyword_density() {
        let a = analyzer();
        let category = a.categorize(
            "Series decider tonight",
            "The cricket team sealed a famous victory in the tournament final, with the \
             match turning on a single wicket.",
            None,
        );
        assert_eq!(category, Category::Sports);
    }

    #[test]
    fn test_categorize_defaults_to_general() {
        let a = analyzer();
        let category = a.categorize("Quiet afternoon", "Nothing topical happened here.", None);
        assert_eq!(category, Category::General);
    }

    #[test]
    fn test_categorize_hint_carries_weak_text() {
        let a = analyzer();
        let category = a.categorize(
            "Quiet afternoon",
            "Nothing topical happened here.",
            Some(Category::Sports),
        );
        assert_eq!(category, Category::Sports);
    }

    #[test]
    fn test_categorize_is_idempotent() {
        let a = analyzer();
        let first = a.categorize("Sensex climbs", "Markets rallied as bank shares rose.", None);
        let second = a.categorize("Sensex climbs", "Markets rallied as bank shares rose.", None);
        assert_eq!(first, second);
    }

    #[test]
    fn test_party_affinity_needs_two_hits() {
        let a = analyzer();
        assert_eq!(
            a.party_affinity("One mention", "modi spoke briefly."),
            PartyAffinity::Neutral
        );
        assert_eq!(
            a.party_affinity("Two mentions", "modi praised the bjp manifesto."),
            PartyAffinity::Bjp
        );
    }

    #[test]
    fn test_party_affinity_detects_regional_parties() {
        let a = analyzer();
        let affinity = a.party_affinity(
            "Bengal politics",
            "mamata banerjee said the trinamool campaign would focus on local issues.",
        );
        assert_eq!(affinity, PartyAffinity::Regional);
    }
}
