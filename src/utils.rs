//! Text and randomness helpers shared across the pipeline.
//!
//! This module provides the low-level string machinery used throughout the
//! application:
//! - Whitespace and markup cleanup for feed and article text
//! - Word and sentence accounting for the scoring heuristics
//! - Paragraph recovery for container text that lost its markup
//! - The [`RandomSource`] seam that keeps jitter out of unit tests

use once_cell::sync::Lazy;
use rand::Rng;
use regex::Regex;

static TAG_RX: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").unwrap());
static ENTITY_RX: Lazy<Regex> = Lazy::new(|| Regex::new(r"&[^;]+;").unwrap());
static BLANK_LINES_RX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n\n+").unwrap());
static SENTENCE_BREAK_RX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.\s+[A-Z]").unwrap());

/// Collapse every whitespace run to a single space and trim the ends.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Remove HTML tags and entity references, then collapse whitespace.
///
/// Feed titles and descriptions routinely arrive with embedded markup and
/// `&amp;`-style entities; both are flattened to plain text here.
///
/// # Arguments
///
/// * `text` - Raw text that may contain markup
///
/// # Returns
///
/// Plain text with tags removed and entities replaced by spaces.
pub fn strip_html_tags(text: &str) -> String {
    let without_tags = TAG_RX.replace_all(text, "");
    let without_entities = ENTITY_RX.replace_all(&without_tags, " ");
    collapse_whitespace(&without_entities)
}

/// Clean a single paragraph of extracted article text.
///
/// Collapses whitespace and drops characters outside the set that news
/// prose actually uses (letters, digits, and common punctuation), which
/// strips stray glyphs left behind by widgets and social buttons. Callers
/// clean each paragraph separately and rejoin them with blank lines so the
/// paragraph structure survives.
pub fn clean_fragment(text: &str) -> String {
    let kept: String = text
        .chars()
        .filter(|&c| c.is_alphanumeric() || c.is_whitespace() || "-.,!?;:()[]\"'".contains(c))
        .collect();
    collapse_whitespace(&kept)
}

/// Count whitespace-separated words.
pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Count sentence boundaries: a period followed by whitespace and a capital
/// letter. Used to judge whether a text block reads like prose.
pub fn sentence_breaks(text: &str) -> usize {
    SENTENCE_BREAK_RX.find_iter(text).count()
}

/// Split flat text into paragraph-like segments.
///
/// Blank lines always separate segments. Within a block, a period followed
/// by whitespace and a capital letter is treated as a boundary as well, so
/// container text that lost its markup still comes apart into sentences.
/// The period and whitespace at a boundary are consumed; the capital letter
/// opens the next segment.
///
/// # Arguments
///
/// * `text` - Flattened article text, possibly without any line structure
///
/// # Returns
///
/// Trimmed, non-empty segments in document order.
pub fn split_segments(text: &str) -> Vec<String> {
    let mut segments = Vec::new();
    for block in BLANK_LINES_RX.split(text) {
        let mut start = 0;
        for found in SENTENCE_BREAK_RX.find_iter(block) {
            segments.push(block[start..found.start()].trim().to_string());
            start = found.end() - 1;
        }
        segments.push(block[start..].trim().to_string());
    }
    segments.retain(|s| !s.is_empty());
    segments
}

/// Ratio of distinct words to total words, case-insensitive.
///
/// Navigation strips and tag clouds repeat the same tokens over and over;
/// genuine prose stays well above `0.4`.
pub fn unique_word_ratio(text: &str) -> f64 {
    let words: Vec<String> = text.split_whitespace().map(|w| w.to_lowercase()).collect();
    if words.is_empty() {
        return 1.0;
    }
    let total = words.len();
    let mut distinct = words;
    distinct.sort();
    distinct.dedup();
    distinct.len() as f64 / total as f64
}

/// Truncate to at most `max_chars` characters, appending `...` when
/// anything was cut. Safe on multi-byte text.
pub fn truncate_with_ellipsis(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars).collect();
    format!("{}...", cut)
}

/// Build a short plain-text excerpt from article content.
///
/// # Examples
///
/// ```ignore
/// let summary = excerpt("<p>Long article body ...</p>", 200);
/// ```
pub fn excerpt(content: &str, max_chars: usize) -> String {
    let flat = strip_html_tags(content);
    truncate_with_ellipsis(&flat, max_chars)
}

/// Estimated reading time in minutes at 200 words per minute.
pub fn read_time_minutes(word_count: usize) -> u32 {
    (word_count as f64 / 200.0).ceil() as u32
}

/// Uppercase only the first character, leaving the rest untouched.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(capitalize_first("budget session"), "Budget session");
/// ```
pub fn capitalize_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_uppercase().chain(chars).collect(),
    }
}

/// Source of randomness for the few places the pipeline jitters on purpose:
/// user agent rotation and the trending coin flip.
///
/// Production code uses [`ThreadRandom`]; tests substitute a fixed source
/// so outcomes are reproducible.
pub trait RandomSource: Send + Sync {
    /// Uniform value in `[0, 1)`.
    fn unit(&self) -> f64;

    /// Uniform index in `[0, n)`. `n` of zero or one always yields zero.
    fn pick(&self, n: usize) -> usize;
}

/// [`RandomSource`] backed by the thread-local RNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn unit(&self) -> f64 {
        rand::rng().random()
    }

    fn pick(&self, n: usize) -> usize {
        if n <= 1 { 0 } else { rand::rng().random_range(0..n) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapse_whitespace_flattens_runs() {
        assert_eq!(collapse_whitespace("  one\t two\n\nthree  "), "one two three");
    }

    #[test]
    fn test_strip_html_tags_removes_markup_and_entities() {
        assert_eq!(
            strip_html_tags("<p>Rupee &amp; markets <b>rally</b></p>"),
            "Rupee markets rally"
        );
    }

    #[test]
    fn test_clean_fragment_drops_stray_symbols() {
        assert_eq!(
            clean_fragment("Growth at 7% \u{2605} (est.) \"strong\""),
            "Growth at 7 (est.) \"strong\""
        );
    }

    #[test]
    fn test_clean_fragment_keeps_non_latin_text() {
        assert_eq!(clean_fragment("नमस्ते  world"), "नमस्ते world");
    }

    #[test]
    fn test_split_segments_on_blank_lines() {
        let segments = split_segments("first paragraph\n\n\nsecond paragraph");
        assert_eq!(segments, vec!["first paragraph", "second paragraph"]);
    }

    #[test]
    fn test_split_segments_on_sentence_boundaries() {
        let segments = split_segments("The ministry approved it. Markets rose sharply.");
        assert_eq!(
            segments,
            vec!["The ministry approved it", "Markets rose sharply."]
        );
    }

    #[test]
    fn test_split_segments_drops_empty_pieces() {
        assert!(split_segments("\n\n  \n\n").is_empty());
    }

    #[test]
    fn test_sentence_breaks_counts_boundaries() {
        assert_eq!(sentence_breaks("One here. Two here. three stays"), 2);
    }

    #[test]
    fn test_unique_word_ratio_flags_repetition() {
        let nav = "home home home home home home home home home home home home";
        assert!(unique_word_ratio(nav) < 0.4);
        let prose = "the cabinet cleared a revised budget for rural road construction";
        assert!(unique_word_ratio(prose) > 0.9);
    }

    #[test]
    fn test_truncate_with_ellipsis_respects_char_boundaries() {
        assert_eq!(truncate_with_ellipsis("abcdef", 4), "abcd...");
        assert_eq!(truncate_with_ellipsis("abcd", 4), "abcd");
        assert_eq!(truncate_with_ellipsis("दिल्ली समाचार", 6), "दिल्ली...");
    }

    #[test]
    fn test_excerpt_strips_markup_before_cutting() {
        let body = "<p>Alpha beta</p> <p>gamma</p>";
        assert_eq!(excerpt(body, 200), "Alpha beta gamma");
    }

    #[test]
    fn test_read_time_rounds_up() {
        assert_eq!(read_time_minutes(0), 0);
        assert_eq!(read_time_minutes(199), 1);
        assert_eq!(read_time_minutes(201), 2);
    }

    #[test]
    fn test_capitalize_first_only_touches_first_char() {
        assert_eq!(capitalize_first("budget session news"), "Budget session news");
        assert_eq!(capitalize_first(""), "");
        assert_eq!(capitalize_first("a"), "A");
    }

    #[test]
    fn test_thread_random_stays_in_range() {
        let random = ThreadRandom;
        assert_eq!(random.pick(0), 0);
        assert_eq!(random.pick(1), 0);
        for _ in 0..50 {
            assert!(random.pick(5) < 5);
            let unit = random.unit();
            assert!((0.0..1.0).contains(&unit));
        }
    }
}
