//! Body extraction strategies, tried in order of trust:
//!
//! 1. **Domain selectors**: the publisher's tuned content selectors
//! 2. **Main containers**: semantic containers common across news sites
//! 3. **Scored block**: every plausible container scored by prose density,
//!    best one wins
//! 4. **Paragraph scan**: all `<p>` tags on the page, filtered hard
//!
//! A strategy's output is accepted once it clears the configured length
//! floor. Every strategy shares the same paragraph validity filter (length,
//! word count, boilerplate patterns, navigation heuristics, repetition) and
//! the same notion of which page regions are off limits.
//!
//! The DOM is never mutated. Instead of deleting ads, navigation, and
//! widgets up front, text collection skips any node sitting inside a
//! stripped subtree, which comes to the same thing.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Node, Selector};
use tracing::debug;

use crate::config::PipelineConfig;
use crate::sources::SelectorProfile;
use crate::utils::{clean_fragment, count_words, sentence_breaks, split_segments, unique_word_ratio};

/// Tags whose subtrees never contribute text.
const STRIPPED_TAGS: [&str; 6] = ["script", "style", "noscript", "iframe", "embed", "object"];

/// Class tokens that mark a subtree as chrome rather than content.
const STRIPPED_CLASSES: [&str; 44] = [
    "ad",
    "ads",
    "advertisement",
    "sponsored",
    "promo",
    "social",
    "share",
    "comments",
    "comment-section",
    "related",
    "recommended",
    "trending",
    "popular",
    "newsletter",
    "subscription",
    "subscribe",
    "footer",
    "header",
    "nav",
    "navigation",
    "menu",
    "sidebar",
    "widget",
    "breadcrumb",
    "tags",
    "tag-list",
    "categories",
    "poll",
    "quiz",
    "survey",
    "vote",
    "gallery",
    "slideshow",
    "carousel",
    "video-player",
    "audio-player",
    "breaking-news",
    "live-blog",
    "live-updates",
    "disclaimer",
    "copyright",
    "terms",
    "mobile-app",
    "download-app",
];

/// Substrings anywhere in the class attribute that mark a stripped subtree.
const STRIPPED_CLASS_FRAGMENTS: [&str; 12] = [
    "ad-",
    "ads-",
    "social-",
    "share-",
    "related-",
    "recommended-",
    "trending-",
    "popular-",
    "newsletter-",
    "subscribe-",
    "comment-",
    "comments-",
];

/// Substrings in the id attribute that mark a stripped subtree.
const STRIPPED_ID_FRAGMENTS: [&str; 2] = ["ad-", "ads-"];

/// Semantic containers tried by the main-container strategy.
const MAIN_SELECTORS: [&str; 14] = [
    "main",
    "article",
    ".main-content",
    ".content-main",
    ".article-main",
    ".story-main",
    "#main-content",
    "#article-content",
    "#story-content",
    "[role=\"main\"]",
    ".post-content",
    ".entry-content",
    ".article-body",
    ".story-body",
];

/// Containers considered by the scored-block strategy.
const CANDIDATE_SELECTORS: [&str; 9] = [
    "div",
    "section",
    "article",
    "main",
    "[class*=\"content\"]",
    "[class*=\"article\"]",
    "[class*=\"story\"]",
    "[class*=\"text\"]",
    "[class*=\"body\"]",
];

/// Lines matching any of these are boilerplate, not article prose.
static EXCLUDE_PATTERNS: Lazy<Regex> = Lazy::new(|| {
    let patterns = [
        "subscribe|subscription|newsletter",
        "advertisement|sponsored|promoted",
        "related articles?|more news|also read",
        "trending|popular|recommended",
        "comments?|share|tweet|facebook",
        "copyright|disclaimer|terms of service",
        "follow us|connect with us|join us",
        "download app|mobile app",
        "breaking news|live updates",
        "poll|quiz|survey",
        "photo gallery|video|watch",
        "tags?:|categories?:",
        "published on|updated on|last modified",
        "read more|view all|see all",
        "click here|register now|sign up",
    ];
    Regex::new(&format!("(?i){}", patterns.join("|"))).unwrap()
});

/// Class/id substrings that disqualify a container candidate outright.
static UNWANTED_CONTAINER_RX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        "(?i)ad|ads|advertisement|sponsored\
         |nav|menu|header|footer|sidebar\
         |social|share|comment|related\
         |trending|popular|recommended\
         |newsletter|subscribe|signup\
         |tag|category|breadcrumb\
         |widget|promo|banner",
    )
    .unwrap()
});

/// Reporting verbs that suggest a container holds actual journalism.
static REPORTING_RX: Lazy<Regex> =
    Lazy::new(|| Regex::new("(?i)said|according|reported|announced|stated").unwrap());

/// Class hints that a container was built to hold the story.
static CLASS_HINT_RX: Lazy<Regex> = Lazy::new(|| Regex::new("(?i)content|article|story").unwrap());

/// Phrases that out a text block as navigation or site chrome.
const NAV_KEYWORDS: [&str; 49] = [
    "subscribe",
    "login",
    "register",
    "menu",
    "navigation",
    "footer",
    "header",
    "advertisement",
    "cookie",
    "privacy policy",
    "terms of service",
    "follow us",
    "share",
    "tweet",
    "facebook",
    "instagram",
    "whatsapp",
    "telegram",
    "download app",
    "mobile app",
    "breaking news",
    "live updates",
    "trending now",
    "popular",
    "recommended",
    "related articles",
    "more news",
    "also read",
    "tags:",
    "categories:",
    "published on",
    "updated on",
    "read more",
    "view all",
    "see all",
    "click here",
    "register now",
    "sign up",
    "join us",
    "connect with us",
    "newsletter",
    "subscription",
    "comments",
    "comment",
    "reply",
    "like",
    "dislike",
    "vote",
    "poll",
];

/// True when this element alone marks its subtree as non-content.
fn element_is_stripped(el: ElementRef) -> bool {
    let element = el.value();
    if STRIPPED_TAGS.contains(&element.name()) {
        return true;
    }
    if element.classes().any(|c| STRIPPED_CLASSES.contains(&c)) {
        return true;
    }
    if let Some(class_attr) = element.attr("class") {
        if STRIPPED_CLASS_FRAGMENTS.iter().any(|f| class_attr.contains(f)) {
            return true;
        }
    }
    if let Some(id) = element.id() {
        if STRIPPED_ID_FRAGMENTS.iter().any(|f| id.contains(f)) {
            return true;
        }
    }
    false
}

/// True when the element or any ancestor is stripped.
pub(crate) fn in_stripped_subtree(el: ElementRef) -> bool {
    if element_is_stripped(el) {
        return true;
    }
    el.ancestors()
        .filter_map(ElementRef::wrap)
        .any(element_is_stripped)
}

/// Collect the element's text, skipping any stripped subtree inside it.
pub(crate) fn scoped_text(root: ElementRef) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for node in root.descendants() {
        if let Node::Text(text) = node.value() {
            let blocked = node
                .ancestors()
                .take_while(|a| a.id() != root.id())
                .filter_map(ElementRef::wrap)
                .any(element_is_stripped);
            if !blocked {
                parts.push(&**text);
            }
        }
    }
    parts.join(" ")
}

fn class_and_id(el: ElementRef) -> String {
    format!(
        "{} {}",
        el.value().attr("class").unwrap_or(""),
        el.value().id().unwrap_or("")
    )
}

fn has_unwanted_ancestor(el: ElementRef) -> bool {
    el.ancestors()
        .filter_map(ElementRef::wrap)
        .any(|a| UNWANTED_CONTAINER_RX.is_match(&class_and_id(a)))
}

/// The shared paragraph validity filter.
///
/// A paragraph must be long enough, wordy enough, free of boilerplate
/// phrases, not read like navigation, and not repeat itself.
pub(crate) fn is_valid_paragraph(text: &str, config: &PipelineConfig) -> bool {
    let trimmed = text.trim();
    if trimmed.chars().count() < config.min_paragraph_chars {
        return false;
    }
    let words = count_words(trimmed);
    if words < config.min_paragraph_words {
        return false;
    }
    if EXCLUDE_PATTERNS.is_match(trimmed) {
        return false;
    }
    if is_navigation_text(trimmed) {
        return false;
    }
    if words > 10 && unique_word_ratio(trimmed) < 0.4 {
        return false;
    }
    true
}

fn is_navigation_text(text: &str) -> bool {
    let lower = text.to_lowercase();
    if NAV_KEYWORDS.iter().any(|k| lower.contains(k)) {
        return true;
    }
    let trimmed = text.trim();
    if trimmed.chars().count() < 20 {
        return true;
    }
    if !trimmed.is_empty()
        && trimmed
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_whitespace())
    {
        return true;
    }
    if !trimmed.is_empty() && trimmed.chars().all(|c| c.is_ascii_digit()) {
        return true;
    }
    if count_words(trimmed) < 5 {
        return true;
    }
    false
}

fn valid_paragraphs_of(container: ElementRef, config: &PipelineConfig) -> Vec<String> {
    let p_selector = Selector::parse("p").unwrap();
    container
        .select(&p_selector)
        .filter(|p| !in_stripped_subtree(*p))
        .map(|p| scoped_text(p).trim().to_string())
        .filter(|t| is_valid_paragraph(t, config))
        .collect()
}

fn join_paragraphs(paragraphs: &[String]) -> String {
    paragraphs
        .iter()
        .map(|p| clean_fragment(p))
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Run the strategy ladder and return the first body that clears the
/// configured length floor, along with the winning strategy's name.
pub(crate) fn extract_body(
    doc: &Html,
    selectors: Option<&SelectorProfile>,
    config: &PipelineConfig,
) -> Option<(String, &'static str)> {
    let ladder: [(&'static str, fn(&Html, Option<&SelectorProfile>, &PipelineConfig) -> Option<String>); 4] = [
        ("domain-selectors", |doc, sel, cfg| {
            sel.and_then(|s| domain_strategy(doc, &s.content, cfg))
        }),
        ("main-containers", |doc, _, cfg| main_container_strategy(doc, cfg)),
        ("scored-block", |doc, _, cfg| scored_block_strategy(doc, cfg)),
        ("paragraph-scan", |doc, _, cfg| paragraph_scan_strategy(doc, cfg)),
    ];
    for (name, attempt) in ladder {
        if let Some(body) = attempt(doc, selectors, config) {
            if body.chars().count() >= config.min_strategy_chars {
                debug!(strategy = name, chars = body.chars().count(), "Strategy accepted");
                return Some((body, name));
            }
            debug!(strategy = name, chars = body.chars().count(), "Strategy too thin");
        }
    }
    None
}

/// Strategy 1: the publisher's own content selectors.
///
/// The first selector whose container yields at least three valid
/// paragraphs wins. Containers without `<p>` structure fall back to
/// sentence splitting of the container text.
fn domain_strategy(
    doc: &Html,
    content_selectors: &[String],
    config: &PipelineConfig,
) -> Option<String> {
    for raw in content_selectors {
        let Ok(selector) = Selector::parse(raw) else {
            continue;
        };
        let Some(container) = doc.select(&selector).find(|el| !in_stripped_subtree(*el)) else {
            continue;
        };
        let mut paragraphs = valid_paragraphs_of(container, config);
        if paragraphs.is_empty() {
            let text = scoped_text(container);
            if text.trim().chars().count() > 100 {
                paragraphs = split_segments(&text)
                    .into_iter()
                    .filter(|s| is_valid_paragraph(s, config))
                    .collect();
            }
        }
        if paragraphs.len() >= 3 {
            debug!(selector = %raw, paragraphs = paragraphs.len(), "Domain selector matched");
            return Some(join_paragraphs(&paragraphs));
        }
    }
    None
}

/// Strategy 2: semantic main-content containers.
fn main_container_strategy(doc: &Html, config: &PipelineConfig) -> Option<String> {
    for raw in MAIN_SELECTORS {
        let Ok(selector) = Selector::parse(raw) else {
            continue;
        };
        let Some(container) = doc.select(&selector).find(|el| !in_stripped_subtree(*el)) else {
            continue;
        };
        let paragraphs = valid_paragraphs_of(container, config);
        if paragraphs.len() >= 3 {
            debug!(selector = %raw, paragraphs = paragraphs.len(), "Main container matched");
            return Some(join_paragraphs(&paragraphs));
        }
    }
    None
}

/// Strategy 3: score every plausible container and keep the best.
///
/// A candidate needs more than 200 characters, at least three sentence
/// boundaries, and at least 50 words. The score rewards word count,
/// sentence structure, reporting verbs, and content-ish class names.
fn scored_block_strategy(doc: &Html, config: &PipelineConfig) -> Option<String> {
    let mut best: Option<(f64, ElementRef)> = None;
    for raw in CANDIDATE_SELECTORS {
        let Ok(selector) = Selector::parse(raw) else {
            continue;
        };
        for el in doc.select(&selector) {
            if in_stripped_subtree(el) {
                continue;
            }
            let markers = class_and_id(el);
            if UNWANTED_CONTAINER_RX.is_match(&markers) {
                continue;
            }
            let text = scoped_text(el);
            let trimmed = text.trim();
            if trimmed.chars().count() <= 200 {
                continue;
            }
            let boundaries = sentence_breaks(trimmed);
            let words = count_words(trimmed);
            if boundaries < 3 || words < 50 {
                continue;
            }
            let mut score = words as f64 * 0.1 + boundaries as f64 * 10.0;
            if REPORTING_RX.is_match(trimmed) {
                score += 50.0;
            }
            if CLASS_HINT_RX.is_match(&markers) {
                score += 30.0;
            }
            if best.map_or(true, |(top, _)| score > top) {
                best = Some((score, el));
            }
        }
    }
    let (score, winner) = best?;
    let mut paragraphs = valid_paragraphs_of(winner, config);
    if paragraphs.len() < 2 {
        paragraphs = split_segments(&scoped_text(winner))
            .into_iter()
            .filter(|s| is_valid_paragraph(s, config))
            .collect();
    }
    if paragraphs.is_empty() {
        return None;
    }
    debug!(score, paragraphs = paragraphs.len(), "Scored block selected");
    Some(join_paragraphs(&paragraphs))
}

/// Strategy 4: every `<p>` on the page that survives the filters.
fn paragraph_scan_strategy(doc: &Html, config: &PipelineConfig) -> Option<String> {
    let p_selector = Selector::parse("p").unwrap();
    let paragraphs: Vec<String> = doc
        .select(&p_selector)
        .filter(|p| !in_stripped_subtree(*p))
        .filter(|p| !has_unwanted_ancestor(*p))
        .map(|p| scoped_text(p).trim().to_string())
        .filter(|t| is_valid_paragraph(t, config))
        .take(config.max_scan_paragraphs)
        .collect();
    if paragraphs.len() >= 3 {
        debug!(paragraphs = paragraphs.len(), "Paragraph scan matched");
        Some(join_paragraphs(&paragraphs))
    } else {
        None
    }
}

/// Final pass over an assembled body: re-validate each paragraph after
/// cleaning and stop once the word budget is spent.
pub(crate) fn final_cleaning(content: &str, config: &PipelineConfig) -> String {
    let mut kept: Vec<String> = Vec::new();
    let mut total_words = 0usize;
    for paragraph in content.split("\n\n") {
        let cleaned = clean_fragment(paragraph);
        if !is_valid_paragraph(&cleaned, config) {
            continue;
        }
        total_words += count_words(&cleaned);
        kept.push(cleaned);
        if total_words >= config.max_total_words {
            break;
        }
    }
    kept.join("\n\n")
}
