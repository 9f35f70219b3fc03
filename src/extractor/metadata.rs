//! Title, author, and date extraction, plus the metadata fallbacks for
//! pages whose body resists the DOM strategies: `og:description` style
//! meta tags and `articleBody` inside JSON-LD blocks.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};

use super::strategies::{in_stripped_subtree, scoped_text};
use crate::utils::collapse_whitespace;

const TITLE_SELECTORS: [&str; 13] = [
    "h1",
    "h2",
    ".headline",
    ".title",
    ".story-headline",
    ".article-title",
    ".main-title",
    "[class*='title']",
    "[class*='headline']",
    "[data-title]",
    "meta[property='og:title']",
    "meta[name='twitter:title']",
    "title",
];

const AUTHOR_SELECTORS: [&str; 9] = [
    ".author",
    ".byline",
    ".story-author",
    ".article-author",
    "[class*='author']",
    "[class*='byline']",
    "meta[name='author']",
    "meta[property='article:author']",
    "[rel='author']",
];

const DATE_META_SELECTORS: [&str; 4] = [
    "meta[property='article:published_time']",
    "meta[property='article:modified_time']",
    "meta[name='publish-date']",
    "meta[name='date']",
];

const DESCRIPTION_META_SELECTORS: [&str; 4] = [
    "meta[property='og:description']",
    "meta[name='description']",
    "meta[name='twitter:description']",
    "meta[property='article:content']",
];

static DATE_PREFIX_RX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(?:published|updated|last modified):\s*").unwrap());

const NAIVE_DATETIME_FORMATS: [&str; 4] = [
    "%B %d, %Y %H:%M",
    "%b %d, %Y %H:%M",
    "%d %b %Y %H:%M",
    "%Y-%m-%d %H:%M:%S",
];

const NAIVE_DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%B %d, %Y", "%b %d, %Y", "%d %b %Y"];

/// First selector in the list whose match yields more than five characters
/// of text. Used for both the publisher's title and author selectors.
pub(crate) fn first_selector_text(doc: &Html, selectors: &[String]) -> Option<String> {
    for raw in selectors {
        let Ok(selector) = Selector::parse(raw) else {
            continue;
        };
        if let Some(el) = doc.select(&selector).find(|el| !in_stripped_subtree(*el)) {
            let text = collapse_whitespace(&scoped_text(el));
            if text.chars().count() > 5 {
                return Some(text);
            }
        }
    }
    None
}

/// Last-resort title hunt across generic heading selectors and meta tags.
pub(crate) fn aggressive_title(doc: &Html) -> Option<String> {
    for raw in TITLE_SELECTORS {
        let Ok(selector) = Selector::parse(raw) else {
            continue;
        };
        let Some(el) = doc.select(&selector).find(|el| !in_stripped_subtree(*el)) else {
            continue;
        };
        let candidate = if el.value().name() == "meta" {
            el.value().attr("content").unwrap_or("").to_string()
        } else {
            scoped_text(el)
        };
        let candidate = collapse_whitespace(&candidate);
        let len = candidate.chars().count();
        if len > 10 && len < 200 {
            return Some(candidate);
        }
    }
    None
}

/// Last-resort author hunt. Bylines shorter than three characters and
/// blobs over a hundred are noise.
pub(crate) fn aggressive_author(doc: &Html) -> Option<String> {
    for raw in AUTHOR_SELECTORS {
        let Ok(selector) = Selector::parse(raw) else {
            continue;
        };
        let Some(el) = doc.select(&selector).find(|el| !in_stripped_subtree(*el)) else {
            continue;
        };
        let candidate = if el.value().name() == "meta" {
            el.value().attr("content").unwrap_or("").to_string()
        } else {
            scoped_text(el)
        };
        let candidate = collapse_whitespace(&candidate);
        let len = candidate.chars().count();
        if len > 2 && len < 100 {
            return Some(candidate);
        }
    }
    None
}

/// Publication date: the publisher's date selectors first, then the usual
/// meta timestamps, then the current time.
///
/// The first selector that yields any text wins the slot even when the
/// text does not parse; an unparseable on-page date stamp degrades to now
/// rather than letting a meta tag contradict the visible page.
pub(crate) fn extract_date(doc: &Html, selectors: Option<&[String]>) -> DateTime<Utc> {
    if let Some(list) = selectors {
        for raw in list {
            let Ok(selector) = Selector::parse(raw) else {
                continue;
            };
            if let Some(el) = doc.select(&selector).find(|el| !in_stripped_subtree(*el)) {
                let text = collapse_whitespace(&scoped_text(el));
                if !text.is_empty() {
                    return parse_display_date(&text).unwrap_or_else(Utc::now);
                }
            }
        }
    }
    for raw in DATE_META_SELECTORS {
        let Ok(selector) = Selector::parse(raw) else {
            continue;
        };
        if let Some(el) = doc.select(&selector).next() {
            if let Some(content) = el.value().attr("content") {
                if !content.trim().is_empty() {
                    return parse_display_date(content).unwrap_or_else(Utc::now);
                }
            }
        }
    }
    Utc::now()
}

/// Parse the date formats Indian news sites actually serve: RFC 3339 and
/// 2822 stamps, "June 15, 2024 14:30 IST" style display dates, and bare
/// dates taken as midnight UTC.
pub(crate) fn parse_display_date(raw: &str) -> Option<DateTime<Utc>> {
    let cleaned = DATE_PREFIX_RX.replace(raw.trim(), "");
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(cleaned) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(cleaned) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Some((stamp, offset)) = split_zone_suffix(cleaned) {
        for format in NAIVE_DATETIME_FORMATS {
            if let Ok(naive) = NaiveDateTime::parse_from_str(stamp, format) {
                if let Some(dt) = naive.and_local_timezone(offset).single() {
                    return Some(dt.with_timezone(&Utc));
                }
            }
        }
    }
    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(cleaned, format) {
            return Some(naive.and_utc());
        }
    }
    for format in NAIVE_DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(cleaned, format) {
            if let Some(naive) = date.and_hms_opt(0, 0, 0) {
                return Some(naive.and_utc());
            }
        }
    }
    None
}

fn split_zone_suffix(s: &str) -> Option<(&str, FixedOffset)> {
    if let Some(rest) = s.strip_suffix(" IST") {
        return Some((rest.trim_end(), FixedOffset::east_opt(19800).unwrap()));
    }
    if let Some(rest) = s.strip_suffix(" GMT").or_else(|| s.strip_suffix(" UTC")) {
        return Some((rest.trim_end(), FixedOffset::east_opt(0).unwrap()));
    }
    None
}

/// Body fallback from description meta tags. Bounds reject both stub
/// descriptions and tags abused to carry whole articles.
pub(crate) fn meta_description(doc: &Html) -> Option<String> {
    for raw in DESCRIPTION_META_SELECTORS {
        let Ok(selector) = Selector::parse(raw) else {
            continue;
        };
        if let Some(el) = doc.select(&selector).next() {
            if let Some(content) = el.value().attr("content") {
                let len = content.chars().count();
                if len > 100 && len < 1000 {
                    return Some(collapse_whitespace(content));
                }
            }
        }
    }
    None
}

/// Body fallback from JSON-LD structured data. Accepts a lone object or
/// a top-level array of objects, preferring `articleBody` over
/// `description`.
pub(crate) fn json_ld_body(doc: &Html) -> Option<String> {
    let Ok(selector) = Selector::parse("script[type='application/ld+json']") else {
        return None;
    };
    for el in doc.select(&selector) {
        let raw: String = el.text().collect();
        let Ok(value) = serde_json::from_str::<serde_json::Value>(&raw) else {
            continue;
        };
        let objects: Vec<&serde_json::Value> = match &value {
            serde_json::Value::Array(items) => items.iter().collect(),
            other => vec![other],
        };
        for object in objects {
            if let Some(body) = object.get("articleBody").and_then(|v| v.as_str()) {
                let len = body.chars().count();
                if len > 100 && len < 5000 {
                    return Some(body.trim().to_string());
                }
            }
            if let Some(description) = object.get("description").and_then(|v| v.as_str()) {
                let len = description.chars().count();
                if len > 100 && len < 1000 {
                    return Some(description.trim().to_string());
                }
            }
        }
    }
    None
}
