//! Article content extraction.
//!
//! [`ContentExtractor::extract`] turns a URL into an [`ExtractionResult`]
//! and never fails for a well-formed URL. The ladder:
//!
//! 1. Browser-profile fetch with a randomized desktop user agent, then the
//!    DOM strategy ladder in [`strategies`]
//! 2. A second fetch with a minimal bot header set when the first attempt
//!    is blocked or parses thin
//! 3. A synthetic body built from the URL path and the publisher's
//!    registered editorial character, so downstream scoring always has
//!    text to work with
//!
//! Pages are parsed synchronously between fetches; no DOM handle is held
//! across an await point.

mod metadata;
mod strategies;

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use reqwest::Client;
use scraper::Html;
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};
use crate::models::{ExtractionMethod, ExtractionResult};
use crate::sources::{SourceProfile, SourceRegistry};
use crate::utils::{capitalize_first, clean_fragment, collapse_whitespace, RandomSource};

/// Desktop user agents rotated across primary fetches.
const USER_AGENTS: [&str; 5] = [
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:109.0) Gecko/20100101 Firefox/121.0",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.1 Safari/605.1.15",
];

const ALTERNATIVE_USER_AGENT: &str = "Mozilla/5.0 (compatible; NewsBot/1.0)";

/// Extensions stripped from URL path segments when composing a fallback
/// topic line.
const PATH_EXTENSIONS: [&str; 6] = [".html", ".htm", ".cms", ".ece", ".shtml", ".php"];

/// Fetches article pages and turns them into structured extraction
/// results. Cheap to clone; the HTTP client is shared.
#[derive(Clone)]
pub struct ContentExtractor {
    client: Client,
    registry: Arc<SourceRegistry>,
    config: Arc<PipelineConfig>,
    random: Arc<dyn RandomSource>,
}

impl ContentExtractor {
    pub fn new(
        client: Client,
        registry: Arc<SourceRegistry>,
        config: Arc<PipelineConfig>,
        random: Arc<dyn RandomSource>,
    ) -> Self {
        Self {
            client,
            registry,
            config,
            random,
        }
    }

    /// Extract an article from `url`, falling back through the fetch
    /// ladder. Only a malformed URL is an error; everything else degrades
    /// to the synthetic fallback.
    #[instrument(level = "info", skip_all, fields(url = %url))]
    pub async fn extract(&self, url: &str) -> Result<ExtractionResult> {
        let parsed_url =
            Url::parse(url).map_err(|_| PipelineError::InvalidUrl(url.to_string()))?;
        let profile = self.registry.profile_or_default(&parsed_url);
        let started = Instant::now();

        match self.fetch_primary(&parsed_url).await {
            Ok(html) => {
                let page = parse_article(&html, &profile, &self.config);
                let chars = page.content.chars().count();
                if chars >= self.config.min_article_chars {
                    info!(
                        source = %profile.name,
                        chars,
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "Extraction succeeded"
                    );
                    return Ok(page.into_result(url, &profile, ExtractionMethod::Full));
                }
                debug!(chars, "Primary fetch parsed thin, retrying with bot profile");
            }
            Err(e) => warn!(error = %e, "Primary fetch failed"),
        }

        match self.fetch_alternative(&parsed_url).await {
            Ok(html) => {
                let page = parse_article(&html, &profile, &self.config);
                let chars = page.content.chars().count();
                if chars >= self.config.min_alternative_chars {
                    info!(
                        source = %profile.name,
                        chars,
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "Alternative extraction succeeded"
                    );
                    return Ok(page.into_result(url, &profile, ExtractionMethod::Alternative));
                }
                debug!(chars, "Alternative fetch parsed thin");
            }
            Err(e) => warn!(error = %e, "Alternative fetch failed"),
        }

        info!(source = %profile.name, "Serving synthetic fallback article");
        Ok(synthetic_fallback(url, &parsed_url, &profile))
    }

    /// Browser-profile fetch. A non-success status or a payload under the
    /// configured byte floor is treated as a block signal.
    async fn fetch_primary(&self, url: &Url) -> Result<String> {
        let agent = USER_AGENTS[self.random.pick(USER_AGENTS.len())];
        debug!(agent, "Fetching with browser profile");
        let response = self
            .client
            .get(url.clone())
            .header("User-Agent", agent)
            .header(
                "Accept",
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,image/apng,*/*;q=0.8",
            )
            .header("Accept-Language", "en-US,en;q=0.9,hi;q=0.8")
            .header("Cache-Control", "no-cache")
            .header("Pragma", "no-cache")
            .header("Sec-Fetch-Dest", "document")
            .header("Sec-Fetch-Mode", "navigate")
            .header("Sec-Fetch-Site", "none")
            .header("Sec-Fetch-User", "?1")
            .header("Upgrade-Insecure-Requests", "1")
            .header("DNT", "1")
            .timeout(Duration::from_secs(self.config.primary_timeout_secs))
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(PipelineError::Blocked {
                url: url.to_string(),
                detail: format!("status {status}"),
            });
        }
        let html = response.text().await?;
        if html.len() < self.config.min_html_bytes {
            return Err(PipelineError::Blocked {
                url: url.to_string(),
                detail: format!("{} bytes, likely a block page", html.len()),
            });
        }
        Ok(html)
    }

    /// Minimal-header retry. No byte floor here; some sites serve small
    /// but genuine pages to bots.
    async fn fetch_alternative(&self, url: &Url) -> Result<String> {
        debug!("Fetching with bot profile");
        let response = self
            .client
            .get(url.clone())
            .header("User-Agent", ALTERNATIVE_USER_AGENT)
            .header("Accept", "text/html")
            .timeout(Duration::from_secs(self.config.alternative_timeout_secs))
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(PipelineError::Blocked {
                url: url.to_string(),
                detail: format!("status {status}"),
            });
        }
        Ok(response.text().await?)
    }
}

/// What one parsed page yielded before the method tag is known.
struct ParsedPage {
    title: String,
    content: String,
    author: String,
    published_at: DateTime<Utc>,
}

impl ParsedPage {
    fn into_result(
        self,
        url: &str,
        profile: &SourceProfile,
        method: ExtractionMethod,
    ) -> ExtractionResult {
        ExtractionResult {
            url: url.to_string(),
            source_name: profile.name.clone(),
            title: self.title,
            content: self.content,
            author: self.author,
            published_at: self.published_at,
            method,
        }
    }
}

/// Parse one fetched page: body via the strategy ladder with metadata
/// fallbacks, title and author via publisher selectors with aggressive
/// fallbacks, date via selectors then meta tags.
fn parse_article(html: &str, profile: &SourceProfile, config: &PipelineConfig) -> ParsedPage {
    let doc = Html::parse_document(html);
    let selectors = profile.selectors.as_ref();

    let mut title = selectors
        .and_then(|s| metadata::first_selector_text(&doc, &s.title))
        .unwrap_or_default();
    if title.chars().count() < 10 {
        if let Some(better) = metadata::aggressive_title(&doc) {
            title = better;
        }
    }
    let title = clean_fragment(&title);
    let title = if title.is_empty() {
        "Article Title Not Available".to_string()
    } else {
        title
    };

    let mut content = match strategies::extract_body(&doc, selectors, config) {
        Some((body, strategy)) => {
            debug!(strategy, "Body extracted");
            body
        }
        None => String::new(),
    };
    if content.chars().count() < config.min_article_chars {
        if let Some(meta) = metadata::meta_description(&doc).or_else(|| metadata::json_ld_body(&doc))
        {
            debug!("Body taken from page metadata");
            content = meta;
        }
    }
    let content = strategies::final_cleaning(&content, config);

    let author = selectors
        .and_then(|s| metadata::first_selector_text(&doc, &s.author))
        .or_else(|| metadata::aggressive_author(&doc))
        .map(|a| clean_fragment(&a))
        .filter(|a| !a.is_empty())
        .unwrap_or_else(|| "Staff Reporter".to_string());

    let published_at = metadata::extract_date(&doc, selectors.map(|s| s.date.as_slice()));

    ParsedPage {
        title,
        content,
        author,
        published_at,
    }
}

/// Build the disclosed placeholder article used when both fetches fail.
fn synthetic_fallback(raw_url: &str, url: &Url, profile: &SourceProfile) -> ExtractionResult {
    let topic = fallback_topic(url);
    let title = if topic.is_empty() {
        format!("News Article from {}", profile.name)
    } else {
        format!("{} - {}", capitalize_first(&topic), profile.name)
    };
    ExtractionResult {
        url: raw_url.to_string(),
        source_name: profile.name.clone(),
        title,
        content: fallback_body(raw_url, profile, &topic),
        author: "Staff Reporter".to_string(),
        published_at: Utc::now(),
        method: ExtractionMethod::Fallback,
    }
}

/// Derive a readable topic line from the URL path: decoded segments over
/// three characters, extensions and digits dropped, separators spaced.
fn fallback_topic(url: &Url) -> String {
    let mut parts: Vec<String> = Vec::new();
    for segment in url.path().split('/') {
        let decoded = urlencoding::decode(segment)
            .map(|c| c.into_owned())
            .unwrap_or_else(|_| segment.to_string());
        let mut piece = decoded;
        for ext in PATH_EXTENSIONS {
            if let Some(stripped) = piece.strip_suffix(ext) {
                piece = stripped.to_string();
                break;
            }
        }
        if piece.chars().count() > 3 {
            parts.push(piece);
        }
    }
    let spaced = parts.join(" ").replace(['-', '_'], " ");
    let without_digits: String = spaced.chars().filter(|c| !c.is_ascii_digit()).collect();
    collapse_whitespace(&without_digits)
}

fn fallback_body(url: &str, profile: &SourceProfile, topic: &str) -> String {
    let focus = if topic.is_empty() {
        "current affairs, politics, and social issues"
    } else {
        topic
    };
    let paragraphs = [
        format!(
            "This article from {} could not be retrieved automatically. The publisher's \
             page either blocked automated readers or served no machine-readable body text.",
            profile.name
        ),
        format!(
            "{} is known for {} coverage. Based on the address, this story appears to \
             concern: {}.",
            profile.name, profile.editorial_note, focus
        ),
        "Common reasons a page resists automated reading include subscription walls, \
         bodies rendered only in a browser, and interstitial pages shown to new visitors."
            .to_string(),
        format!("For the complete article, visit: {url}"),
    ];
    paragraphs.join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BiasPrior;
    use crate::sources::SelectorProfile;
    use chrono::Datelike;

    fn profile() -> SourceProfile {
        SourceProfile {
            name: "The Daily Ledger".to_string(),
            domains: vec!["dailyledger.example".to_string()],
            bias_prior: BiasPrior::Center,
            credibility_base: 70,
            editorial_note: "centrist business".to_string(),
            feeds: vec![],
            selectors: Some(SelectorProfile {
                title: vec!["h1.headline-main".to_string()],
                content: vec![".story-body-text".to_string()],
                author: vec![".byline-name".to_string()],
                date: vec![".pub-stamp".to_string()],
            }),
        }
    }

    const PAGE: &str = r#"<html><head></head><body>
        <h1 class="headline-main">Cabinet approves river linking project</h1>
        <div class="byline-name">Ravi Kumar</div>
        <div class="pub-stamp">2024-06-15</div>
        <div class="story-body-text">
          <p>The union cabinet on Wednesday cleared the long pending river linking
             proposal covering four states in the peninsular region.</p>
          <p>Officials said the first phase would connect two reservoir systems and
             irrigate close to three hundred thousand hectares of farmland.</p>
          <p>Opposition parties questioned the environmental clearances and demanded
             an independent review of the displacement estimates.</p>
        </div>
        </body></html>"#;

    #[test]
    fn test_parse_article_uses_publisher_selectors() {
        let page = parse_article(PAGE, &profile(), &PipelineConfig::default());
        assert_eq!(page.title, "Cabinet approves river linking project");
        assert_eq!(page.author, "Ravi Kumar");
        assert_eq!(page.published_at.year(), 2024);
        assert!(page.content.contains("river linking"));
        assert!(page.content.contains("\n\n"));
    }

    #[test]
    fn test_parse_article_empty_page_degrades() {
        let page = parse_article(
            "<html><body><p>hi</p></body></html>",
            &profile(),
            &PipelineConfig::default(),
        );
        assert_eq!(page.title, "Article Title Not Available");
        assert!(page.content.is_empty());
        assert_eq!(page.author, "Staff Reporter");
    }

    #[test]
    fn test_parse_article_meta_description_rescues_thin_body() {
        let description = "The reserve bank kept the policy rate unchanged for a sixth \
                           consecutive review while trimming its inflation forecast for \
                           the second half of the fiscal year.";
        let html = format!(
            "<html><head><meta property=\"og:description\" content=\"{description}\"></head>\
             <body><p>hi</p></body></html>"
        );
        let page = parse_article(&html, &profile(), &PipelineConfig::default());
        assert!(page.content.contains("policy rate"));
    }

    #[test]
    fn test_fallback_topic_from_path_segments() {
        let url =
            Url::parse("https://news.example.com/city/delhi/metro-phase-4-extension-approved-2024.html")
                .unwrap();
        assert_eq!(
            fallback_topic(&url),
            "city delhi metro phase extension approved"
        );
    }

    #[test]
    fn test_fallback_topic_decodes_percent_encoding() {
        let url = Url::parse("https://news.example.com/union%20budget%20highlights").unwrap();
        assert_eq!(fallback_topic(&url), "union budget highlights");
    }

    #[test]
    fn test_synthetic_fallback_discloses_itself() {
        let url = Url::parse("https://www.zeenews.com/waf-blocked").unwrap();
        let result = synthetic_fallback("https://www.zeenews.com/waf-blocked", &url, &profile());
        assert_eq!(result.method, ExtractionMethod::Fallback);
        assert!(result.content.contains("The Daily Ledger"));
        assert!(result.content.contains("centrist business"));
        assert!(result.content.contains("https://www.zeenews.com/waf-blocked"));
        assert!(!result.content.is_empty());
        assert!(result.title.contains("The Daily Ledger"));
    }

    #[test]
    fn test_fallback_title_without_usable_path() {
        let url = Url::parse("https://news.example.com/").unwrap();
        let result = synthetic_fallback("https://news.example.com/", &url, &profile());
        assert_eq!(result.title, "News Article from The Daily Ledger");
    }
}
