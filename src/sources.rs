//! Publisher registry: who we ingest, where their feeds live, and how to
//! read their pages.
//!
//! The registry is plain data. Each [`SourceProfile`] couples a publisher's
//! domains with its editorial prior, baseline credibility, RSS feeds, and an
//! optional [`SelectorProfile`] of site-specific CSS selectors. A registry
//! ships embedded in the binary ([`SourceRegistry::embedded`]); deployments
//! that track selector churn faster than releases can point the CLI at a
//! YAML file instead.

use scraper::Selector;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;
use url::Url;

use crate::error::{PipelineError, Result};
use crate::models::{BiasPrior, Category};

const EMBEDDED_REGISTRY: &str = include_str!("sources.yaml");

/// Site-specific CSS selectors, each list ordered from most to least
/// specific. The extractor walks a list until one matches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectorProfile {
    pub title: Vec<String>,
    pub content: Vec<String>,
    pub author: Vec<String>,
    pub date: Vec<String>,
}

impl SelectorProfile {
    fn validate(&self, source: &str) -> Result<()> {
        for group in [&self.title, &self.content, &self.author, &self.date] {
            for raw in group {
                Selector::parse(raw).map_err(|e| {
                    PipelineError::Selector(format!("{source}: {raw}: {e}"))
                })?;
            }
        }
        Ok(())
    }
}

/// One RSS feed belonging to a publisher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedSpec {
    pub url: String,
    /// Topic the feed is dedicated to; boosts that category during voting.
    #[serde(default)]
    pub topic: Option<Category>,
}

/// Everything the pipeline knows about one publisher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceProfile {
    /// Display name, also the key for bias priors and title-suffix cleanup.
    pub name: String,
    /// Hostnames that identify this publisher. Subdomains match too.
    #[serde(default)]
    pub domains: Vec<String>,
    /// Editorial stance seeding the overall bias score.
    pub bias_prior: BiasPrior,
    /// Baseline reliability (0-100) anchoring the credibility factors.
    pub credibility_base: u32,
    /// Short stance description, quoted in synthetic fallback bodies.
    pub editorial_note: String,
    #[serde(default)]
    pub feeds: Vec<FeedSpec>,
    /// Site-specific selectors; absent for publishers that extract fine
    /// with the generic strategies.
    #[serde(default)]
    pub selectors: Option<SelectorProfile>,
}

impl SourceProfile {
    /// Profile used for hosts the registry does not know: neutral prior,
    /// baseline 70 credibility, generic extraction.
    pub fn unknown(host: &str) -> Self {
        let name = host.strip_prefix("www.").unwrap_or(host).to_string();
        SourceProfile {
            name,
            domains: Vec::new(),
            bias_prior: BiasPrior::Center,
            credibility_base: 70,
            editorial_note: "independent".to_string(),
            feeds: Vec::new(),
            selectors: None,
        }
    }
}

/// The full publisher registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRegistry {
    sources: Vec<SourceProfile>,
}

impl SourceRegistry {
    /// Load the registry compiled into the binary.
    pub fn embedded() -> Result<Self> {
        Self::from_yaml(EMBEDDED_REGISTRY)
    }

    /// Load a registry from a YAML file with the same shape as the
    /// embedded one.
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_yaml(&raw)
    }

    fn from_yaml(raw: &str) -> Result<Self> {
        let registry: SourceRegistry = serde_yaml::from_str(raw)?;
        registry.validate()?;
        debug!(
            sources = registry.sources.len(),
            feeds = registry.feeds().len(),
            "Loaded source registry"
        );
        Ok(registry)
    }

    /// Reject registries the pipeline cannot run with: empty or duplicate
    /// names, out-of-range credibility, unparsable feed URLs, or CSS
    /// selectors that fail to compile.
    pub fn validate(&self) -> Result<()> {
        let mut seen = Vec::new();
        for source in &self.sources {
            if source.name.trim().is_empty() {
                return Err(PipelineError::Config(
                    "source with empty name".to_string(),
                ));
            }
            if seen.contains(&source.name.as_str()) {
                return Err(PipelineError::Config(format!(
                    "duplicate source name: {}",
                    source.name
                )));
            }
            seen.push(source.name.as_str());
            if source.credibility_base > 100 {
                return Err(PipelineError::Config(format!(
                    "{}: credibility_base {} exceeds 100",
                    source.name, source.credibility_base
                )));
            }
            for feed in &source.feeds {
                Url::parse(&feed.url).map_err(|_| {
                    PipelineError::Config(format!(
                        "{}: invalid feed URL: {}",
                        source.name, feed.url
                    ))
                })?;
            }
            if let Some(selectors) = &source.selectors {
                selectors.validate(&source.name)?;
            }
        }
        Ok(())
    }

    pub fn profiles(&self) -> &[SourceProfile] {
        &self.sources
    }

    /// All registered publisher names, in registry order. Used to strip
    /// `" - Publisher"` suffixes from feed headlines.
    pub fn source_names(&self) -> Vec<&str> {
        self.sources.iter().map(|s| s.name.as_str()).collect()
    }

    /// Every feed in the registry, in registry order, paired with its
    /// publisher. Registry order is the polling order.
    pub fn feeds(&self) -> Vec<(&SourceProfile, &FeedSpec)> {
        self.sources
            .iter()
            .flat_map(|s| s.feeds.iter().map(move |f| (s, f)))
            .collect()
    }

    /// Find the publisher owning `url`'s host, matching registered domains
    /// exactly or as a parent of the host (so `www.thehindu.com` resolves
    /// to `thehindu.com`).
    pub fn resolve(&self, url: &Url) -> Option<&SourceProfile> {
        let host = url.host_str()?;
        self.sources.iter().find(|source| {
            source.domains.iter().any(|domain| {
                host == domain || host.ends_with(&format!(".{domain}"))
            })
        })
    }

    /// Look a publisher up by its registry name.
    pub fn profile_by_name(&self, name: &str) -> Option<&SourceProfile> {
        self.sources.iter().find(|s| s.name == name)
    }

    /// Resolve `url` to its publisher, or build an [`SourceProfile::unknown`]
    /// profile named after the host.
    pub fn profile_or_default(&self, url: &Url) -> SourceProfile {
        if let Some(profile) = self.resolve(url) {
            return profile.clone();
        }
        let host = url.host_str().unwrap_or("unknown");
        SourceProfile::unknown(host)
    }
}
