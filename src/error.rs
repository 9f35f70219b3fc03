//! Error taxonomy shared across the ingestion pipeline.
//!
//! Every fallible operation in this crate returns [`Result`], which wraps
//! [`PipelineError`]. Transport and serialization failures convert
//! automatically via `#[from]`; domain failures carry enough context to be
//! logged and counted without a backtrace.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("fetch blocked for {url}: {detail}")]
    Blocked { url: String, detail: String },

    #[error("insufficient content extracted from {0}")]
    Insufficient(String),

    #[error("feed error: {0}")]
    Feed(String),

    #[error("invalid selector: {0}")]
    Selector(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("already stored: {0}")]
    AlreadyStored(String),

    #[error("ingestion cycle failed: {0}")]
    CycleFailed(String),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
