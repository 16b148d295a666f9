//! Error types shared across the crawl, extraction and persistence layers.
//!
//! Only a handful of conditions ever abort a sync: configuration problems,
//! a failed batch write and cancellation. Everything else (a single failed
//! request, an unparseable field, a duplicate record) is reported through
//! the [`Observer`](crate::observer::Observer) and absorbed where it happens.

use thiserror::Error;

/// Top-level error returned by sessions and the [`SolicitationService`](crate::service::SolicitationService).
#[derive(Debug, Error)]
pub enum Error {
    /// The session inputs or the configuration are unusable.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A pattern failed to compile.
    #[error("pattern error: {0}")]
    Pattern(#[from] regex::Error),

    /// An HTTP request failed or returned a non-success status.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The sitemap document could not be parsed.
    #[error("sitemap parse error: {0}")]
    Sitemap(#[from] quick_xml::DeError),

    /// A URL could not be parsed.
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// The work queue rejected an item.
    #[error(transparent)]
    Queue(#[from] QueueError),

    /// The persistence collaborator failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Reading the configuration file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration file is not valid YAML for [`SyncConfig`](crate::config::SyncConfig).
    #[error("config parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A background task panicked or was aborted.
    #[error("background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    /// The operation was cancelled before it could finish.
    #[error("operation cancelled")]
    Cancelled,
}

impl Error {
    /// Returns `true` for the cancellation condition.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }
}

/// Reasons the bounded work queue refuses an item.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueueError {
    #[error("work queue is full (capacity {capacity})")]
    Full { capacity: usize },

    #[error("work queue is closed")]
    Closed,

    #[error("enqueue cancelled")]
    Cancelled,
}

/// Dedup cache conditions. None of these abort a pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheError {
    #[error("value for id {id} of publisher {publisher} already exists")]
    Duplicate { publisher: String, id: String },

    #[error("cache is empty")]
    Empty,

    #[error("no values for {0} were found")]
    NotFound(String),
}

/// Failures raised by [`Persistence`](crate::store::Persistence) implementations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("store encoding error: {0}")]
    Json(#[from] serde_json::Error),

    /// The backend refused the write.
    #[error("store rejected batch: {0}")]
    Rejected(String),
}
