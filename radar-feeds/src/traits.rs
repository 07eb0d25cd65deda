//! Common traits for source adapters

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

/// Errors from a single feed fetch
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Upstream returned status {0}")]
    Status(reqwest::StatusCode),

    #[error("Parse error: {0}")]
    Parse(String),
}

impl From<serde_json::Error> for FeedError {
    fn from(e: serde_json::Error) -> Self {
        FeedError::Parse(e.to_string())
    }
}

/// A source adapter: one blocking "fetch current snapshot" operation plus
/// the documented value to use when the fetch cannot deliver.
///
/// Adapters hold no state shared with the caller.
#[async_trait]
pub trait Feed: Send + Sync {
    /// Normalized snapshot type
    type Output: Send + 'static;

    /// Short feed name for logs
    fn name(&self) -> &str;

    /// Fetch the current snapshot
    async fn fetch(&self) -> Result<Self::Output, FeedError>;

    /// Substitute used on failure or timeout
    fn fallback(&self) -> Self::Output;
}

/// Shared feed handle
pub type SharedFeed<T> = Arc<dyn Feed<Output = T>>;
