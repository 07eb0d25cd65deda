//! HTTP client shared by the adapters
//!
//! Some upstreams (notably the regional bulletin) reject obvious bots, so
//! the client rotates a browser user agent.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::FeedError;

/// HTTP client configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// Fixed user agent; rotates when unset
    pub user_agent: Option<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            user_agent: None,
        }
    }
}

/// User agents for rotation
const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/135.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/135.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/135.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:137.0) Gecko/20100101 Firefox/137.0",
];

/// Get a random user agent
pub fn random_user_agent() -> &'static str {
    use rand::Rng;
    let idx = rand::thread_rng().gen_range(0..USER_AGENTS.len());
    USER_AGENTS[idx]
}

/// Create an HTTP client for feed requests
pub fn create_client(config: &HttpConfig) -> Result<Client, FeedError> {
    let user_agent = config
        .user_agent
        .clone()
        .unwrap_or_else(|| random_user_agent().to_string());

    Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .user_agent(user_agent)
        .build()
        .map_err(|e| FeedError::ClientBuild(e.to_string()))
}

/// GET a URL and fail on non-success status
pub(crate) async fn get_checked(
    request: reqwest::RequestBuilder,
) -> Result<reqwest::Response, FeedError> {
    let response = request.send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(FeedError::Status(status));
    }
    Ok(response)
}
