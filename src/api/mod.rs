//! Generative text/image API.
//!
//! The bot sends the user's prompt and gets back optional result text and an
//! optional image URL.

mod http;

pub use http::HttpGenerativeApi;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tracing::warn;
use url::Url;

/// Errors from the generative API. Each one ends processing of the current
/// message; none are retried.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Request could not be sent or the connection failed
    #[error("network error: {0}")]
    Network(String),
    /// Server answered with a non-success status
    #[error("API returned status {0}")]
    Status(u16),
    /// Body was not the expected JSON
    #[error("malformed response: {0}")]
    Malformed(String),
}

/// Parsed API answer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApiResponse {
    pub results: Option<String>,
    pub image_url: Option<Url>,
}

impl ApiResponse {
    /// Result text, if it contains anything besides whitespace.
    pub fn usable_text(&self) -> Option<&str> {
        self.results.as_deref().filter(|t| !t.trim().is_empty())
    }
}

/// Wire shape of the API answer.
#[derive(Debug, Deserialize)]
pub(crate) struct RawResponse {
    #[serde(default)]
    results: Option<String>,
    #[serde(default)]
    image_url: Option<String>,
}

impl From<RawResponse> for ApiResponse {
    fn from(raw: RawResponse) -> Self {
        let image_url = raw
            .image_url
            .filter(|u| !u.trim().is_empty())
            .and_then(|u| match Url::parse(u.trim()) {
                Ok(url) => Some(url),
                Err(e) => {
                    warn!("Dropping unparsable image_url {:?}: {}", u, e);
                    None
                }
            });

        Self {
            results: raw.results,
            image_url,
        }
    }
}

/// Anything that turns a prompt into an [`ApiResponse`].
#[async_trait]
pub trait GenerativeApi: Send + Sync + 'static {
    async fn generate(&self, prompt: &str) -> Result<ApiResponse, ApiError>;
}
