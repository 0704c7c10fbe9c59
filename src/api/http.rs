//! HTTP client for the generative API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use tracing::debug;
use url::Url;

use super::{ApiError, ApiResponse, GenerativeApi, RawResponse};

/// Calls `POST {endpoint}` with `{"prompt": ...}`.
#[derive(Debug, Clone)]
pub struct HttpGenerativeApi {
    client: Client,
    endpoint: Url,
}

impl HttpGenerativeApi {
    /// Build a client with the given request timeout.
    pub fn new(endpoint: Url, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;

        Ok(Self { client, endpoint })
    }
}

#[async_trait]
impl GenerativeApi for HttpGenerativeApi {
    async fn generate(&self, prompt: &str) -> Result<ApiResponse, ApiError> {
        debug!("Calling generative API with {} chars", prompt.chars().count());

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&json!({ "prompt": prompt }))
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status(status.as_u16()));
        }

        let raw: RawResponse = response
            .json()
            .await
            .map_err(|e| ApiError::Malformed(e.to_string()))?;

        Ok(raw.into())
    }
}
