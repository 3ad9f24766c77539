use crate::shared::Result;
use anyhow::Context;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Default request timeout for every source
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

const DEFAULT_MAX_RETRIES: u32 = 3;

/// JsonHttpClient - Shared HTTP plumbing of the network adapters
///
/// Wraps an async reqwest client with a timeout, a user agent and a bounded
/// retry. A 404 is not an error: it means the source does not know the
/// requested entry.
#[derive(Clone)]
pub struct JsonHttpClient {
    client: reqwest::Client,
    max_retries: u32,
}

impl JsonHttpClient {
    /// Creates a client without authentication
    pub fn new(timeout: Duration) -> Result<Self> {
        Self::build(timeout, HeaderMap::new())
    }

    /// Creates a client sending `Authorization: Bearer <token>` when a token is given
    pub fn with_bearer_token(timeout: Duration, token: Option<&str>) -> Result<Self> {
        let mut headers = HeaderMap::new();
        if let Some(token) = token.filter(|t| !t.trim().is_empty()) {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token.trim()))
                .context("Invalid characters in API token")?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }
        Self::build(timeout, headers)
    }

    fn build(timeout: Duration, mut headers: HeaderMap) -> Result<Self> {
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let version = env!("CARGO_PKG_VERSION");
        let user_agent = format!("catalog-compiler/{}", version);
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            max_retries: DEFAULT_MAX_RETRIES,
        })
    }

    /// Sets the number of attempts per request (at least one)
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries.max(1);
        self
    }

    /// Fetches and decodes a JSON document, retrying transient failures
    ///
    /// # Returns
    /// `None` when the server answers 404
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<Option<T>> {
        let mut attempt = 1;
        loop {
            match self.get_json_once(url).await {
                Ok(document) => return Ok(document),
                Err(e) if attempt < self.max_retries => {
                    tracing::debug!(url, attempt, error = %e, "request failed, retrying");
                    // Retry after a short wait (async)
                    tokio::time::sleep(Duration::from_millis(100 * attempt as u64)).await;
                    attempt += 1;
                }
                Err(e) => {
                    return Err(e.context(format!(
                        "GET {} failed after {} attempt(s)",
                        url, attempt
                    )))
                }
            }
        }
    }

    async fn get_json_once<T: DeserializeOwned>(&self, url: &str) -> Result<Option<T>> {
        let response = self.client.get(url).send().await?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            anyhow::bail!("Server returned status code {}", status);
        }

        let document: T = response.json().await?;
        Ok(Some(document))
    }

    /// Validates a value before it is placed in a URL path
    pub fn validate_url_component(component: &str, component_type: &str) -> Result<()> {
        if component.is_empty() {
            anyhow::bail!("{} cannot be empty", component_type);
        }

        // Security: Prevent URL injection attacks
        if component.contains('/') || component.contains('\\') {
            anyhow::bail!(
                "Security: {} contains path separators which are not allowed",
                component_type
            );
        }

        if component.contains("..") {
            anyhow::bail!(
                "Security: {} contains '..' which is not allowed",
                component_type
            );
        }

        if component.contains('#') || component.contains('?') || component.contains('@') {
            anyhow::bail!(
                "Security: {} contains URL-unsafe characters",
                component_type
            );
        }

        Ok(())
    }
}
