use std::time::Duration;

use reqwest::{Client, Method, Response, StatusCode, header::RETRY_AFTER};
use serde_json::{Value, json};
use tokio::time::sleep;

use crate::{
    config,
    error::{ExportError, Result},
    management::TokenManager,
};

/// Authenticated Spotify Web API client with a bounded retry policy.
///
/// Each logical request gets at most one reauthentication retry (refresh on
/// 401) and at most one rate-limit retry (Retry-After backoff on 429). A
/// second consecutive 401 or 429 propagates as a fatal error; this is not a
/// retry loop, so worst-case latency per call stays bounded.
pub struct ApiClient {
    http: Client,
    base_url: String,
    tokens: TokenManager,
}

impl ApiClient {
    pub fn new(tokens: TokenManager) -> Self {
        Self::with_base_url(tokens, config::spotify_apiurl())
    }

    /// Constructor with an explicit API base URL, used by tests to point at
    /// a mock server.
    pub fn with_base_url(tokens: TokenManager, base_url: String) -> Self {
        Self {
            http: Client::new(),
            base_url,
            tokens,
        }
    }

    pub fn tokens(&self) -> &TokenManager {
        &self.tokens
    }

    /// Issues an authenticated request and returns the parsed JSON body.
    ///
    /// Algorithm:
    /// 1. Obtain a usable access token, refreshing first when the cached one
    ///    is already past its expiry margin, and send.
    /// 2. On 401 with a refresh token available: refresh, persist, retry the
    ///    original request exactly once. A second 401 is
    ///    [`ExportError::Authentication`].
    /// 3. On 429: sleep for the `Retry-After` header (seconds, default 1 if
    ///    absent or invalid, minimum 1), retry exactly once. A second 429 is
    ///    [`ExportError::RateLimited`].
    /// 4. Any other non-2xx after those retries is [`ExportError::Http`]
    ///    with the status and body.
    /// 5. A success body that is not valid JSON is returned as
    ///    `{"raw": <text>}` instead of failing.
    pub async fn request(
        &mut self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Value> {
        let url = self.url_for(path);

        let token = self.tokens.get_valid_token().await?;
        let mut response = self.send(method.clone(), &url, query, &token).await?;

        if response.status() == StatusCode::UNAUTHORIZED && self.tokens.has_refresh_token() {
            self.tokens.refresh().await?;
            let token = self.tokens.access_token().to_string();
            response = self.send(method.clone(), &url, query, &token).await?;
        }

        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            let wait = retry_after_secs(&response);
            sleep(Duration::from_secs(wait)).await;
            let token = self.tokens.access_token().to_string();
            response = self.send(method, &url, query, &token).await?;
        }

        let status = response.status();
        if !status.is_success() {
            return Err(match status {
                StatusCode::UNAUTHORIZED => ExportError::Authentication,
                StatusCode::TOO_MANY_REQUESTS => ExportError::RateLimited,
                _ => ExportError::Http {
                    status: status.as_u16(),
                    body: response.text().await.unwrap_or_default(),
                },
            });
        }

        let text = response.text().await?;
        Ok(serde_json::from_str(&text).unwrap_or_else(|_| json!({ "raw": text })))
    }

    async fn send(
        &self,
        method: Method,
        url: &str,
        query: &[(&str, String)],
        token: &str,
    ) -> Result<Response> {
        let response = self
            .http
            .request(method, url)
            .query(query)
            .bearer_auth(token)
            .header("Accept", "application/json")
            .send()
            .await?;
        Ok(response)
    }

    fn url_for(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }
}

/// Reads the Retry-After header in seconds; absent or invalid values fall
/// back to 1, and the wait is never shorter than 1 second.
fn retry_after_secs(response: &Response) -> u64 {
    response
        .headers()
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(1)
        .max(1)
}
