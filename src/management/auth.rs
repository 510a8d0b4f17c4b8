use std::path::{Path, PathBuf};

use chrono::Utc;
use reqwest::Client;

use crate::{
    config,
    error::{ExportError, Result},
    types::Token,
};

/// Owns the persisted token bundle and its lifecycle: load at process start,
/// refresh when expired, rewrite durable storage after every change.
pub struct TokenManager {
    token: Token,
    cache_path: PathBuf,
    token_url: String,
    client_id: String,
}

impl TokenManager {
    pub fn new(token: Token) -> Self {
        Self::with_paths(
            token,
            Self::token_path(),
            config::spotify_apitoken_url(),
            config::spotify_client_id(),
        )
    }

    /// Constructor with explicit storage path and token endpoint, used by
    /// tests to point at a temp directory and a mock server.
    pub fn with_paths(
        token: Token,
        cache_path: PathBuf,
        token_url: String,
        client_id: String,
    ) -> Self {
        Self {
            token,
            cache_path,
            token_url,
            client_id,
        }
    }

    /// Loads the cached token bundle, if any. An absent or unreadable cache
    /// is treated as "no cache", never as an error: the caller falls back to
    /// refresh or interactive authorization.
    pub async fn load() -> Option<Self> {
        let token = Self::load_from(&Self::token_path()).await?;
        Some(Self::new(token))
    }

    /// Reads and parses a token bundle from `path`. Corrupt content yields
    /// `None`.
    pub async fn load_from(path: &Path) -> Option<Token> {
        let content = async_fs::read_to_string(path).await.ok()?;
        serde_json::from_str(&content).ok()
    }

    /// Persists the bundle with write-then-rename so a crash mid-write can
    /// never leave a half-written cache behind.
    pub async fn persist(&self) -> Result<()> {
        if let Some(parent) = self.cache_path.parent() {
            async_fs::create_dir_all(parent)
                .await
                .map_err(|e| ExportError::Storage(e.to_string()))?;
        }

        let json = serde_json::to_string_pretty(&self.token)
            .map_err(|e| ExportError::Storage(e.to_string()))?;
        let tmp = self.cache_path.with_extension("json.tmp");
        async_fs::write(&tmp, json)
            .await
            .map_err(|e| ExportError::Storage(e.to_string()))?;
        async_fs::rename(&tmp, &self.cache_path)
            .await
            .map_err(|e| ExportError::Storage(e.to_string()))
    }

    pub fn is_valid(&self) -> bool {
        self.token.is_valid_at(Utc::now().timestamp() as u64)
    }

    pub fn has_refresh_token(&self) -> bool {
        self.token
            .refresh_token
            .as_deref()
            .is_some_and(|t| !t.is_empty())
    }

    pub fn access_token(&self) -> &str {
        &self.token.access_token
    }

    pub fn current_token(&self) -> &Token {
        &self.token
    }

    /// Returns a usable access token, refreshing first when the cached one
    /// is expired and a refresh token is available.
    pub async fn get_valid_token(&mut self) -> Result<String> {
        if !self.is_valid() {
            if !self.has_refresh_token() {
                return Err(ExportError::Authentication);
            }
            self.refresh().await?;
        }
        Ok(self.token.access_token.clone())
    }

    /// Exchanges the refresh token for a new bundle, overwriting the current
    /// one in place and persisting it. Providers may omit the refresh token
    /// in the response; the previous one is preserved in that case.
    pub async fn refresh(&mut self) -> Result<()> {
        let refresh_token = self
            .token
            .refresh_token
            .clone()
            .ok_or(ExportError::Authentication)?;

        let client = Client::new();
        let res = client
            .post(&self.token_url)
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", &refresh_token),
                ("client_id", &self.client_id),
            ])
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(ExportError::TokenExchange {
                status: status.as_u16(),
                body,
            });
        }

        let json: serde_json::Value = serde_json::from_str(&body).map_err(|_| {
            ExportError::TokenExchange {
                status: status.as_u16(),
                body: body.clone(),
            }
        })?;

        let access_token = json["access_token"]
            .as_str()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ExportError::TokenExchange {
                status: status.as_u16(),
                body: body.clone(),
            })?
            .to_string();

        self.token = Token {
            access_token,
            refresh_token: json["refresh_token"]
                .as_str()
                .map(str::to_string)
                .or(Some(refresh_token)),
            scope: json["scope"]
                .as_str()
                .map(str::to_string)
                .or_else(|| self.token.scope.clone()),
            expires_in: json["expires_in"].as_u64().unwrap_or(3600),
            obtained_at: Utc::now().timestamp() as u64,
        };
        self.persist().await?;

        Ok(())
    }

    fn token_path() -> PathBuf {
        let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push("spotexport/cache/token.json");
        path
    }
}
