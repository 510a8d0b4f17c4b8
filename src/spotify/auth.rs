use std::{sync::Arc, time::Duration};

use chrono::Utc;
use reqwest::Client;
use tokio::sync::{Mutex, oneshot};
use url::Url;

use crate::{
    config,
    error::{ExportError, Result},
    management::TokenManager,
    server,
    types::{CallbackResult, Token},
    utils, warning,
};

/// Runs the complete OAuth 2.0 PKCE authorization flow with Spotify.
///
/// This function orchestrates the entire interactive process:
/// 1. Generating a PKCE verifier/challenge pair and an anti-CSRF state token
/// 2. Starting the local callback server on the redirect URI's host/port
/// 3. Opening the authorization URL in the user's browser
/// 4. Polling the callback slot until a valid redirect arrives or the
///    wall-clock budget elapses
/// 5. Exchanging the authorization code for a token bundle
///
/// The callback server is shut down on every exit path, success or failure;
/// it never outlives one authorization attempt.
///
/// # Returns
///
/// The freshly obtained [`Token`] with `obtained_at` stamped. Persisting it
/// is the caller's responsibility.
///
/// # Errors
///
/// - [`ExportError::Config`] - missing/placeholder client id or an
///   unparseable redirect URI
/// - [`ExportError::AuthorizationDenied`] - the provider redirected back
///   with an `error` parameter
/// - [`ExportError::AuthorizationTimeout`] - no valid callback within the
///   configured budget
/// - [`ExportError::TokenExchange`] - non-2xx from the token endpoint
///
/// # Security
///
/// The verifier never leaves the process and is discarded after the
/// exchange. A callback whose state token differs from the attempt's is
/// ignored (with a one-time diagnostic) and polling continues; a forged
/// code can therefore never complete the flow.
pub async fn authorize() -> Result<Token> {
    let client_id = config::spotify_client_id();
    if config::client_id_is_placeholder(&client_id) {
        return Err(ExportError::Config(
            "SPOTIFY_API_AUTH_CLIENT_ID is not set; add it to the environment or the .env file"
                .to_string(),
        ));
    }

    let pair = utils::generate_pkce_pair();
    let state_token = utils::random_state();
    let redirect_uri = config::spotify_redirect_uri();
    let (addr, callback_path) = server::callback_binding(&redirect_uri)?;

    let shared_state: Arc<Mutex<Option<CallbackResult>>> = Arc::new(Mutex::new(None));
    let (shutdown_tx, shutdown_rx) = oneshot::channel();

    let server_state = Arc::clone(&shared_state);
    tokio::spawn(async move {
        server::start_callback_server(addr, callback_path, server_state, shutdown_rx).await;
    });

    let auth_url = build_auth_url(
        &client_id,
        &redirect_uri,
        &config::spotify_scope(),
        &pair.challenge,
        &state_token,
    )?;

    // Open the authorization URL in the default browser
    if webbrowser::open(&auth_url).is_err() {
        warning!(
            "Failed to open browser. Please navigate to the following URL manually:\n{}",
            auth_url
        )
    }

    let outcome = wait_for_callback(
        shared_state,
        &state_token,
        config::auth_poll_interval(),
        config::auth_timeout(),
    )
    .await;

    // Tear the receiver down before acting on the outcome
    let _ = shutdown_tx.send(());

    let code = outcome?;
    exchange_code_pkce(&code, &pair.verifier).await
}

/// Builds the authorization URL with the query parameters Spotify requires
/// for the PKCE code grant.
fn build_auth_url(
    client_id: &str,
    redirect_uri: &str,
    scope: &str,
    code_challenge: &str,
    state: &str,
) -> Result<String> {
    let url = Url::parse_with_params(
        &config::spotify_apiauth_url(),
        &[
            ("client_id", client_id),
            ("response_type", "code"),
            ("redirect_uri", redirect_uri),
            ("code_challenge_method", "S256"),
            ("code_challenge", code_challenge),
            ("scope", scope),
            ("state", state),
            ("show_dialog", "false"),
        ],
    )
    .map_err(|e| ExportError::Config(format!("invalid authorization URL: {e}")))?;

    Ok(url.into())
}

/// Polls the shared callback slot until it holds a terminal result.
///
/// Runs concurrently with the callback server, which fills the slot from
/// the redirect's query parameters. Transitions:
///
/// - `error` parameter present → [`ExportError::AuthorizationDenied`]
/// - code present and state matches `expected_state` → `Ok(code)`
/// - code present but state differs → ignored; a diagnostic is printed once
///   and polling continues (anti-CSRF)
/// - `timeout` elapsed → [`ExportError::AuthorizationTimeout`]
pub async fn wait_for_callback(
    shared_state: Arc<Mutex<Option<CallbackResult>>>,
    expected_state: &str,
    poll_interval: Duration,
    timeout: Duration,
) -> Result<String> {
    use std::time::Instant;

    let start = Instant::now();
    let mut mismatch_reported = false;

    while start.elapsed() < timeout {
        {
            let slot = shared_state.lock().await;
            if let Some(result) = slot.as_ref() {
                if let Some(err) = &result.error {
                    return Err(ExportError::AuthorizationDenied(err.clone()));
                }
                if let Some(code) = &result.code {
                    if result.state.as_deref() == Some(expected_state) {
                        return Ok(code.clone());
                    }
                    if !mismatch_reported {
                        warning!("Ignoring callback with mismatched state token.");
                        mismatch_reported = true;
                    }
                }
            }
        }
        tokio::time::sleep(poll_interval).await;
    }

    Err(ExportError::AuthorizationTimeout(timeout.as_secs()))
}

/// Exchanges an authorization code for a token bundle using PKCE.
///
/// Completes the flow by POSTing the code together with the original code
/// verifier to the token endpoint. Any non-2xx response is a
/// [`ExportError::TokenExchange`] carrying the status and body. The local
/// `obtained_at` timestamp is stamped onto the bundle before returning.
pub async fn exchange_code_pkce(code: &str, verifier: &str) -> Result<Token> {
    let client_id = config::spotify_client_id();
    let redirect_uri = config::spotify_redirect_uri();

    let client = Client::new();
    let res = client
        .post(&config::spotify_apitoken_url())
        .form(&[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", &redirect_uri),
            ("client_id", &client_id),
            ("code_verifier", verifier),
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

    let json: serde_json::Value =
        serde_json::from_str(&body).map_err(|_| ExportError::TokenExchange {
            status: status.as_u16(),
            body: body.clone(),
        })?;

    let access_token = json["access_token"]
        .as_str()
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ExportError::TokenExchange {
            status: status.as_u16(),
            body: body.clone(),
        })?
        .to_string();

    Ok(Token {
        access_token,
        refresh_token: json["refresh_token"].as_str().map(str::to_string),
        scope: json["scope"].as_str().map(str::to_string),
        expires_in: json["expires_in"].as_u64().unwrap_or(3600),
        obtained_at: Utc::now().timestamp() as u64,
    })
}

/// Returns a ready-to-use token manager, authorizing interactively only
/// when necessary.
///
/// Resolution order:
/// 1. cached token that is still valid → use it
/// 2. cached token with a refresh token → refresh and persist
/// 3. otherwise → run the interactive PKCE flow and persist the result
pub async fn ensure_token() -> Result<TokenManager> {
    if let Some(mut manager) = TokenManager::load().await {
        if manager.is_valid() {
            return Ok(manager);
        }
        if manager.has_refresh_token() {
            match manager.refresh().await {
                Ok(()) => return Ok(manager),
                Err(e) => warning!("Token refresh failed ({}); re-authorizing.", e),
            }
        }
    }

    let scope = config::spotify_scope();
    crate::info!("Opening the browser to authorize access (scopes: {})...", scope);

    let token = authorize().await?;
    let manager = TokenManager::new(token);
    manager.persist().await?;
    Ok(manager)
}
