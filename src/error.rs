//! Error taxonomy for the export pipeline.
//!
//! Anything that blocks producing a usable token or a usable page of results
//! carries a variant here and surfaces to the command layer, which reports it
//! and terminates the run. Best-effort enrichment failures are not represented:
//! they degrade to a missing value at the call site.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExportError {
    /// Missing or placeholder configuration, e.g. an unset client id.
    #[error("configuration error: {0}")]
    Config(String),

    /// The provider redirected back with an `error` query parameter.
    #[error("authorization denied: {0}")]
    AuthorizationDenied(String),

    /// No valid callback arrived within the wall-clock budget.
    #[error("authorization timed out after {0} seconds")]
    AuthorizationTimeout(u64),

    /// Non-2xx response from the token endpoint (code exchange or refresh).
    #[error("token exchange failed with status {status}: {body}")]
    TokenExchange { status: u16, body: String },

    /// A request still returned 401 after one refresh attempt.
    #[error("authentication failed; run `spotexport auth` to re-authorize")]
    Authentication,

    /// A request still returned 429 after one Retry-After backoff.
    #[error("rate limited by the API after one backoff retry")]
    RateLimited,

    /// Any other non-2xx API response.
    #[error("API request failed with status {status}: {body}")]
    Http { status: u16, body: String },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// A 2xx response whose body does not match the expected shape.
    #[error("unexpected response payload: {0}")]
    UnexpectedPayload(String),

    /// Token cache or CSV output could not be written.
    #[error("storage error: {0}")]
    Storage(String),
}

pub type Result<T> = std::result::Result<T, ExportError>;
