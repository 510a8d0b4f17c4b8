//! # API Module
//!
//! HTTP endpoints for the short-lived local callback server used during the
//! OAuth 2.0 PKCE authorization flow.
//!
//! ## Endpoints
//!
//! - [`callback`] - Receives the authorization redirect from Spotify and
//!   records its query parameters (`code`, `state`, `error`) into the shared
//!   result slot polled by the authorization orchestrator. The handler only
//!   records; the code exchange happens in [`crate::spotify::auth`] so the
//!   state token can be verified first.
//! - [`health`] - Liveness probe returning application status and version.
//!
//! ## Architecture
//!
//! Built on [Axum](https://docs.rs/axum). The shared slot is injected via an
//! `Extension` layer; the server itself lives in [`crate::server`] and is
//! torn down by the orchestrator as soon as the attempt reaches a terminal
//! state.

mod callback;
mod health;

pub use callback::callback;
pub use health::health;
