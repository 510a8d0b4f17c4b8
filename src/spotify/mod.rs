//! # Spotify Integration Module
//!
//! This module implements the Spotify-facing core of the exporter: the OAuth
//! 2.0 PKCE authorization flow, a resilient authenticated API client, and the
//! paginated sync engine that materializes track collections.
//!
//! ## Architecture
//!
//! ```text
//! Application Layer (CLI)
//!          ↓
//! Spotify Integration Layer
//!     ├── Authorization (OAuth 2.0 PKCE orchestrator)
//!     ├── Resilient API Client (401 refresh, 429 backoff)
//!     └── Paginated Sync Engine (offset cursor, album enrichment)
//!          ↓
//! HTTP Layer (reqwest, JSON)
//!          ↓
//! Spotify Web API
//! ```
//!
//! ## Authorization flow
//!
//! [`auth`] drives the interactive flow as a small state machine:
//!
//! 1. **IDLE → AWAITING_CALLBACK**: generate a PKCE verifier/challenge pair
//!    and a random state token, start the local callback server on the
//!    redirect URI's host/port, open the authorization URL in the browser.
//! 2. **AWAITING_CALLBACK**: poll the shared callback slot at a configured
//!    interval up to a wall-clock timeout. A provider `error` parameter or
//!    the timeout fails the attempt; a code accompanied by a state token
//!    that does not match the attempt's is ignored (CSRF protection) and
//!    polling continues.
//! 3. **EXCHANGING → COMPLETE**: trade the code plus the original verifier
//!    for a token bundle at the token endpoint and stamp `obtained_at`.
//!
//! The callback server is torn down on every exit from the wait state.
//!
//! ## Request resilience
//!
//! [`client`] wraps every API call with a bounded retry policy: at most one
//! token refresh after a 401 and at most one Retry-After backoff after a
//! 429. A second consecutive 401 or 429 propagates as a fatal error rather
//! than looping, which bounds worst-case latency per logical call.
//!
//! ## Pagination
//!
//! [`tracks`] walks offset/limit pages of a collection endpoint in provider
//! order, shapes each item into a flat export row, and enriches album track
//! counts through a per-run memoized detail lookup.

pub mod auth;
pub mod client;
pub mod tracks;
