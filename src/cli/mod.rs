//! # CLI Module
//!
//! User-facing commands of the exporter. Each command delegates to the
//! Spotify integration layer and the token manager, handling user feedback
//! and error presentation.
//!
//! ## Commands
//!
//! - [`auth`] - Runs the interactive OAuth PKCE authorization flow and
//!   persists the obtained token.
//! - [`liked`] - Exports the user's Liked Songs to a CSV file.
//! - [`playlist`] - Exports a playlist's tracks to a CSV file named after
//!   the playlist.
//! - [`info`] - Shows token-cache status and the remote Liked Songs total.
//!
//! ## Error handling
//!
//! Anything that blocks producing a usable token or a usable page of
//! results terminates the run through the `error!` macro with a non-zero
//! exit status. Enrichment failures that affect only a single optional
//! field have already been degraded to missing values further down.

mod auth;
mod info;
mod liked;
mod playlist;

pub use auth::auth;
pub use info::info;
pub use liked::liked;
pub use playlist::playlist;
