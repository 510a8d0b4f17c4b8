use serde::{Deserialize, Serialize};
use tabled::Tabled;

/// Safety margin subtracted from `expires_in` when checking token validity.
pub const TOKEN_EXPIRY_MARGIN_SECS: u64 = 30;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
    pub expires_in: u64,
    pub obtained_at: u64,
}

impl Token {
    /// Returns true while the access token is still usable at `now`
    /// (Unix seconds). The 30 s margin anticipates expiry so an in-flight
    /// request does not race the deadline.
    pub fn is_valid_at(&self, now: u64) -> bool {
        let deadline = self
            .obtained_at
            .saturating_add(self.expires_in.saturating_sub(TOKEN_EXPIRY_MARGIN_SECS));
        now < deadline
    }
}

/// One-shot PKCE credentials; never persisted, discarded after code exchange.
#[derive(Debug, Clone)]
pub struct PkcePair {
    pub verifier: String,
    pub challenge: String,
}

/// Query parameters captured from the authorization redirect.
///
/// Written by the callback handler, read by the orchestrator's wait loop.
/// Exactly one of {code+state, error} is expected for a legitimate callback.
#[derive(Debug, Clone, Default)]
pub struct CallbackResult {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackPage {
    #[serde(default)]
    pub items: Vec<PageItem>,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub total: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageItem {
    #[serde(default)]
    pub track: Option<Track>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Track {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub popularity: Option<u32>,
    #[serde(default)]
    pub duration_ms: Option<u64>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub album: Option<AlbumRef>,
    #[serde(default)]
    pub artists: Vec<ArtistRef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlbumRef {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub total_tracks: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtistRef {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistInfo {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// One flat output record, handed to the CSV writer in provider order.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackRow {
    pub track_id: Option<String>,
    pub track_name: Option<String>,
    pub track_popularity: Option<u32>,
    pub duration_ms: Option<u64>,
    pub artist_names: String,
    pub artist_ids: String,
    pub album_id: Option<String>,
    pub album_name: Option<String>,
    pub album_release_date: Option<String>,
    pub album_total_tracks: Option<u32>,
}

#[derive(Tabled)]
pub struct StatusTableRow {
    pub field: String,
    pub value: String,
}
