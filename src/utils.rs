use std::path::Path;

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::{Rng, distr::Alphanumeric};
use sha2::{Digest, Sha256};

use crate::{
    error::{ExportError, Result},
    types::{PkcePair, TrackRow},
};

/// Number of raw random bytes backing the PKCE verifier. 64 bytes encode to
/// 86 URL-safe characters, comfortably above the provider minimum of 43.
const PKCE_VERIFIER_BYTES: usize = 64;

/// Length of the anti-CSRF state token in characters.
const STATE_TOKEN_LEN: usize = 24;

/// Generates a fresh PKCE verifier/challenge pair for one authorization
/// attempt. The verifier comes from the thread CSPRNG; the challenge is
/// `base64url_no_pad(SHA256(verifier))`.
pub fn generate_pkce_pair() -> PkcePair {
    let mut bytes = [0u8; PKCE_VERIFIER_BYTES];
    rand::rng().fill(&mut bytes[..]);
    let verifier = URL_SAFE_NO_PAD.encode(bytes);
    let challenge = generate_code_challenge(&verifier);
    PkcePair {
        verifier,
        challenge,
    }
}

pub fn generate_code_challenge(verifier: &str) -> String {
    let hash = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hash)
}

/// Generates the random state token bound to one authorization attempt.
pub fn random_state() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(STATE_TOKEN_LEN)
        .map(char::from)
        .collect()
}

/// Reduces a playlist name to a filesystem-safe file stem. Returns `None`
/// when nothing safe remains, in which case callers fall back to the id.
pub fn safe_filename(name: &str) -> Option<String> {
    let safe: String = name
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, ' ' | '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let trimmed = safe.trim().to_string();
    if trimmed.is_empty() { None } else { Some(trimmed) }
}

const CSV_COLUMNS: [&str; 10] = [
    "track_id",
    "track_name",
    "track_popularity",
    "duration_ms",
    "artist_names",
    "artist_ids",
    "album_id",
    "album_name",
    "album_release_date",
    "album_total_tracks",
];

fn csv_escape(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn opt_str(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

/// Serializes the rows to CSV with the fixed export column set.
pub fn tracks_to_csv(rows: &[TrackRow]) -> String {
    let mut out = String::new();
    out.push_str(&CSV_COLUMNS.join(","));
    out.push('\n');

    for row in rows {
        let fields = [
            opt_str(&row.track_id),
            opt_str(&row.track_name),
            row.track_popularity.map(|p| p.to_string()).unwrap_or_default(),
            row.duration_ms.map(|d| d.to_string()).unwrap_or_default(),
            row.artist_names.clone(),
            row.artist_ids.clone(),
            opt_str(&row.album_id),
            opt_str(&row.album_name),
            opt_str(&row.album_release_date),
            row.album_total_tracks
                .map(|t| t.to_string())
                .unwrap_or_default(),
        ];
        let line: Vec<String> = fields.iter().map(|f| csv_escape(f)).collect();
        out.push_str(&line.join(","));
        out.push('\n');
    }

    out
}

pub async fn write_tracks_csv(path: &Path, rows: &[TrackRow]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            async_fs::create_dir_all(parent)
                .await
                .map_err(|e| ExportError::Storage(e.to_string()))?;
        }
    }
    async_fs::write(path, tracks_to_csv(rows))
        .await
        .map_err(|e| ExportError::Storage(e.to_string()))
}
