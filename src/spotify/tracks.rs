use std::{collections::HashMap, time::Duration};

use indicatif::{ProgressBar, ProgressStyle};
use reqwest::Method;

use crate::{
    error::{ExportError, Result},
    spotify::client::ApiClient,
    types::{PlaylistInfo, Track, TrackPage, TrackRow},
    warning,
};

/// Spotify caps `limit` on collection endpoints at 50 items per page.
const MAX_PAGE_SIZE: u64 = 50;

/// Walks cursor-paginated track collections and shapes each item into a flat
/// export row.
///
/// The album-detail cache is owned by the engine instance, not process-wide,
/// so separate runs (and tests) never leak state into each other. External
/// metadata is assumed immutable for the duration of one run; entries are
/// never invalidated.
pub struct TrackSync {
    client: ApiClient,
    album_totals: HashMap<String, Option<u32>>,
    page_size: u64,
}

impl TrackSync {
    pub fn new(client: ApiClient) -> Self {
        Self::with_page_size(client, MAX_PAGE_SIZE)
    }

    pub fn with_page_size(client: ApiClient, page_size: u64) -> Self {
        Self {
            client,
            album_totals: HashMap::new(),
            page_size: page_size.clamp(1, MAX_PAGE_SIZE),
        }
    }

    /// Fetches the complete Liked Songs collection in provider order.
    pub async fn fetch_liked(&mut self) -> Result<Vec<TrackRow>> {
        self.fetch_all("/me/tracks", &[]).await
    }

    /// Fetches all tracks of a playlist in provider order.
    pub async fn fetch_playlist(&mut self, playlist_id: &str) -> Result<Vec<TrackRow>> {
        let path = format!("/playlists/{playlist_id}/tracks");
        self.fetch_all(&path, &[("additional_types", "track".to_string())])
            .await
    }

    /// Resolves a playlist's display name, falling back to its id.
    pub async fn playlist_name(&mut self, playlist_id: &str) -> Result<String> {
        let path = format!("/playlists/{playlist_id}");
        let json = self.client.request(Method::GET, &path, &[]).await?;
        let info: PlaylistInfo = serde_json::from_value(json).map_err(|e| {
            ExportError::UnexpectedPayload(format!("playlist {playlist_id}: {e}"))
        })?;
        Ok(info
            .name
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| playlist_id.to_string()))
    }

    /// Returns the remote total of the Liked Songs collection via a
    /// `limit=1` probe, without transferring the collection itself.
    pub async fn liked_total(&mut self) -> Result<u64> {
        let json = self
            .client
            .request(
                Method::GET,
                "/me/tracks",
                &[("limit", "1".to_string()), ("offset", "0".to_string())],
            )
            .await?;
        Ok(json["total"].as_u64().unwrap_or(0))
    }

    /// Materializes a complete collection by walking an offset cursor.
    ///
    /// Each page requests `page_size` items; the offset advances by the
    /// number of items actually returned. The walk terminates on an empty
    /// page or when the provider reports no `next` page. Items are shaped in
    /// place and order is preserved exactly as the provider returned it;
    /// non-track entries (episodes, withdrawn items) are skipped.
    async fn fetch_all(&mut self, path: &str, extra: &[(&str, String)]) -> Result<Vec<TrackRow>> {
        let mut rows: Vec<TrackRow> = Vec::new();
        let mut offset: u64 = 0;

        let pb = ProgressBar::new_spinner();
        pb.set_message("Fetching tracks...");
        pb.enable_steady_tick(Duration::from_millis(100));
        pb.set_style(
            ProgressStyle::with_template("{spinner:.blue} {msg}")
                .unwrap()
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
        );

        loop {
            let mut query: Vec<(&str, String)> = vec![
                ("limit", self.page_size.to_string()),
                ("offset", offset.to_string()),
            ];
            query.extend(extra.iter().cloned());

            let json = match self.client.request(Method::GET, path, &query).await {
                Ok(json) => json,
                Err(e) => {
                    pb.finish_and_clear();
                    return Err(e);
                }
            };

            let page: TrackPage = match serde_json::from_value(json) {
                Ok(page) => page,
                Err(e) => {
                    pb.finish_and_clear();
                    return Err(ExportError::UnexpectedPayload(format!(
                        "page at offset {offset}: {e}"
                    )));
                }
            };

            if page.items.is_empty() {
                break;
            }

            let returned = page.items.len() as u64;
            for item in page.items {
                let Some(track) = item.track else { continue };
                if track.kind.as_deref() != Some("track") {
                    continue;
                }
                match self.shape_track(track).await {
                    Ok(row) => rows.push(row),
                    Err(e) => {
                        pb.finish_and_clear();
                        return Err(e);
                    }
                }
            }

            offset += returned;
            pb.set_message(format!("Fetched {} tracks...", rows.len()));

            if page.next.is_none() {
                break;
            }
        }

        pb.finish_and_clear();
        Ok(rows)
    }

    /// Flattens one track into an export row, joining artist names/ids and
    /// resolving the authoritative album track count.
    async fn shape_track(&mut self, track: Track) -> Result<TrackRow> {
        let artist_names = track
            .artists
            .iter()
            .filter_map(|a| a.name.as_deref())
            .collect::<Vec<_>>()
            .join("; ");
        let artist_ids = track
            .artists
            .iter()
            .filter_map(|a| a.id.as_deref())
            .collect::<Vec<_>>()
            .join("; ");

        let album = track.album;
        let album_id = album.as_ref().and_then(|a| a.id.clone());

        let mut album_total_tracks = match &album_id {
            Some(id) => self.album_total_tracks(id).await?,
            None => None,
        };
        if album_total_tracks.is_none() {
            // fall back to the page's own inline value
            album_total_tracks = album.as_ref().and_then(|a| a.total_tracks);
        }

        Ok(TrackRow {
            track_id: track.id,
            track_name: track.name,
            track_popularity: track.popularity,
            duration_ms: track.duration_ms,
            artist_names,
            artist_ids,
            album_id,
            album_name: album.as_ref().and_then(|a| a.name.clone()),
            album_release_date: album.as_ref().and_then(|a| a.release_date.clone()),
            album_total_tracks,
        })
    }

    /// Returns `total_tracks` from the full album endpoint, memoized per
    /// run. The lookup is best-effort for transient failures, which degrade
    /// to `None` with a warning (and are not cached, so a later item may try
    /// again). Authentication and rate-limit failures still abort the sync:
    /// they would fail every remaining request anyway.
    async fn album_total_tracks(&mut self, album_id: &str) -> Result<Option<u32>> {
        if let Some(total) = self.album_totals.get(album_id) {
            return Ok(*total);
        }

        let path = format!("/albums/{album_id}");
        match self.client.request(Method::GET, &path, &[]).await {
            Ok(json) => {
                let total = json["total_tracks"].as_u64().map(|t| t as u32);
                self.album_totals.insert(album_id.to_string(), total);
                Ok(total)
            }
            Err(e @ (ExportError::Authentication | ExportError::RateLimited)) => Err(e),
            Err(e) => {
                warning!("Album lookup failed for {}: {}", album_id, e);
                Ok(None)
            }
        }
    }
}
