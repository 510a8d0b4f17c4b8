use std::path::PathBuf;

use crate::{
    error, info, spotify,
    spotify::{client::ApiClient, tracks::TrackSync},
    success, utils, warning,
};

/// Exports a playlist's tracks to a CSV file named after the playlist
/// (sanitized), unless an explicit output path is given.
pub async fn playlist(playlist_id: String, output: Option<PathBuf>) {
    let playlist_id = playlist_id.trim().to_string();
    if playlist_id.is_empty() {
        error!("A playlist id is required.");
    }

    let tokens = match spotify::auth::ensure_token().await {
        Ok(manager) => manager,
        Err(e) => error!("{}", e),
    };

    let mut sync = TrackSync::new(ApiClient::new(tokens));

    let name = match sync.playlist_name(&playlist_id).await {
        Ok(name) => name,
        Err(e) => {
            warning!("Failed to resolve playlist name: {}", e);
            playlist_id.clone()
        }
    };

    info!("Fetching tracks of playlist '{}'...", name);
    let rows = match sync.fetch_playlist(&playlist_id).await {
        Ok(rows) => rows,
        Err(e) => error!("Failed to fetch playlist tracks: {}", e),
    };

    let path = output.unwrap_or_else(|| {
        let stem = utils::safe_filename(&name).unwrap_or_else(|| playlist_id.clone());
        PathBuf::from(format!("{stem}.csv"))
    });
    if let Err(e) = utils::write_tracks_csv(&path, &rows).await {
        error!("Failed to write {}: {}", path.display(), e);
    }

    success!("Exported {} tracks to {}", rows.len(), path.display());
}
