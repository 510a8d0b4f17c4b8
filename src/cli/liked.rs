use std::path::PathBuf;

use crate::{
    error, info, spotify,
    spotify::{client::ApiClient, tracks::TrackSync},
    success, utils,
};

/// Exports the user's Liked Songs to a CSV file (default:
/// `liked_tracks.csv` in the working directory).
pub async fn liked(output: Option<PathBuf>) {
    let tokens = match spotify::auth::ensure_token().await {
        Ok(manager) => manager,
        Err(e) => error!("{}", e),
    };

    let mut sync = TrackSync::new(ApiClient::new(tokens));

    info!("Fetching Liked Songs...");
    let rows = match sync.fetch_liked().await {
        Ok(rows) => rows,
        Err(e) => error!("Failed to fetch Liked Songs: {}", e),
    };

    let path = output.unwrap_or_else(|| PathBuf::from("liked_tracks.csv"));
    if let Err(e) = utils::write_tracks_csv(&path, &rows).await {
        error!("Failed to write {}: {}", path.display(), e);
    }

    success!("Exported {} tracks to {}", rows.len(), path.display());
}
