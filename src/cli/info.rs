use chrono::{DateTime, Utc};
use tabled::{Table, settings::Style};

use crate::{
    management::TokenManager,
    spotify::{client::ApiClient, tracks::TrackSync},
    types::StatusTableRow,
    warning,
};

fn format_ts(secs: u64) -> String {
    DateTime::<Utc>::from_timestamp(secs as i64, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| secs.to_string())
}

/// Shows the token-cache status and the remote Liked Songs total.
pub async fn info() {
    let Some(manager) = TokenManager::load().await else {
        warning!("No token cache found. Run spotexport auth first.");
        return;
    };

    let token = manager.current_token();
    let expires_at = token.obtained_at + token.expires_in;
    let rows = vec![
        StatusTableRow {
            field: "obtained at".to_string(),
            value: format_ts(token.obtained_at),
        },
        StatusTableRow {
            field: "expires at".to_string(),
            value: format_ts(expires_at),
        },
        StatusTableRow {
            field: "valid".to_string(),
            value: if manager.is_valid() { "yes" } else { "no" }.to_string(),
        },
        StatusTableRow {
            field: "refresh token".to_string(),
            value: if manager.has_refresh_token() {
                "present"
            } else {
                "absent"
            }
            .to_string(),
        },
        StatusTableRow {
            field: "scope".to_string(),
            value: token.scope.clone().unwrap_or_default(),
        },
    ];

    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{}", table);

    let mut sync = TrackSync::new(ApiClient::new(manager));
    match sync.liked_total().await {
        Ok(total) => crate::info!("Liked Songs in library: {}", total),
        Err(e) => warning!("Could not fetch Liked Songs total: {}", e),
    }
}
