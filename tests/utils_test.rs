use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use sha2::{Digest, Sha256};
use spotexport::types::TrackRow;
use spotexport::utils::*;

fn create_test_row(id: &str, name: &str) -> TrackRow {
    TrackRow {
        track_id: Some(id.to_string()),
        track_name: Some(name.to_string()),
        track_popularity: Some(42),
        duration_ms: Some(185_000),
        artist_names: "Artist A; Artist B".to_string(),
        artist_ids: "a1; a2".to_string(),
        album_id: Some("alb1".to_string()),
        album_name: Some("Album".to_string()),
        album_release_date: Some("2023-10-01".to_string()),
        album_total_tracks: Some(12),
    }
}

#[test]
fn test_generate_pkce_pair_verifier_shape() {
    let pair = generate_pkce_pair();

    // 64 random bytes encode to 86 URL-safe characters without padding
    assert_eq!(pair.verifier.len(), 86);
    assert!(
        pair.verifier
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    );

    // Two generated pairs should differ
    let pair2 = generate_pkce_pair();
    assert_ne!(pair.verifier, pair2.verifier);
    assert_ne!(pair.challenge, pair2.challenge);
}

#[test]
fn test_pkce_challenge_round_trip() {
    // For all generated pairs: challenge == b64url_no_pad(SHA256(verifier))
    for _ in 0..10 {
        let pair = generate_pkce_pair();
        let expected = URL_SAFE_NO_PAD.encode(Sha256::digest(pair.verifier.as_bytes()));
        assert_eq!(pair.challenge, expected);
    }
}

#[test]
fn test_generate_code_challenge_deterministic() {
    let challenge = generate_code_challenge("test_verifier_123");
    assert!(!challenge.is_empty());
    assert_eq!(challenge, generate_code_challenge("test_verifier_123"));
    assert_ne!(challenge, generate_code_challenge("different_verifier"));
    assert!(
        challenge
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    );
}

#[test]
fn test_random_state() {
    let state = random_state();
    assert_eq!(state.len(), 24);
    assert!(state.chars().all(|c| c.is_ascii_alphanumeric()));
    assert_ne!(state, random_state());
}

#[test]
fn test_safe_filename() {
    assert_eq!(
        safe_filename("My Playlist 2023").as_deref(),
        Some("My Playlist 2023")
    );
    assert_eq!(
        safe_filename("rock/metal: best?").as_deref(),
        Some("rock_metal_ best_")
    );
    // Dots, underscores and hyphens survive
    assert_eq!(safe_filename("a.b_c-d").as_deref(), Some("a.b_c-d"));
    // Nothing safe remains
    assert_eq!(safe_filename("   "), None);
    assert_eq!(safe_filename(""), None);
}

#[test]
fn test_tracks_to_csv_header_and_rows() {
    let rows = vec![create_test_row("t1", "Song One")];
    let csv = tracks_to_csv(&rows);
    let mut lines = csv.lines();

    assert_eq!(
        lines.next().unwrap(),
        "track_id,track_name,track_popularity,duration_ms,artist_names,artist_ids,album_id,album_name,album_release_date,album_total_tracks"
    );
    assert_eq!(
        lines.next().unwrap(),
        "t1,Song One,42,185000,Artist A; Artist B,a1; a2,alb1,Album,2023-10-01,12"
    );
    assert!(lines.next().is_none());
}

#[test]
fn test_tracks_to_csv_escaping_and_missing_values() {
    let mut row = create_test_row("t2", "Hello, \"World\"");
    row.track_popularity = None;
    row.album_total_tracks = None;

    let csv = tracks_to_csv(&[row]);
    let data_line = csv.lines().nth(1).unwrap();

    // Comma and quotes force quoting with doubled inner quotes
    assert!(data_line.starts_with("t2,\"Hello, \"\"World\"\"\","));
    // Missing numeric fields serialize as empty cells
    assert!(data_line.ends_with(",2023-10-01,"));
}

#[test]
fn test_tracks_to_csv_quotes_carriage_returns() {
    let row = create_test_row("t3", "Weird\rName");
    let csv = tracks_to_csv(&[row]);
    // A bare carriage return must force quoting like a newline does
    assert!(csv.contains("t3,\"Weird\rName\",42"));
}

#[test]
fn test_callback_binding() {
    let (addr, path) =
        spotexport::server::callback_binding("http://127.0.0.1:8721/callback").unwrap();
    assert_eq!(addr.to_string(), "127.0.0.1:8721");
    assert_eq!(path, "/callback");

    // Path defaults to /callback when the URI has none
    let (_, path) = spotexport::server::callback_binding("http://127.0.0.1:9000").unwrap();
    assert_eq!(path, "/callback");

    // Port falls back to the scheme default
    let (addr, _) = spotexport::server::callback_binding("http://127.0.0.1/cb").unwrap();
    assert_eq!(addr.port(), 80);

    assert!(spotexport::server::callback_binding("not a uri").is_err());
}
