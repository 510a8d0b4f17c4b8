use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::{Value, json};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use spotexport::management::TokenManager;
use spotexport::spotify::{client::ApiClient, tracks::TrackSync};

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs()
}

fn sync_for(server: &MockServer, dir: &tempfile::TempDir) -> TrackSync {
    let manager = TokenManager::with_paths(
        spotexport::types::Token {
            access_token: "fresh-token".to_string(),
            refresh_token: Some("refresh-1".to_string()),
            scope: None,
            expires_in: 3600,
            obtained_at: now_secs(),
        },
        dir.path().join("token.json"),
        format!("{}/api/token", server.uri()),
        "client-id".to_string(),
    );
    TrackSync::new(ApiClient::with_base_url(manager, server.uri()))
}

fn track_item(id: usize, album: Value) -> Value {
    json!({
        "track": {
            "id": format!("t{id}"),
            "name": format!("Track {id}"),
            "type": "track",
            "popularity": 50,
            "duration_ms": 180_000,
            "album": album,
            "artists": [{"id": "a1", "name": "Artist"}]
        }
    })
}

fn page_body(start: usize, count: usize, has_next: bool) -> Value {
    let items: Vec<Value> = (start..start + count)
        .map(|i| track_item(i, Value::Null))
        .collect();
    json!({
        "items": items,
        "next": if has_next { json!("https://api.example/next") } else { Value::Null },
        "total": 107
    })
}

#[tokio::test]
async fn test_three_pages_yield_all_items_in_order() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    // Pages of 50, 50 and 7; `next` present on the first two only
    Mock::given(method("GET"))
        .and(path("/me/tracks"))
        .and(query_param("limit", "50"))
        .and(query_param("offset", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_body(0, 50, true)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/me/tracks"))
        .and(query_param("offset", "50"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_body(50, 50, true)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/me/tracks"))
        .and(query_param("offset", "100"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_body(100, 7, false)))
        .expect(1)
        .mount(&server)
        .await;

    let mut sync = sync_for(&server, &dir);
    let rows = sync.fetch_liked().await.unwrap();

    // Exactly 107 items, stopping after the third page
    assert_eq!(rows.len(), 107);
    assert_eq!(server.received_requests().await.unwrap().len(), 3);

    // Provider ordering is preserved, no reordering or deduplication
    for (i, row) in rows.iter().enumerate() {
        assert_eq!(row.track_id.as_deref(), Some(format!("t{i}").as_str()));
    }
}

#[tokio::test]
async fn test_empty_first_page_terminates_immediately() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    Mock::given(method("GET"))
        .and(path("/me/tracks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [],
            "next": "https://api.example/next",
            "total": 0
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut sync = sync_for(&server, &dir);
    let rows = sync.fetch_liked().await.unwrap();
    assert!(rows.is_empty());
}

#[tokio::test]
async fn test_non_track_items_are_skipped() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    let body = json!({
        "items": [
            track_item(0, Value::Null),
            {"track": {"id": "ep1", "name": "Episode", "type": "episode"}},
            {"track": null},
            track_item(1, Value::Null)
        ],
        "next": null
    });
    Mock::given(method("GET"))
        .and(path("/me/tracks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(1)
        .mount(&server)
        .await;

    let mut sync = sync_for(&server, &dir);
    let rows = sync.fetch_liked().await.unwrap();

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].track_id.as_deref(), Some("t0"));
    assert_eq!(rows[1].track_id.as_deref(), Some("t1"));
}

#[tokio::test]
async fn test_album_lookup_is_memoized_per_run() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    let album = json!({"id": "alb1", "name": "Album", "release_date": "2023-01-01", "total_tracks": 3});
    let body = json!({
        "items": [track_item(0, album.clone()), track_item(1, album)],
        "next": null
    });
    Mock::given(method("GET"))
        .and(path("/me/tracks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(1)
        .mount(&server)
        .await;

    // Two tracks share the album; exactly one detail request goes out
    Mock::given(method("GET"))
        .and(path("/albums/alb1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "alb1",
            "total_tracks": 12
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut sync = sync_for(&server, &dir);
    let rows = sync.fetch_liked().await.unwrap();

    assert_eq!(rows.len(), 2);
    // The authoritative count from the album endpoint wins over the inline 3
    assert_eq!(rows[0].album_total_tracks, Some(12));
    assert_eq!(rows[1].album_total_tracks, Some(12));
}

#[tokio::test]
async fn test_album_total_falls_back_to_inline_value() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    let album = json!({"id": "alb2", "name": "Album", "total_tracks": 5});
    Mock::given(method("GET"))
        .and(path("/me/tracks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [track_item(0, album)],
            "next": null
        })))
        .expect(1)
        .mount(&server)
        .await;

    // Detail endpoint yields nothing useful
    Mock::given(method("GET"))
        .and(path("/albums/alb2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "alb2"})))
        .expect(1)
        .mount(&server)
        .await;

    let mut sync = sync_for(&server, &dir);
    let rows = sync.fetch_liked().await.unwrap();

    assert_eq!(rows[0].album_total_tracks, Some(5));
}

#[tokio::test]
async fn test_playlist_fetch_uses_playlist_endpoint() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    Mock::given(method("GET"))
        .and(path("/playlists/pl1/tracks"))
        .and(query_param("additional_types", "track"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [track_item(0, Value::Null)],
            "next": null
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/playlists/pl1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"id": "pl1", "name": "Road Trip"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let mut sync = sync_for(&server, &dir);
    assert_eq!(sync.playlist_name("pl1").await.unwrap(), "Road Trip");

    let rows = sync.fetch_playlist("pl1").await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].track_id.as_deref(), Some("t0"));
}

#[tokio::test]
async fn test_playlist_name_falls_back_to_id_when_name_missing() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    Mock::given(method("GET"))
        .and(path("/playlists/pl2"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"id": "pl2", "name": null})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let mut sync = sync_for(&server, &dir);
    assert_eq!(sync.playlist_name("pl2").await.unwrap(), "pl2");
}

#[tokio::test]
async fn test_liked_total_probe() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    Mock::given(method("GET"))
        .and(path("/me/tracks"))
        .and(query_param("limit", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [track_item(0, Value::Null)],
            "next": "https://api.example/next",
            "total": 2357
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut sync = sync_for(&server, &dir);
    assert_eq!(sync.liked_total().await.unwrap(), 2357);
}
