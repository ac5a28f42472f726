//! Integration tests for the search/download workflow against a mock
//! catalog API (wiremock).

use std::path::Path;
use std::sync::Arc;

use pretty_assertions::assert_eq;
use serde_json::json;
use serial_test::serial;
use teloxide::types::ChatId;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use flacbot::catalog::CatalogClient;
use flacbot::errors::{CatalogError, WorkflowError};
use flacbot::placeholder::PLACEHOLDER_SIGNATURE;
use flacbot::session::SessionStore;
use flacbot::workflow::{Coordinator, SearchReply};

const OWNER: ChatId = ChatId(42);

fn coordinator_for(base_url: &str, dir: &Path) -> (Coordinator, Arc<SessionStore>) {
    let sessions = Arc::new(SessionStore::new());
    let catalog = CatalogClient::new(base_url).unwrap();
    let coordinator = Coordinator::new(catalog, Arc::clone(&sessions), dir);
    (coordinator, sessions)
}

fn search_body(items: serde_json::Value) -> serde_json::Value {
    json!({ "success": true, "data": { "tracks": { "items": items } } })
}

#[tokio::test]
async fn successful_search_normalizes_and_persists_session() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/get-music"))
        .and(query_param("q", "one vision"))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_body(json!([
            { "id": 42, "title": null, "performer": null, "duration": 185 }
        ]))))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let (coordinator, sessions) = coordinator_for(&server.uri(), dir.path());

    let reply = coordinator.search(OWNER, "one vision").await;
    let tracks = match reply {
        SearchReply::Results { tracks, status } => {
            // remote provenance status, two lines for display
            assert_eq!(status.lines().count(), 2);
            tracks
        }
        SearchReply::NoResults => panic!("expected results"),
    };

    assert_eq!(tracks.len(), 1);
    assert_eq!(tracks[0].id, "42");
    assert_eq!(tracks[0].title, "Unknown Title");
    assert_eq!(tracks[0].artist, "Unknown Artist");
    assert_eq!(tracks[0].duration_display, "3:05");
    assert!(!tracks[0].is_fallback);

    // the id is resolvable immediately after the owning search
    let resolved = sessions.resolve_track(OWNER, "42").await.unwrap();
    assert_eq!(resolved.id, "42");
}

#[tokio::test]
async fn empty_remote_result_list_reports_no_results_and_writes_no_session() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/get-music"))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_body(json!([]))))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let (coordinator, sessions) = coordinator_for(&server.uri(), dir.path());

    assert!(matches!(coordinator.search(OWNER, "nothing").await, SearchReply::NoResults));
    assert!(sessions.get(OWNER).await.is_none());
}

#[tokio::test]
async fn unreachable_remote_yields_fallback_results() {
    // Nothing listens on the discard port; every search must still answer.
    let dir = tempfile::tempdir().unwrap();
    let (coordinator, sessions) = coordinator_for("http://127.0.0.1:9", dir.path());

    let reply = coordinator.search(OWNER, "Bohemian Rhapsody Queen").await;
    let tracks = match reply {
        SearchReply::Results { tracks, .. } => tracks,
        SearchReply::NoResults => panic!("fallback must never be empty"),
    };

    assert_eq!(tracks.len(), 3);
    for (i, track) in tracks.iter().enumerate() {
        assert_eq!(track.title, format!("Bohemian Rhapsody Queen - Song {}", i + 1));
        assert!(track.is_fallback);
    }
    assert!(sessions.get(OWNER).await.is_some());
}

#[tokio::test]
async fn fallback_download_never_calls_the_remote_download_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/get-music"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/download-music"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let (coordinator, _sessions) = coordinator_for(&server.uri(), dir.path());

    coordinator.search(OWNER, "Bohemian Rhapsody Queen").await;
    let result = coordinator.select_and_download(OWNER, "1", "27").await.unwrap();

    assert!(result.used_fallback);
    let bytes = std::fs::read(&result.path).unwrap();
    assert_eq!(&bytes[..8], &PLACEHOLDER_SIGNATURE);
    assert_eq!(result.path.extension().and_then(|e| e.to_str()), Some("flac"));

    // .expect(0) on the download mock is verified when the server drops
    server.verify().await;
}

#[tokio::test]
async fn failing_download_url_degrades_to_placeholder() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/get-music"))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_body(json!([
            {
                "id": "42",
                "title": "One Vision",
                "performer": { "name": "Queen" },
                "album": { "title": "A Kind of Magic" },
                "duration": 310
            }
        ]))))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/download-music"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "success": false, "error": "track is unavailable" })),
        )
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let (coordinator, _sessions) = coordinator_for(&server.uri(), dir.path());

    coordinator.search(OWNER, "one vision").await;
    let result = coordinator.select_and_download(OWNER, "42", "27").await.unwrap();

    // a non-fallback track still ends in a delivered placeholder file
    assert!(!result.track.is_fallback);
    assert!(result.used_fallback);
    let bytes = std::fs::read(&result.path).unwrap();
    assert_eq!(&bytes[..8], &PLACEHOLDER_SIGNATURE);
    let body = String::from_utf8_lossy(&bytes[8..]).to_string();
    assert!(body.contains("One Vision"));
}

#[tokio::test]
async fn successful_download_writes_the_fetched_bytes() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/get-music"))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_body(json!([
            {
                "id": "42",
                "title": "One Vision",
                "performer": { "name": "Queen" },
                "album": { "title": "A Kind of Magic" },
                "duration": 310,
                "maximum_bit_depth": 16,
                "maximum_sampling_rate": 44100
            }
        ]))))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/download-music"))
        .and(query_param("track_id", "42"))
        .and(query_param("quality", "27"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": { "url": format!("{}/file.flac", server.uri()) }
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/file.flac"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"FLACDATA".to_vec()))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let (coordinator, _sessions) = coordinator_for(&server.uri(), dir.path());

    coordinator.search(OWNER, "one vision").await;
    let result = coordinator.select_and_download(OWNER, "42", "27").await.unwrap();

    assert!(!result.used_fallback);
    assert_eq!(
        result.path.file_name().and_then(|n| n.to_str()),
        Some("Queen - One Vision.flac")
    );
    assert_eq!(std::fs::read(&result.path).unwrap(), b"FLACDATA");
}

#[tokio::test]
async fn get_download_url_errors_on_failure_flag() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/download-music"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": false, "error": "bad track" })))
        .mount(&server)
        .await;

    let client = CatalogClient::new(server.uri()).unwrap();
    let err = client.get_download_url("42", "27").await.unwrap_err();
    match err {
        CatalogError::RemoteApi { message } => assert_eq!(message, "bad track"),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn download_without_session_reports_session_expired() {
    let dir = tempfile::tempdir().unwrap();
    let (coordinator, _sessions) = coordinator_for("http://127.0.0.1:9", dir.path());

    let err = coordinator.select_and_download(OWNER, "1", "27").await.unwrap_err();
    assert!(matches!(err, WorkflowError::SessionExpired));
}

#[tokio::test]
async fn cleanup_removes_the_file_and_tolerates_a_missing_one() {
    let dir = tempfile::tempdir().unwrap();
    let (coordinator, _sessions) = coordinator_for("http://127.0.0.1:9", dir.path());

    coordinator.search(OWNER, "cleanup").await;
    let result = coordinator.select_and_download(OWNER, "1", "27").await.unwrap();
    assert!(result.path.exists());

    coordinator.cleanup(&result.path).await.unwrap();
    assert!(!result.path.exists());

    // second cleanup of the same path is not an error
    coordinator.cleanup(&result.path).await.unwrap();
}

#[tokio::test]
#[serial]
async fn from_env_reads_the_configured_base_url() {
    std::env::set_var("QOBUZ_BASE_URL", "https://qobuz.test/api/");
    let client = CatalogClient::from_env().unwrap();
    std::env::remove_var("QOBUZ_BASE_URL");

    assert_eq!(client.base_url(), "https://qobuz.test/api");
}
