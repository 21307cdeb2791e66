//! Endpoint integration tests.
//!
//! Tests verify:
//! - Each endpoint returns a single-field JSON object with the expected projection
//! - Album lookups search for "{name} {artist_name}"
//! - Missing query parameters yield 422
//! - Upstream and projection failures yield a bare 500
//! - The schema is served consistently
//! - CORS preflights for the assistant origin

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use genius_plugin::{build_document, create_router, CredentialStrategy, RouterConfig};

use super::test_utils::{
    authed_get, body_bytes, body_json, body_text, per_request_router, MockGeniusConnector,
    GATED_URIS,
    MISSING_SONG, MOCK_ALBUM_ID, MOCK_ARTIST_ID, MOCK_COVER_ART_URL, MOCK_SONG_ID, UNKNOWN_ALBUM,
};

const TOKEN: &str = "test-token";

async fn get_json(connector: &MockGeniusConnector, uri: &str) -> Value {
    let response = per_request_router(connector)
        .oneshot(authed_get(uri, TOKEN))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK, "{}", uri);

    let body = body_json(response).await;
    assert_eq!(body.as_object().unwrap().len(), 1, "{}", body);
    body
}

// =============================================================================
// Welcome
// =============================================================================

#[tokio::test]
async fn test_welcome() {
    let connector = MockGeniusConnector::new();
    let body = get_json(&connector, "/").await;
    assert_eq!(body, json!({ "message": "Welcome to the ChatGPT Genius Plugin!" }));
}

// =============================================================================
// Songs
// =============================================================================

#[tokio::test]
async fn test_lyrics() {
    let connector = MockGeniusConnector::new();
    let body = get_json(&connector, "/lyrics?song_name=Hotline%20Bling&artist_name=Drake").await;

    assert_eq!(body["lyrics"], "Lyrics of Hotline Bling by Drake");
    assert_eq!(connector.calls(), vec!["search_song:Hotline Bling:Drake"]);
}

#[tokio::test]
async fn test_annotations_use_found_song_id() {
    let connector = MockGeniusConnector::new();
    let body = get_json(
        &connector,
        "/annotations?song_name=Hotline%20Bling&artist_name=Drake",
    )
    .await;

    assert_eq!(body["annotations"][0][0], "You used to call me on my cell phone");
    assert_eq!(
        connector.calls(),
        vec![
            "search_song:Hotline Bling:Drake".to_string(),
            format!("song_annotations:{}", MOCK_SONG_ID),
        ]
    );
}

#[tokio::test]
async fn test_comments() {
    let connector = MockGeniusConnector::new();
    let body = get_json(&connector, "/comments?song_name=Hotline%20Bling&artist_name=Drake").await;

    assert_eq!(body["comments"]["comments"][0]["body"]["plain"], "Classic.");
    assert_eq!(connector.calls()[1], format!("song_comments:{}", MOCK_SONG_ID));
}

#[tokio::test]
async fn test_metadata_includes_lyrics() {
    let connector = MockGeniusConnector::new();
    let body = get_json(&connector, "/metadata?song_name=Hotline%20Bling&artist_name=Drake").await;

    let metadata = &body["metadata"];
    assert_eq!(metadata["id"], MOCK_SONG_ID);
    assert_eq!(metadata["title"], "Hotline Bling");
    assert_eq!(metadata["lyrics"], "Lyrics of Hotline Bling by Drake");
}

#[tokio::test]
async fn test_find_by_lyrics() {
    let connector = MockGeniusConnector::new();
    let body = get_json(&connector, "/find-by-lyrics?lyrics=call%20me%20on%20my%20cell").await;

    assert_eq!(
        body["search_results"]["sections"][0]["hits"][0]["highlights"][0]["value"],
        "call me on my cell"
    );
    assert_eq!(connector.calls(), vec!["search_lyrics:call me on my cell"]);
}

// =============================================================================
// Artists
// =============================================================================

#[tokio::test]
async fn test_artist_id() {
    let connector = MockGeniusConnector::new();
    let body = get_json(&connector, "/artist-id?artist_name=Drake").await;

    assert_eq!(body, json!({ "artist_id": MOCK_ARTIST_ID }));
    assert_eq!(connector.calls(), vec!["search_artist:Drake:1"]);
}

#[tokio::test]
async fn test_artist_metadata_hides_songs_and_description() {
    let connector = MockGeniusConnector::new();
    let body = get_json(&connector, "/artist-metadata?artist_name=Drake").await;

    let artist = body["artist"].as_object().unwrap();
    assert_eq!(artist["id"], MOCK_ARTIST_ID);
    assert_eq!(artist["name"], "Drake");
    assert!(artist.contains_key("followers_count"));
    assert!(!artist.contains_key("songs"));
    assert!(!artist.contains_key("description_annotation"));
}

#[tokio::test]
async fn test_artist_top_songs() {
    let connector = MockGeniusConnector::new();
    let body = get_json(&connector, "/artist-top-songs?artist_name=Drake").await;

    let songs = body["top_songs"].as_array().unwrap();
    assert_eq!(songs.len(), 5);
    assert_eq!(songs[0]["title"], "Song 1");
    assert!(songs.iter().all(|song| song.get("lyrics").is_some()));
    assert_eq!(connector.calls(), vec!["search_artist:Drake:5"]);
}

// =============================================================================
// Albums
// =============================================================================

#[tokio::test]
async fn test_album_id_search_term() {
    let connector = MockGeniusConnector::new();
    let body = get_json(&connector, "/album-id?album_name=X&artist_name=Y").await;

    assert_eq!(body, json!({ "album_id": MOCK_ALBUM_ID }));
    assert_eq!(connector.calls(), vec!["search_albums:X Y"]);
}

#[tokio::test]
async fn test_album_id_by_song_search_term() {
    let connector = MockGeniusConnector::new();
    let body = get_json(
        &connector,
        "/album-id-by-song?song_name=Hotline%20Bling&artist_name=Drake",
    )
    .await;

    assert_eq!(body["album_id"], MOCK_ALBUM_ID);
    assert_eq!(connector.calls(), vec!["search_albums:Hotline Bling Drake"]);
}

#[tokio::test]
async fn test_album_id_without_hits_is_server_error() {
    let connector = MockGeniusConnector::new();
    let uri = format!(
        "/album-id?album_name={}&artist_name=Drake",
        UNKNOWN_ALBUM.replace(' ', "%20")
    );

    let response = per_request_router(&connector)
        .oneshot(authed_get(&uri, TOKEN))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_text(response).await, "Internal Server Error");
}

#[tokio::test]
async fn test_album_metadata_hides_fields() {
    let connector = MockGeniusConnector::new();
    let body = get_json(&connector, "/album-metadata?album_id=491200").await;

    let album = body["album"].as_object().unwrap();
    assert_eq!(album["name"], "Views");
    assert_eq!(album["release_date"], "2016-04-29");
    for hidden in ["description_annotation", "song_performances", "cover_arts"] {
        assert!(!album.contains_key(hidden), "{}", hidden);
    }
    assert_eq!(connector.calls(), vec!["album:491200"]);
}

#[tokio::test]
async fn test_album_tracks() {
    let connector = MockGeniusConnector::new();
    let body = get_json(&connector, "/album-tracks?album_id=491200").await;

    assert_eq!(body["tracks"]["tracks"].as_array().unwrap().len(), 2);
    assert_eq!(connector.calls(), vec!["album_tracks:491200"]);
}

#[tokio::test]
async fn test_album_art_is_first_cover() {
    let connector = MockGeniusConnector::new();
    let body = get_json(&connector, "/album-art?album_id=491200").await;

    assert_eq!(body, json!({ "album_art": MOCK_COVER_ART_URL }));
}

// =============================================================================
// Errors
// =============================================================================

#[tokio::test]
async fn test_missing_query_parameters() {
    let connector = MockGeniusConnector::new();
    let router = per_request_router(&connector);

    for uri in [
        "/lyrics?song_name=Hotline%20Bling",
        "/find-by-lyrics",
        "/artist-id",
        "/album-id?artist_name=Drake",
        "/album-art",
    ] {
        let response = router.clone().oneshot(authed_get(uri, TOKEN)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY, "{}", uri);

        let body = body_json(response).await;
        assert!(body["detail"].is_string(), "{}", uri);
    }

    assert!(connector.calls().is_empty());
}

#[tokio::test]
async fn test_empty_parameter_is_accepted() {
    let connector = MockGeniusConnector::new();
    let body = get_json(&connector, "/album-id?album_name=Views&artist_name=").await;

    assert_eq!(body["album_id"], MOCK_ALBUM_ID);
    assert_eq!(connector.calls(), vec!["search_albums:Views "]);
}

#[tokio::test]
async fn test_upstream_failure_is_generic_500() {
    let connector = MockGeniusConnector::new();
    let uri = format!(
        "/lyrics?song_name={}&artist_name=Nobody",
        MISSING_SONG.replace(' ', "%20")
    );

    let response = per_request_router(&connector)
        .oneshot(authed_get(&uri, TOKEN))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_text(response).await, "Internal Server Error");
}

// =============================================================================
// Schema
// =============================================================================

#[tokio::test]
async fn test_openapi_yaml() {
    let connector = MockGeniusConnector::new();
    let router = per_request_router(&connector);

    let response = router
        .clone()
        .oneshot(authed_get("/openapi.yaml", TOKEN))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "text/yaml"
    );
    let first = body_bytes(response).await;

    let second = body_bytes(
        router
            .oneshot(authed_get("/openapi.yaml", TOKEN))
            .await
            .unwrap(),
    )
    .await;

    assert_eq!(first, second);
    let text = std::str::from_utf8(&first).unwrap();
    assert!(text.contains("openapi: 3.1"));
    assert!(text.contains("album-id-by-song"));
    assert!(text.contains("ChatGPT Genius Plugin"));
}

#[tokio::test]
async fn test_openapi_yaml_concurrent_requests() {
    let connector = MockGeniusConnector::new();
    let router = per_request_router(&connector);

    let mut tasks = Vec::new();
    for _ in 0..8 {
        let router = router.clone();
        tasks.push(tokio::spawn(async move {
            let response = router
                .oneshot(authed_get("/openapi.yaml", TOKEN))
                .await
                .unwrap();
            body_bytes(response).await
        }));
    }

    let mut bodies = Vec::new();
    for task in tasks {
        bodies.push(task.await.unwrap());
    }
    assert!(bodies.iter().all(|body| *body == bodies[0]));
}

#[tokio::test]
async fn test_openapi_json_matches_yaml() {
    let connector = MockGeniusConnector::new();
    let router = per_request_router(&connector);

    let json_doc = body_json(
        router
            .clone()
            .oneshot(authed_get("/openapi.json", TOKEN))
            .await
            .unwrap(),
    )
    .await;
    let yaml = body_bytes(
        router
            .oneshot(authed_get("/openapi.yaml", TOKEN))
            .await
            .unwrap(),
    )
    .await;
    let yaml_doc: Value = serde_yaml::from_slice(&yaml).unwrap();

    assert_eq!(json_doc, yaml_doc);
    assert_eq!(json_doc["paths"].as_object().unwrap().len(), 14);
    assert_eq!(
        json_doc["paths"]["/lyrics"]["get"]["operationId"],
        "get_lyrics"
    );
}

#[tokio::test]
async fn test_documented_operations_are_routed() {
    let connector = MockGeniusConnector::new();
    let router = per_request_router(&connector);
    let doc = serde_json::to_value(build_document()).unwrap();

    for (path, item) in doc["paths"].as_object().unwrap() {
        let query: Vec<String> = item["get"]["parameters"]
            .as_array()
            .map(|params| {
                params
                    .iter()
                    .map(|p| format!("{}=x", p["name"].as_str().unwrap()))
                    .collect()
            })
            .unwrap_or_default();
        let uri = if query.is_empty() {
            path.clone()
        } else {
            format!("{}?{}", path, query.join("&"))
        };

        let response = router.clone().oneshot(authed_get(&uri, TOKEN)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK, "{}", uri);
    }
}

#[tokio::test]
async fn test_routed_operations_are_documented() {
    let doc = serde_json::to_value(build_document()).unwrap();
    let paths = doc["paths"].as_object().unwrap();

    let mut routed: Vec<&str> = GATED_URIS
        .iter()
        .map(|uri| uri.split('?').next().unwrap())
        .filter(|path| !path.starts_with("/openapi."))
        .collect();
    routed.push("/");
    routed.sort_unstable();

    let mut documented: Vec<&str> = paths.keys().map(String::as_str).collect();
    documented.sort_unstable();

    assert_eq!(documented, routed);
}

// =============================================================================
// CORS
// =============================================================================

fn preflight(origin: &str) -> Request<Body> {
    Request::builder()
        .method(Method::OPTIONS)
        .uri("/lyrics")
        .header(header::ORIGIN, origin)
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
        .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "authorization")
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn test_preflight_from_assistant_origin() {
    let connector = MockGeniusConnector::new();
    let router = per_request_router(&connector);

    let response = router.oneshot(preflight("https://chat.openai.com")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let headers = response.headers();
    assert_eq!(
        headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "https://chat.openai.com"
    );
    assert_eq!(
        headers.get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS).unwrap(),
        "true"
    );
    assert_eq!(
        headers.get(header::ACCESS_CONTROL_ALLOW_HEADERS).unwrap(),
        "authorization"
    );
    assert!(connector.tokens().is_empty());
}

#[tokio::test]
async fn test_preflight_from_other_origin() {
    let connector = MockGeniusConnector::new();
    let router = per_request_router(&connector);

    let response = router.oneshot(preflight("https://evil.example")).await.unwrap();
    assert!(response
        .headers()
        .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
        .is_none());
}

#[tokio::test]
async fn test_dev_origin() {
    let connector = MockGeniusConnector::new();
    let config = RouterConfig::new().with_tracing(false);

    let router = create_router(CredentialStrategy::per_request(connector.clone()), config.clone());
    let response = router.oneshot(preflight("http://localhost:8000")).await.unwrap();
    assert!(response
        .headers()
        .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
        .is_none());

    let router = create_router(
        CredentialStrategy::per_request(connector),
        config.with_dev_origin(),
    );
    let response = router.oneshot(preflight("http://localhost:8000")).await.unwrap();
    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .unwrap(),
        "http://localhost:8000"
    );
}

#[tokio::test]
async fn test_simple_request_gets_cors_headers() {
    let connector = MockGeniusConnector::new();
    let mut request = authed_get("/artist-id?artist_name=Drake", TOKEN);
    request
        .headers_mut()
        .insert(header::ORIGIN, "https://chat.openai.com".parse().unwrap());

    let response = per_request_router(&connector).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .unwrap(),
        "https://chat.openai.com"
    );
}
