mod common;

use std::{sync::Arc, time::Duration};

use reqwest::{Client, Method};
use serde_json::json;
use spotgate::{
    config::Credentials,
    error::ApiError,
    management::{DEFAULT_SESSION, TokenStore},
    spotify::{ApiGateway, Payload, TokenEndpoint, TokenRefresher, player, tracks},
};
use tokio::task::JoinSet;
use wiremock::matchers::{any, body_json, body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::*;

async fn mount_top_tracks(server: &MockServer, bearer: &str, expected: u64) {
    Mock::given(method("GET"))
        .and(path("/v1/me/top/tracks"))
        .and(header("authorization", format!("Bearer {}", bearer).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(top_tracks_body()))
        .expect(expected)
        .mount(server)
        .await;
}

fn gateway_with(token_url: &str, api_url: &str) -> (ApiGateway, Arc<TokenStore>) {
    let credentials = Arc::new(Credentials {
        client_id: CLIENT_ID.to_string(),
        client_secret: CLIENT_SECRET.to_string(),
        redirect_uri: REDIRECT_URI.to_string(),
    });
    let http = Client::new();
    let store = Arc::new(TokenStore::new());
    let refresher = TokenRefresher::new(TokenEndpoint::new(http.clone(), token_url, credentials));
    let gateway = ApiGateway::new(http, api_url, Arc::clone(&store), refresher, Duration::from_secs(30));
    (gateway, store)
}

async fn mount_refresh(server: &MockServer, refresh: &str, response: ResponseTemplate, expected: u64) {
    Mock::given(method("POST"))
        .and(path("/api/token"))
        .and(header("authorization", BASIC_AUTH))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains(format!("refresh_token={}", refresh).as_str()))
        .respond_with(response)
        .expect(expected)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_empty_session_fails_fast() {
    let server = MockServer::start().await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let app = app_for(&server);
    let result = app
        .gateway
        .call(DEFAULT_SESSION, Method::GET, "/me/top/tracks", Payload::None)
        .await;

    assert!(matches!(result, Err(ApiError::Unauthenticated)));
}

#[tokio::test]
async fn test_valid_token_is_used_as_is() {
    let server = MockServer::start().await;
    mount_top_tracks(&server, "A1", 1).await;
    mount_refresh(&server, "R1", ResponseTemplate::new(200), 0).await;

    let app = app_for(&server);
    app.gateway.store().put(DEFAULT_SESSION, token_state("A1", "R1", 3600)).await;

    let top = tracks::top_tracks(&app.gateway, DEFAULT_SESSION, 10).await.unwrap();
    assert_eq!(top.len(), 2);
    assert_eq!(top[0].artist, "Artist A, Artist B");
    assert_eq!(top[1].album, "Album Two");
}

#[tokio::test]
async fn test_expired_token_refreshed_before_call() {
    let server = MockServer::start().await;
    mount_refresh(
        &server,
        "R1",
        ResponseTemplate::new(200).set_body_json(token_body("A2", None, 3600)),
        1,
    )
    .await;
    mount_top_tracks(&server, "A2", 1).await;
    mount_top_tracks(&server, "A1", 0).await;

    let app = app_for(&server);
    app.gateway.store().put(DEFAULT_SESSION, token_state("A1", "R1", -10)).await;

    let top = tracks::top_tracks(&app.gateway, DEFAULT_SESSION, 10).await.unwrap();
    assert_eq!(top.len(), 2);

    let stored = app.gateway.store().get(DEFAULT_SESSION).await.unwrap();
    assert_eq!(stored.access_token, "A2");
    // Not rotated by the provider, so the old refresh token stays.
    assert_eq!(stored.refresh_token, "R1");
    assert!(stored.seconds_until_expiry() > 3500);
}

#[tokio::test]
async fn test_rotated_refresh_token_replaces_old_one() {
    let server = MockServer::start().await;
    mount_refresh(
        &server,
        "R1",
        ResponseTemplate::new(200).set_body_json(token_body("A2", Some("R2"), 3600)),
        1,
    )
    .await;
    mount_top_tracks(&server, "A2", 1).await;

    let app = app_for(&server);
    app.gateway.store().put(DEFAULT_SESSION, token_state("A1", "R1", 5)).await;

    tracks::top_tracks(&app.gateway, DEFAULT_SESSION, 10).await.unwrap();

    let stored = app.gateway.store().get(DEFAULT_SESSION).await.unwrap();
    assert_eq!(stored.refresh_token, "R2");
}

#[tokio::test]
async fn test_concurrent_calls_share_one_refresh() {
    let server = MockServer::start().await;
    mount_refresh(
        &server,
        "R1",
        ResponseTemplate::new(200)
            .set_body_json(token_body("A2", Some("R2"), 3600))
            .set_delay(Duration::from_millis(200)),
        1,
    )
    .await;
    mount_top_tracks(&server, "A2", 8).await;

    let app = app_for(&server);
    // Inside the 30s refresh margin.
    app.gateway.store().put(DEFAULT_SESSION, token_state("A1", "R1", 10)).await;

    let mut calls = JoinSet::new();
    for _ in 0..8 {
        let gateway = Arc::clone(&app.gateway);
        calls.spawn(async move { tracks::top_tracks(&gateway, DEFAULT_SESSION, 10).await });
    }

    while let Some(result) = calls.join_next().await {
        assert_eq!(result.unwrap().unwrap().len(), 2);
    }
}

#[tokio::test]
async fn test_unauthorized_once_refreshes_and_retries() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/me/top/tracks"))
        .and(header("authorization", "Bearer A1"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {"status": 401, "message": "The access token expired"}
        })))
        .expect(1)
        .mount(&server)
        .await;
    mount_refresh(
        &server,
        "R1",
        ResponseTemplate::new(200).set_body_json(token_body("A2", None, 3600)),
        1,
    )
    .await;
    mount_top_tracks(&server, "A2", 1).await;

    let app = app_for(&server);
    app.gateway.store().put(DEFAULT_SESSION, token_state("A1", "R1", 3600)).await;

    let top = tracks::top_tracks(&app.gateway, DEFAULT_SESSION, 10).await.unwrap();
    assert_eq!(top.len(), 2);
}

#[tokio::test]
async fn test_unauthorized_twice_is_unauthenticated() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/me/top/tracks"))
        .respond_with(ResponseTemplate::new(401))
        .expect(2)
        .mount(&server)
        .await;
    mount_refresh(
        &server,
        "R1",
        ResponseTemplate::new(200).set_body_json(token_body("A2", None, 3600)),
        1,
    )
    .await;

    let app = app_for(&server);
    app.gateway.store().put(DEFAULT_SESSION, token_state("A1", "R1", 3600)).await;

    let result = tracks::top_tracks(&app.gateway, DEFAULT_SESSION, 10).await;
    assert!(matches!(result, Err(ApiError::Unauthenticated)));
}

#[tokio::test]
async fn test_forbidden_is_treated_as_auth_failure() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/v1/me/player/pause"))
        .and(header("authorization", "Bearer A1"))
        .respond_with(ResponseTemplate::new(403))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/v1/me/player/pause"))
        .and(header("authorization", "Bearer A2"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    mount_refresh(
        &server,
        "R1",
        ResponseTemplate::new(200).set_body_json(token_body("A2", None, 3600)),
        1,
    )
    .await;

    let app = app_for(&server);
    app.gateway.store().put(DEFAULT_SESSION, token_state("A1", "R1", 3600)).await;

    player::pause(&app.gateway, DEFAULT_SESSION).await.unwrap();
}

#[tokio::test]
async fn test_other_errors_surface_without_refresh() {
    for status in [404u16, 429] {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/me/top/tracks"))
            .respond_with(
                ResponseTemplate::new(status)
                    .insert_header("retry-after", "5")
                    .set_body_json(json!({"error": {"status": status, "message": "nope"}})),
            )
            .expect(1)
            .mount(&server)
            .await;
        mount_refresh(&server, "R1", ResponseTemplate::new(200), 0).await;

        let app = app_for(&server);
        app.gateway.store().put(DEFAULT_SESSION, token_state("A1", "R1", 3600)).await;

        match tracks::top_tracks(&app.gateway, DEFAULT_SESSION, 10).await {
            Err(ApiError::Provider { status: got, body }) => {
                assert_eq!(got.as_u16(), status);
                assert!(body.contains("nope"));
            }
            other => panic!("expected provider error, got {:?}", other),
        }
    }
}

#[tokio::test]
async fn test_rejected_refresh_token_ends_session() {
    let server = MockServer::start().await;
    mount_refresh(
        &server,
        "R1",
        ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant",
            "error_description": "Refresh token revoked"
        })),
        1,
    )
    .await;
    mount_top_tracks(&server, "A1", 0).await;

    let app = app_for(&server);
    app.gateway.store().put(DEFAULT_SESSION, token_state("A1", "R1", -60)).await;

    let first = tracks::top_tracks(&app.gateway, DEFAULT_SESSION, 10).await;
    assert!(matches!(first, Err(ApiError::Unauthenticated)));
    assert!(app.gateway.store().get(DEFAULT_SESSION).await.is_none());

    // No second refresh attempt: the session is gone.
    let second = tracks::top_tracks(&app.gateway, DEFAULT_SESSION, 10).await;
    assert!(matches!(second, Err(ApiError::Unauthenticated)));
}

#[tokio::test]
async fn test_unreachable_provider_is_transport_error() {
    let server = MockServer::start().await;
    mount_refresh(&server, "R1", ResponseTemplate::new(200), 0).await;

    let (gateway, store) = gateway_with(&format!("{}/api/token", server.uri()), "http://127.0.0.1:1/v1");
    store.put(DEFAULT_SESSION, token_state("A1", "R1", 3600)).await;

    let result = gateway
        .call(DEFAULT_SESSION, Method::GET, "/me/top/tracks", Payload::None)
        .await;
    assert!(matches!(result, Err(ApiError::Transport(_))));
    // The session survives network trouble.
    assert!(store.get(DEFAULT_SESSION).await.is_some());
}

#[tokio::test]
async fn test_unreachable_token_endpoint_keeps_session() {
    let server = MockServer::start().await;
    mount_top_tracks(&server, "A1", 0).await;

    let (gateway, store) = gateway_with("http://127.0.0.1:1/api/token", &format!("{}/v1", server.uri()));
    store.put(DEFAULT_SESSION, token_state("A1", "R1", -10)).await;

    let result = tracks::top_tracks(&gateway, DEFAULT_SESSION, 10).await;
    assert!(matches!(result, Err(ApiError::Transport(_))));

    let kept = store.get(DEFAULT_SESSION).await.unwrap();
    assert_eq!(kept.access_token, "A1");
    assert_eq!(kept.refresh_token, "R1");
}

#[tokio::test]
async fn test_timeout_is_transport_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/me/top/tracks"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;

    let mut config = config_for(&server);
    config.http_timeout = Duration::from_millis(200);
    let app = spotgate::server::AppState::from_config(&config).unwrap();
    app.gateway.store().put(DEFAULT_SESSION, token_state("A1", "R1", 3600)).await;

    let result = tracks::top_tracks(&app.gateway, DEFAULT_SESSION, 10).await;
    assert!(matches!(result, Err(ApiError::Transport(e)) if e.is_timeout()));
}

#[tokio::test]
async fn test_currently_playing_nothing_playing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/me/player/currently-playing"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let app = app_for(&server);
    app.gateway.store().put(DEFAULT_SESSION, token_state("A1", "R1", 3600)).await;

    let now = player::currently_playing(&app.gateway, DEFAULT_SESSION).await.unwrap();
    assert!(!now.is_playing);
    assert!(now.name.is_none());
}

#[tokio::test]
async fn test_currently_playing_reshaped() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/me/player/currently-playing"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "is_playing": true,
            "progress_ms": 1234,
            "item": top_tracks_body()["items"][0].clone()
        })))
        .mount(&server)
        .await;

    let app = app_for(&server);
    app.gateway.store().put(DEFAULT_SESSION, token_state("A1", "R1", 3600)).await;

    let now = player::currently_playing(&app.gateway, DEFAULT_SESSION).await.unwrap();
    assert!(now.is_playing);
    assert_eq!(now.name.as_deref(), Some("Song One"));
    assert_eq!(now.artist.as_deref(), Some("Artist A, Artist B"));
    assert_eq!(now.progress_ms, Some(1234));
}

#[tokio::test]
async fn test_play_track_sends_uri() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/v1/me/player/play"))
        .and(body_json(json!({"uris": ["spotify:track:t1"]})))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let app = app_for(&server);
    app.gateway.store().put(DEFAULT_SESSION, token_state("A1", "R1", 3600)).await;

    player::play_track(&app.gateway, DEFAULT_SESSION, "t1").await.unwrap();
}

#[tokio::test]
async fn test_malformed_body_is_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/me/top/tracks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"unexpected": true})))
        .mount(&server)
        .await;

    let app = app_for(&server);
    app.gateway.store().put(DEFAULT_SESSION, token_state("A1", "R1", 3600)).await;

    let result = tracks::top_tracks(&app.gateway, DEFAULT_SESSION, 10).await;
    assert!(matches!(result, Err(ApiError::Decode(_))));
}

#[tokio::test]
async fn test_concurrent_rejections_share_one_refresh() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/me/top/tracks"))
        .and(header("authorization", "Bearer A1"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    mount_refresh(
        &server,
        "R1",
        ResponseTemplate::new(200)
            .set_body_json(token_body("A2", None, 3600))
            .set_delay(Duration::from_millis(200)),
        1,
    )
    .await;
    mount_top_tracks(&server, "A2", 8).await;

    let app = app_for(&server);
    // Valid on our side, revoked on the provider's.
    app.gateway.store().put(DEFAULT_SESSION, token_state("A1", "R1", 3600)).await;

    let mut calls = JoinSet::new();
    for _ in 0..8 {
        let gateway = Arc::clone(&app.gateway);
        calls.spawn(async move { tracks::top_tracks(&gateway, DEFAULT_SESSION, 10).await });
    }

    while let Some(result) = calls.join_next().await {
        assert_eq!(result.unwrap().unwrap().len(), 2);
    }
    let stored = app.gateway.store().get(DEFAULT_SESSION).await.unwrap();
    assert_eq!(stored.access_token, "A2");
}

#[tokio::test]
async fn test_refresh_returning_expired_token_ends_session() {
    let server = MockServer::start().await;
    mount_refresh(
        &server,
        "R1",
        ResponseTemplate::new(200).set_body_json(token_body("A2", None, 0)),
        1,
    )
    .await;
    mount_top_tracks(&server, "A2", 0).await;

    let app = app_for(&server);
    app.gateway.store().put(DEFAULT_SESSION, token_state("A1", "R1", -10)).await;

    let result = tracks::top_tracks(&app.gateway, DEFAULT_SESSION, 10).await;
    assert!(matches!(result, Err(ApiError::Unauthenticated)));
    assert!(app.gateway.store().get(DEFAULT_SESSION).await.is_none());
}

#[tokio::test]
async fn test_refresh_with_huge_lifetime_is_accepted() {
    let server = MockServer::start().await;
    mount_refresh(
        &server,
        "R1",
        ResponseTemplate::new(200).set_body_json(token_body("A2", None, 10_000_000_000_000_000)),
        1,
    )
    .await;
    mount_top_tracks(&server, "A2", 1).await;

    let app = app_for(&server);
    app.gateway.store().put(DEFAULT_SESSION, token_state("A1", "R1", -10)).await;

    let top = tracks::top_tracks(&app.gateway, DEFAULT_SESSION, 10).await.unwrap();
    assert_eq!(top.len(), 2);
    assert!(app.gateway.store().get(DEFAULT_SESSION).await.unwrap().seconds_until_expiry() > 0);
}

#[tokio::test]
async fn test_malformed_refresh_response_keeps_session() {
    let server = MockServer::start().await;
    mount_refresh(
        &server,
        "R1",
        ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"),
        1,
    )
    .await;
    mount_top_tracks(&server, "A1", 0).await;

    let app = app_for(&server);
    app.gateway.store().put(DEFAULT_SESSION, token_state("A1", "R1", -10)).await;

    let result = tracks::top_tracks(&app.gateway, DEFAULT_SESSION, 10).await;
    assert!(matches!(result, Err(ApiError::Decode(_))));

    let kept = app.gateway.store().get(DEFAULT_SESSION).await.unwrap();
    assert_eq!(kept.refresh_token, "R1");
}
