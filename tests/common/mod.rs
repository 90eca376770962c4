#![allow(dead_code)]

use std::{collections::BTreeSet, time::Duration};

use chrono::Utc;
use serde_json::{Value, json};
use spotgate::{
    config::{Config, Credentials, Endpoints},
    server::AppState,
    types::TokenState,
};
use url::Url;
use wiremock::MockServer;

pub const CLIENT_ID: &str = "client-id";
pub const CLIENT_SECRET: &str = "client-secret";
pub const REDIRECT_URI: &str = "http://127.0.0.1:3000/callback";
/// `Basic base64("client-id:client-secret")`
pub const BASIC_AUTH: &str = "Basic Y2xpZW50LWlkOmNsaWVudC1zZWNyZXQ=";

pub fn config_for(server: &MockServer) -> Config {
    let mut config = Config::new(Credentials {
        client_id: CLIENT_ID.to_string(),
        client_secret: CLIENT_SECRET.to_string(),
        redirect_uri: REDIRECT_URI.to_string(),
    });
    config.endpoints = Endpoints {
        authorize_url: format!("{}/authorize", server.uri()),
        token_url: format!("{}/api/token", server.uri()),
        api_url: format!("{}/v1", server.uri()),
    };
    config.http_timeout = Duration::from_secs(5);
    config
}

pub fn app_for(server: &MockServer) -> AppState {
    AppState::from_config(&config_for(server)).unwrap()
}

/// Tokens expiring `expires_in` seconds from now (negative for already expired).
pub fn token_state(access: &str, refresh: &str, expires_in: i64) -> TokenState {
    TokenState {
        access_token: access.to_string(),
        refresh_token: refresh.to_string(),
        expires_at: Utc::now() + chrono::Duration::seconds(expires_in),
        scope: BTreeSet::from(["user-top-read".to_string()]),
    }
}

pub fn token_body(access: &str, refresh: Option<&str>, expires_in: u64) -> Value {
    let mut body = json!({
        "access_token": access,
        "token_type": "Bearer",
        "scope": "user-top-read user-read-playback-state",
        "expires_in": expires_in
    });
    if let Some(refresh) = refresh {
        body["refresh_token"] = json!(refresh);
    }
    body
}

pub fn state_param(url: &Url) -> String {
    url.query_pairs()
        .find(|(key, _)| key == "state")
        .map(|(_, value)| value.into_owned())
        .unwrap()
}

pub fn top_tracks_body() -> Value {
    json!({
        "items": [
            {
                "id": "t1",
                "name": "Song One",
                "uri": "spotify:track:t1",
                "artists": [{"id": "a1", "name": "Artist A"}, {"id": "a2", "name": "Artist B"}],
                "album": {"id": "al1", "name": "Album One"}
            },
            {
                "id": "t2",
                "name": "Song Two",
                "uri": "spotify:track:t2",
                "artists": [{"id": "a3", "name": "Artist C"}],
                "album": {"id": "al2", "name": "Album Two"}
            }
        ]
    })
}
