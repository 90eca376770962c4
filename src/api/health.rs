use axum::{Extension, response::Json};
use serde_json::{Value, json};

use crate::{management::DEFAULT_SESSION, server::AppState};

pub async fn health(Extension(state): Extension<AppState>) -> Json<Value> {
    let authenticated = state.gateway.store().is_authenticated(DEFAULT_SESSION);
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "authenticated": authenticated
    }))
}

pub async fn welcome() -> &'static str {
    "Welcome to spotgate! Visit /login to sign in with Spotify."
}
