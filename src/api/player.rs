use axum::{Extension, extract::Path, http::StatusCode, response::Json};

use crate::{
    error::ApiError, management::DEFAULT_SESSION, server::AppState, spotify::player,
    types::NowPlaying,
};

pub async fn currently_playing(
    Extension(state): Extension<AppState>,
) -> Result<Json<NowPlaying>, ApiError> {
    let playing = player::currently_playing(&state.gateway, DEFAULT_SESSION).await?;
    Ok(Json(playing))
}

pub async fn pause(Extension(state): Extension<AppState>) -> Result<StatusCode, ApiError> {
    player::pause(&state.gateway, DEFAULT_SESSION).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn resume(Extension(state): Extension<AppState>) -> Result<StatusCode, ApiError> {
    player::resume(&state.gateway, DEFAULT_SESSION).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn play(
    Path(id): Path<String>,
    Extension(state): Extension<AppState>,
) -> Result<StatusCode, ApiError> {
    player::play_track(&state.gateway, DEFAULT_SESSION, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
