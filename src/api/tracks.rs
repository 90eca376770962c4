use axum::{Extension, extract::Query, response::Json};
use serde::Deserialize;

use crate::{
    error::ApiError,
    management::DEFAULT_SESSION,
    server::AppState,
    spotify::tracks::{self, DEFAULT_TOP_TRACKS_LIMIT},
    types::TrackSummary,
};

#[derive(Debug, Default, Deserialize)]
pub struct TopTracksParams {
    pub limit: Option<u32>,
}

pub async fn top_tracks(
    Query(params): Query<TopTracksParams>,
    Extension(state): Extension<AppState>,
) -> Result<Json<Vec<TrackSummary>>, ApiError> {
    let limit = params.limit.unwrap_or(DEFAULT_TOP_TRACKS_LIMIT);
    let tracks = tracks::top_tracks(&state.gateway, DEFAULT_SESSION, limit).await?;
    Ok(Json(tracks))
}
