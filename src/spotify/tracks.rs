use crate::{
    error::ApiError,
    spotify::gateway::ApiGateway,
    types::{TopTracksResponse, TrackSummary},
    utils,
};

pub const DEFAULT_TOP_TRACKS_LIMIT: u32 = 10;
pub const MAX_TOP_TRACKS_LIMIT: u32 = 50;

/// Retrieves the session user's top tracks, reshaped to name/artist/album.
///
/// `limit` is clamped to the provider's accepted range of 1..=50.
pub async fn top_tracks(
    gateway: &ApiGateway,
    session: &str,
    limit: u32,
) -> Result<Vec<TrackSummary>, ApiError> {
    let limit = limit.clamp(1, MAX_TOP_TRACKS_LIMIT);
    let response: Option<TopTracksResponse> = gateway
        .get_json(session, "/me/top/tracks", &[("limit", limit.to_string())])
        .await?;

    Ok(response
        .map(|r| r.items.iter().map(utils::summarize_track).collect())
        .unwrap_or_default())
}
