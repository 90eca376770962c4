use reqwest::Method;

use crate::{
    error::ApiError,
    spotify::gateway::{ApiGateway, Payload},
    types::{CurrentlyPlayingResponse, NowPlaying, PlayRequest},
    utils,
};

/// What the session's active device is playing right now.
///
/// The provider answers 204 when nothing is playing; that maps to
/// `is_playing: false` with empty track fields.
pub async fn currently_playing(gateway: &ApiGateway, session: &str) -> Result<NowPlaying, ApiError> {
    let playback: Option<CurrentlyPlayingResponse> = gateway
        .get_json(session, "/me/player/currently-playing", &[])
        .await?;
    Ok(utils::summarize_playback(playback))
}

pub async fn pause(gateway: &ApiGateway, session: &str) -> Result<(), ApiError> {
    gateway
        .call(session, Method::PUT, "/me/player/pause", Payload::None)
        .await?;
    Ok(())
}

/// Resumes playback of the current context on the active device.
pub async fn resume(gateway: &ApiGateway, session: &str) -> Result<(), ApiError> {
    gateway
        .call(session, Method::PUT, "/me/player/play", Payload::None)
        .await?;
    Ok(())
}

/// Starts playing a single track, given as a bare id or a `spotify:` URI.
pub async fn play_track(gateway: &ApiGateway, session: &str, id: &str) -> Result<(), ApiError> {
    let body = PlayRequest {
        uris: vec![utils::track_uri(id)],
    };
    gateway
        .call(
            session,
            Method::PUT,
            "/me/player/play",
            Payload::Json(serde_json::to_value(body)?),
        )
        .await?;
    Ok(())
}
