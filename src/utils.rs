use base64::{
    Engine,
    engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD},
};
use rand::RngCore;

use crate::types::{CurrentlyPlayingResponse, NowPlaying, Track, TrackSummary};

/// Number of random bytes behind a login nonce.
pub const NONCE_BYTES: usize = 32;

/// Generates a login nonce from the thread-local CSPRNG, URL-safe encoded.
pub fn generate_nonce() -> String {
    let mut bytes = [0u8; NONCE_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Value of the `Authorization` header for the token endpoint.
pub fn basic_credentials(client_id: &str, client_secret: &str) -> String {
    let raw = format!("{}:{}", client_id, client_secret);
    format!("Basic {}", STANDARD.encode(raw))
}

pub fn join_artist_names(track: &Track) -> String {
    track
        .artists
        .iter()
        .map(|artist| artist.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn summarize_track(track: &Track) -> TrackSummary {
    TrackSummary {
        name: track.name.clone(),
        artist: join_artist_names(track),
        album: track.album.name.clone(),
    }
}

pub fn summarize_playback(playback: Option<CurrentlyPlayingResponse>) -> NowPlaying {
    let Some(playback) = playback else {
        return NowPlaying::default();
    };

    match playback.item {
        Some(track) => NowPlaying {
            is_playing: playback.is_playing,
            artist: Some(join_artist_names(&track)),
            album: Some(track.album.name),
            name: Some(track.name),
            progress_ms: playback.progress_ms,
        },
        None => NowPlaying {
            is_playing: playback.is_playing,
            progress_ms: playback.progress_ms,
            ..NowPlaying::default()
        },
    }
}

/// Spotify URI for a bare track id; full URIs pass through untouched.
pub fn track_uri(id: &str) -> String {
    if id.starts_with("spotify:") {
        id.to_string()
    } else {
        format!("spotify:track:{}", id)
    }
}
