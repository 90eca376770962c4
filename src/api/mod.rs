//! # API Module
//!
//! HTTP endpoints served by the gateway. Handlers are thin: they pick the
//! session, call into [`crate::spotify`] and shape the result. Gateway and
//! login errors turn into responses through the `IntoResponse` impls in
//! `error.rs`.
//!
//! ## Endpoints
//!
//! ### Authentication
//!
//! - `GET /login` ([`login`]) - Redirects to Spotify's consent page with a fresh
//!   single-use `state` nonce.
//! - `GET /callback` ([`callback`]) - Validates `state`, exchanges the code and
//!   stores the session's tokens.
//!
//! ### Passthrough
//!
//! - `GET /tracks` ([`top_tracks`]) - Top tracks as `{name, artist, album}`.
//! - `GET /currently-playing` ([`currently_playing`]) - Playback state.
//! - `PUT /pause`, `PUT /resume`, `PUT /play/{id}` - Player control, `204` on
//!   success.
//!
//! ### Monitoring
//!
//! - `GET /health` ([`health`]) - Status, version and whether a session exists.
//! - `GET /` ([`welcome`]) - Plain greeting.
//!
//! ## Error Mapping
//!
//! | Error | Status |
//! |-------|--------|
//! | `Unauthenticated` | 401 |
//! | `Provider { status, .. }` | provider's status, body relayed |
//! | `Transport`, `Decode` | 502 |
//! | `StateMismatch` | 400 |
//! | `AuthorizationDenied` | 403 |
//! | `TokenExchangeFailed`, `RefreshFailed` | 502 |

mod callback;
mod error;
mod health;
mod player;
mod tracks;

pub use callback::{callback, login};
pub use health::{health, welcome};
pub use player::{currently_playing, pause, play, resume};
pub use tracks::{TopTracksParams, top_tracks};
