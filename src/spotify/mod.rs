//! # Spotify Integration Module
//!
//! This module is the integration layer between the gateway's HTTP surface and
//! Spotify's accounts service and Web API. It owns the whole token lifecycle:
//! acquiring tokens through the authorization-code flow, renewing them with the
//! refresh grant, and injecting them into proxied API calls.
//!
//! ## Architecture
//!
//! ```text
//! Route handlers (crate::api)
//!          ↓
//! Typed operations (tracks, player)
//!          ↓
//! ApiGateway ──── TokenRefresher ──┐
//!          ↓                       ├── TokenEndpoint (POST /api/token, Basic auth)
//! AuthorizationFlow ───────────────┘
//!          ↓
//! TokenStore / PendingLogins (crate::management)
//! ```
//!
//! ## Core Modules
//!
//! - [`token`] - The token endpoint client and [`TokenRefresher`]. Both grants
//!   (`authorization_code` and `refresh_token`) are form-encoded and carry the
//!   client's Basic credentials.
//! - [`auth`] - [`AuthorizationFlow`]: builds the authorize redirect with a
//!   single-use nonce as `state`, validates the callback and exchanges the code.
//! - [`gateway`] - [`ApiGateway`]: bearer-authenticated calls with lazy refresh
//!   and one refresh-and-retry on 401/403.
//! - [`tracks`] - Top tracks of the signed-in user.
//! - [`player`] - Currently playing, pause, resume, play by id.
//!
//! ## Token Lifecycle
//!
//! Refresh is purely on demand. Every gateway call checks the session's token
//! under the session lock and refreshes it when it is expired or within the
//! configured margin of expiry. Concurrent callers queue on the same lock, so a
//! burst of requests around expiry produces a single refresh request. There is
//! no background timer.
//!
//! ## Error Handling
//!
//! - Login failures are [`crate::error::AuthError`] values.
//! - API failures are [`crate::error::ApiError`] values; only authentication
//!   problems are handled here (one retry), everything else reaches the caller
//!   unchanged. Nothing is retried on rate limiting or transport errors.

pub mod auth;
pub mod gateway;
pub mod player;
pub mod token;
pub mod tracks;

pub use auth::AuthorizationFlow;
pub use gateway::{ApiGateway, Payload, ProviderResponse};
pub use token::{TokenEndpoint, TokenRefresher};
