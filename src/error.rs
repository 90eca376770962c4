//! Error taxonomy for the gateway.
//!
//! Each failure class gets its own variant so callers can tell "log in again"
//! apart from "the provider said no" and "the network is down". None of the
//! messages below carry tokens or the client secret.

use reqwest::StatusCode;
use thiserror::Error;

/// Fatal configuration problems, detected before the server starts.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required configuration: {0} must be set")]
    Missing(&'static str),

    #[error("invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },

    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
}

/// Failures of the login flow and of token renewal.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The callback's `state` is absent, unknown, already used or expired.
    #[error("state mismatch: the login callback does not belong to a pending login")]
    StateMismatch,

    /// The user (or provider) declined the authorization request.
    #[error("authorization denied: {0}")]
    AuthorizationDenied(String),

    #[error("token exchange failed ({status}): {body}")]
    TokenExchangeFailed { status: StatusCode, body: String },

    /// The refresh token was rejected. The session must log in again.
    #[error("token refresh failed ({status}): {body}")]
    RefreshFailed { status: StatusCode, body: String },

    /// A 2xx refresh response that is not a token response. The refresh token
    /// itself was not rejected.
    #[error("malformed token response: {0}")]
    MalformedTokenResponse(#[source] serde_json::Error),

    #[error("transport error talking to the token endpoint: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Failures of a proxied provider API call.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No session, or the session could not be renewed.
    #[error("not authenticated, visit /login to sign in")]
    Unauthenticated,

    /// A non-auth rejection from the provider, relayed verbatim.
    #[error("provider responded with {status}: {body}")]
    Provider { status: StatusCode, body: String },

    #[error("transport error talking to the provider: {0}")]
    Transport(#[from] reqwest::Error),

    /// A successful response whose body does not have the expected shape.
    #[error("unexpected provider response: {0}")]
    Decode(#[from] serde_json::Error),
}

