use axum::{
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::error::{ApiError, AuthError};

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            ApiError::Unauthenticated => error_body(StatusCode::UNAUTHORIZED, "unauthenticated", &self),
            ApiError::Provider { status, body } => {
                // Relay the provider's payload as is so callers see its diagnostics.
                let mut response = (*status, body.clone()).into_response();
                response.headers_mut().insert(
                    header::CONTENT_TYPE,
                    HeaderValue::from_static("application/json"),
                );
                response
            }
            ApiError::Transport(_) => error_body(StatusCode::BAD_GATEWAY, "transport_error", &self),
            ApiError::Decode(_) => {
                error_body(StatusCode::BAD_GATEWAY, "invalid_provider_response", &self)
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, kind) = match &self {
            AuthError::StateMismatch => (StatusCode::BAD_REQUEST, "state_mismatch"),
            AuthError::AuthorizationDenied(_) => (StatusCode::FORBIDDEN, "authorization_denied"),
            AuthError::TokenExchangeFailed { .. } => (StatusCode::BAD_GATEWAY, "token_exchange_failed"),
            AuthError::RefreshFailed { .. } => (StatusCode::BAD_GATEWAY, "refresh_failed"),
            AuthError::MalformedTokenResponse(_) => {
                (StatusCode::BAD_GATEWAY, "invalid_provider_response")
            }
            AuthError::Transport(_) => (StatusCode::BAD_GATEWAY, "transport_error"),
        };
        error_body(status, kind, &self)
    }
}

fn error_body(status: StatusCode, kind: &str, err: &dyn std::fmt::Display) -> Response {
    (
        status,
        axum::Json(json!({
            "error": kind,
            "message": err.to_string()
        })),
    )
        .into_response()
}
