use std::sync::Arc;

use chrono::Utc;
use reqwest::{Client, StatusCode, header};

use crate::{
    config::Credentials,
    error::AuthError,
    types::{TokenResponse, TokenState},
    utils,
};

/// Why a token endpoint call did not produce tokens.
#[derive(Debug)]
pub(crate) enum TokenEndpointError {
    Rejected { status: StatusCode, body: String },
    Malformed {
        status: StatusCode,
        body: String,
        source: serde_json::Error,
    },
    Transport(reqwest::Error),
}

impl TokenEndpointError {
    pub(crate) fn into_exchange_error(self) -> AuthError {
        match self {
            Self::Rejected { status, body } | Self::Malformed { status, body, .. } => {
                AuthError::TokenExchangeFailed { status, body }
            }
            Self::Transport(e) => AuthError::Transport(e),
        }
    }

    pub(crate) fn into_refresh_error(self) -> AuthError {
        match self {
            Self::Rejected { status, body } => AuthError::RefreshFailed { status, body },
            Self::Malformed { source, .. } => AuthError::MalformedTokenResponse(source),
            Self::Transport(e) => AuthError::Transport(e),
        }
    }
}

/// The provider's `POST /api/token` endpoint, authenticated with the client's
/// Basic credentials.
#[derive(Clone)]
pub struct TokenEndpoint {
    http: Client,
    url: String,
    credentials: Arc<Credentials>,
}

impl TokenEndpoint {
    pub fn new(http: Client, url: impl Into<String>, credentials: Arc<Credentials>) -> Self {
        Self {
            http,
            url: url.into(),
            credentials,
        }
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Posts a form-encoded grant and decodes the token response.
    ///
    /// A 2xx response whose body is not a token response is reported as
    /// malformed, apart from an outright rejection.
    pub(crate) async fn request(
        &self,
        form: &[(&str, &str)],
    ) -> Result<TokenResponse, TokenEndpointError> {
        let grant = form
            .iter()
            .find(|(key, _)| *key == "grant_type")
            .map(|(_, value)| *value)
            .unwrap_or_default();
        tracing::debug!(url = %self.url, grant, "token endpoint request");

        let response = self
            .http
            .post(&self.url)
            .header(
                header::AUTHORIZATION,
                utils::basic_credentials(&self.credentials.client_id, &self.credentials.client_secret),
            )
            .header(header::ACCEPT, "application/json")
            .form(form)
            .send()
            .await
            .map_err(TokenEndpointError::Transport)?;

        let status = response.status();
        let body = response.text().await.map_err(TokenEndpointError::Transport)?;

        if !status.is_success() {
            tracing::warn!(%status, grant, "token endpoint rejected the grant");
            return Err(TokenEndpointError::Rejected { status, body });
        }

        serde_json::from_str::<TokenResponse>(&body).map_err(|source| {
            tracing::warn!(%status, grant, "malformed token response: {}", source);
            TokenEndpointError::Malformed {
                status,
                body,
                source,
            }
        })
    }
}

/// Renews access tokens with the `refresh_token` grant.
#[derive(Clone)]
pub struct TokenRefresher {
    endpoint: TokenEndpoint,
}

impl TokenRefresher {
    pub fn new(endpoint: TokenEndpoint) -> Self {
        Self { endpoint }
    }

    /// Exchanges `current.refresh_token` for a new access token.
    ///
    /// The refresh token is kept unless the provider rotates it. A rejection
    /// is reported as [`AuthError::RefreshFailed`] and is final: nothing here
    /// retries, the session has to go through the login flow again.
    pub async fn refresh(&self, current: &TokenState) -> Result<TokenState, AuthError> {
        let response = self
            .endpoint
            .request(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", current.refresh_token.as_str()),
            ])
            .await
            .map_err(TokenEndpointError::into_refresh_error)?;

        let renewed = TokenState::from_response(response, Utc::now(), Some(current))
            .ok_or_else(|| AuthError::RefreshFailed {
                status: StatusCode::OK,
                body: "token response without refresh token".to_string(),
            })?;

        tracing::info!(expires_in = renewed.seconds_until_expiry(), "access token refreshed");
        Ok(renewed)
    }
}
