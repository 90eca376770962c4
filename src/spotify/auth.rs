use std::sync::Arc;

use chrono::Utc;
use reqwest::StatusCode;
use url::Url;

use crate::{
    error::AuthError,
    management::{PendingLogins, TokenStore},
    spotify::token::{TokenEndpoint, TokenEndpointError},
    types::TokenState,
};

/// The authorization-code login flow.
///
/// `begin_login` hands out a provider URL carrying a fresh nonce as `state`;
/// `complete_login` checks the nonce the provider sends back, swaps the code
/// for tokens and stores them for the session that started the login.
pub struct AuthorizationFlow {
    authorize_url: Url,
    scope: Vec<String>,
    endpoint: TokenEndpoint,
    pending: PendingLogins,
    store: Arc<TokenStore>,
}

impl AuthorizationFlow {
    pub fn new(
        authorize_url: Url,
        scope: Vec<String>,
        endpoint: TokenEndpoint,
        pending: PendingLogins,
        store: Arc<TokenStore>,
    ) -> Self {
        Self {
            authorize_url,
            scope,
            endpoint,
            pending,
            store,
        }
    }

    /// Registers a new pending login for `session` and returns the provider URL
    /// the browser should be redirected to.
    ///
    /// Expired pending logins are purged here, so no background task is needed.
    pub fn begin_login(&self, session: &str) -> Url {
        let purged = self.pending.purge_expired();
        if purged > 0 {
            tracing::debug!(purged, "dropped expired pending logins");
        }

        let nonce = self.pending.register(session);
        let credentials = self.endpoint.credentials();
        let scope = self.scope.join(" ");

        let mut url = self.authorize_url.clone();
        url.query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("client_id", &credentials.client_id)
            .append_pair("scope", &scope)
            .append_pair("redirect_uri", &credentials.redirect_uri)
            .append_pair("state", &nonce);
        url
    }

    /// Completes a login from the callback's `code`, `state` and `error`
    /// parameters.
    ///
    /// The nonce is consumed before anything else, whatever the outcome. An
    /// absent or unknown `state` fails with [`AuthError::StateMismatch`] without
    /// contacting the token endpoint.
    pub async fn complete_login(
        &self,
        code: Option<&str>,
        returned_state: Option<&str>,
        error: Option<&str>,
    ) -> Result<TokenState, AuthError> {
        let login = returned_state
            .and_then(|state| self.pending.consume(state))
            .ok_or(AuthError::StateMismatch)?;

        if let Some(reason) = error {
            return Err(AuthError::AuthorizationDenied(reason.to_string()));
        }
        let code = code
            .filter(|c| !c.is_empty())
            .ok_or_else(|| AuthError::AuthorizationDenied("callback without code".to_string()))?;

        let redirect_uri = self.endpoint.credentials().redirect_uri.clone();
        let response = self
            .endpoint
            .request(&[
                ("code", code),
                ("redirect_uri", redirect_uri.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .await
            .map_err(TokenEndpointError::into_exchange_error)?;

        let state = TokenState::from_response(response, Utc::now(), None).ok_or_else(|| {
            AuthError::TokenExchangeFailed {
                status: StatusCode::OK,
                body: "token response without refresh token".to_string(),
            }
        })?;

        self.store.put(&login.session, state.clone()).await;
        tracing::info!(session = %login.session, "login completed");

        Ok(state)
    }

    pub fn pending_logins(&self) -> usize {
        self.pending.len()
    }
}
