use std::{sync::Arc, time::Duration};

use chrono::Utc;
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{
    error::{ApiError, AuthError},
    management::TokenStore,
    spotify::token::TokenRefresher,
    types::TokenState,
};

/// What accompanies a provider request.
#[derive(Debug, Clone, Default)]
pub enum Payload {
    #[default]
    None,
    Query(Vec<(String, String)>),
    Json(Value),
}

/// A 2xx response from the provider.
#[derive(Debug, Clone)]
pub struct ProviderResponse {
    pub status: StatusCode,
    pub body: String,
}

impl ProviderResponse {
    /// Whether the provider sent no content (e.g. 204 from the player API).
    pub fn is_empty(&self) -> bool {
        self.status == StatusCode::NO_CONTENT || self.body.trim().is_empty()
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        Ok(serde_json::from_str(&self.body)?)
    }
}

/// Authenticated access to the provider's Web API for keyed sessions.
///
/// Every call goes through the session's slot in [`TokenStore`]: the expiry
/// check, a refresh and the write of the renewed tokens all happen while the
/// slot is locked, so concurrent callers wait for one refresh instead of
/// issuing their own.
pub struct ApiGateway {
    http: Client,
    api_url: String,
    store: Arc<TokenStore>,
    refresher: TokenRefresher,
    refresh_margin: Duration,
}

impl ApiGateway {
    pub fn new(
        http: Client,
        api_url: impl Into<String>,
        store: Arc<TokenStore>,
        refresher: TokenRefresher,
        refresh_margin: Duration,
    ) -> Self {
        Self {
            http,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            store,
            refresher,
            refresh_margin,
        }
    }

    pub fn store(&self) -> &Arc<TokenStore> {
        &self.store
    }

    /// Calls `path` (relative to the API base URL) on behalf of `session`.
    ///
    /// Fails fast with [`ApiError::Unauthenticated`] when the session has no
    /// tokens. A stale token is refreshed first. A 401/403 answer leads to
    /// exactly one refresh-and-retry; a second one is `Unauthenticated`.
    /// Other non-2xx answers and transport failures are returned untouched.
    pub async fn call(
        &self,
        session: &str,
        method: Method,
        path: &str,
        payload: Payload,
    ) -> Result<ProviderResponse, ApiError> {
        let token = self.valid_token(session).await?;
        let response = self.send(&method, path, &payload, &token).await?;
        if !is_auth_rejection(response.status()) {
            return finish(response).await;
        }

        tracing::debug!(%method, path, status = %response.status(), "access token rejected, renewing");
        let token = self.renew_rejected(session, &token).await?;
        let response = self.send(&method, path, &payload, &token).await?;
        if is_auth_rejection(response.status()) {
            tracing::warn!(%method, path, status = %response.status(), "renewed token rejected as well");
            return Err(ApiError::Unauthenticated);
        }
        finish(response).await
    }

    pub async fn get_json<T: DeserializeOwned>(
        &self,
        session: &str,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Option<T>, ApiError> {
        let query = query
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        let response = self.call(session, Method::GET, path, Payload::Query(query)).await?;
        if response.is_empty() {
            return Ok(None);
        }
        response.json().map(Some)
    }

    /// Returns an access token that is not known to be expired.
    async fn valid_token(&self, session: &str) -> Result<String, ApiError> {
        let slot = self.store.slot(session);
        let mut guard = slot.lock().await;
        match guard.as_ref() {
            None => return Err(ApiError::Unauthenticated),
            Some(current) if !current.is_stale(self.refresh_margin) => {
                return Ok(current.access_token.clone());
            }
            Some(_) => {}
        }

        tracing::debug!(session, "access token stale, refreshing");
        self.refresh(session, &mut guard).await
    }

    /// Renews after the provider rejected `rejected`, unless another caller has
    /// already replaced it in the meantime.
    async fn renew_rejected(&self, session: &str, rejected: &str) -> Result<String, ApiError> {
        let slot = self.store.slot(session);
        let mut guard = slot.lock().await;
        match guard.as_ref() {
            None => return Err(ApiError::Unauthenticated),
            Some(current) if current.access_token != rejected => {
                return Ok(current.access_token.clone());
            }
            Some(_) => {}
        }

        self.refresh(session, &mut guard).await
    }

    /// Runs the refresh while the caller holds the slot lock and stores the
    /// outcome. A rejected refresh token, or a renewed token that is already
    /// expired, ends the session. Transport and decode failures keep it.
    async fn refresh(&self, session: &str, slot: &mut Option<TokenState>) -> Result<String, ApiError> {
        let Some(current) = slot.as_ref() else {
            return Err(ApiError::Unauthenticated);
        };

        match self.refresher.refresh(current).await {
            Ok(renewed) if renewed.is_stale_at(Utc::now(), Duration::ZERO) => {
                tracing::warn!(session, "refresh returned an expired token, session cleared");
                *slot = None;
                Err(ApiError::Unauthenticated)
            }
            Ok(renewed) => {
                let token = renewed.access_token.clone();
                *slot = Some(renewed);
                Ok(token)
            }
            Err(AuthError::Transport(e)) => Err(ApiError::Transport(e)),
            Err(AuthError::MalformedTokenResponse(e)) => Err(ApiError::Decode(e)),
            Err(e) => {
                tracing::warn!(session, "refresh failed, session cleared: {}", e);
                *slot = None;
                Err(ApiError::Unauthenticated)
            }
        }
    }

    async fn send(
        &self,
        method: &Method,
        path: &str,
        payload: &Payload,
        token: &str,
    ) -> Result<reqwest::Response, ApiError> {
        let url = format!("{}/{}", self.api_url, path.trim_start_matches('/'));
        tracing::debug!(%method, url = %url, "provider request");

        let request = self.http.request(method.clone(), &url).bearer_auth(token);
        let request = match payload {
            Payload::None => request,
            Payload::Query(query) => request.query(query),
            Payload::Json(body) => request.json(body),
        };

        Ok(request.send().await?)
    }
}

fn is_auth_rejection(status: StatusCode) -> bool {
    status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN
}

async fn finish(response: reqwest::Response) -> Result<ProviderResponse, ApiError> {
    let status = response.status();
    let body = response.text().await?;
    if status.is_success() {
        Ok(ProviderResponse { status, body })
    } else {
        tracing::warn!(%status, "provider rejected the request");
        Err(ApiError::Provider { status, body })
    }
}
