use std::sync::Arc;

use axum::{
    Extension, Router,
    routing::{get, put},
};
use reqwest::Client;
use url::Url;

use crate::{
    Res, api,
    config::{self, Config},
    error::ConfigError,
    management::{PendingLogins, TokenStore},
    spotify::{ApiGateway, AuthorizationFlow, TokenEndpoint, TokenRefresher},
};

/// Everything the route handlers share. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub flow: Arc<AuthorizationFlow>,
    pub gateway: Arc<ApiGateway>,
}

impl AppState {
    /// Wires the login flow and the gateway around one token store and one
    /// HTTP client bounded by the configured timeout.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let http = Client::builder()
            .timeout(config.http_timeout)
            .build()
            .map_err(ConfigError::HttpClient)?;

        let authorize_url =
            Url::parse(&config.endpoints.authorize_url).map_err(|e| ConfigError::Invalid {
                var: config::AUTH_URL_VAR,
                reason: e.to_string(),
            })?;

        let store = Arc::new(TokenStore::new());
        let endpoint = TokenEndpoint::new(
            http.clone(),
            config.endpoints.token_url.clone(),
            Arc::new(config.credentials.clone()),
        );

        let flow = AuthorizationFlow::new(
            authorize_url,
            config.scope.clone(),
            endpoint.clone(),
            PendingLogins::new(config.login_ttl),
            Arc::clone(&store),
        );
        let gateway = ApiGateway::new(
            http,
            config.endpoints.api_url.clone(),
            store,
            TokenRefresher::new(endpoint),
            config.refresh_margin,
        );

        Ok(Self {
            flow: Arc::new(flow),
            gateway: Arc::new(gateway),
        })
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(api::welcome))
        .route("/health", get(api::health))
        .route("/login", get(api::login))
        .route("/callback", get(api::callback))
        .route("/tracks", get(api::top_tracks))
        .route("/currently-playing", get(api::currently_playing))
        .route("/pause", put(api::pause))
        .route("/resume", put(api::resume))
        .route("/play/{id}", put(api::play))
        .layer(Extension(state))
}

/// Binds the configured address and serves until the process is stopped.
///
/// `on_ready` runs once the listener is bound, so anything it opens (such as a
/// browser tab on `/login`) finds the server up.
pub async fn start_api_server<F>(config: Config, on_ready: F) -> Res<()>
where
    F: FnOnce(&Config),
{
    let state = AppState::from_config(&config)?;
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(config.server_addr).await?;
    tracing::info!(addr = %config.server_addr, "listening");
    on_ready(&config);

    axum::serve(listener, app).await?;
    Ok(())
}
