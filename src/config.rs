//! Configuration management for the Spotify token gateway.
//!
//! This module handles loading and accessing configuration values from environment
//! variables and `.env` files. Everything is read once at startup into an immutable
//! [`Config`]; a missing credential is a fatal startup error rather than something
//! discovered on the first request.
//!
//! The configuration system follows a hierarchical approach:
//! 1. Environment variables (highest priority)
//! 2. `.env` file in the working directory, then in the local data directory
//! 3. Application defaults (where applicable)

use std::{env, fmt, net::SocketAddr, path::PathBuf, str::FromStr, time::Duration};

use crate::error::ConfigError;

pub const CLIENT_ID_VAR: &str = "SPOTIFY_API_AUTH_CLIENT_ID";
pub const CLIENT_SECRET_VAR: &str = "SPOTIFY_API_AUTH_CLIENT_SECRET";
pub const REDIRECT_URI_VAR: &str = "SPOTIFY_API_REDIRECT_URI";
pub const SCOPE_VAR: &str = "SPOTIFY_API_AUTH_SCOPE";
pub const AUTH_URL_VAR: &str = "SPOTIFY_API_AUTH_URL";
pub const TOKEN_URL_VAR: &str = "SPOTIFY_API_TOKEN_URL";
pub const API_URL_VAR: &str = "SPOTIFY_API_URL";
pub const SERVER_ADDRESS_VAR: &str = "SERVER_ADDRESS";
pub const HTTP_TIMEOUT_VAR: &str = "SPOTGATE_HTTP_TIMEOUT_SECS";
pub const REFRESH_MARGIN_VAR: &str = "SPOTGATE_REFRESH_MARGIN_SECS";
pub const LOGIN_TTL_VAR: &str = "SPOTGATE_LOGIN_TTL_SECS";

pub const DEFAULT_SERVER_ADDRESS: &str = "127.0.0.1:3000";
pub const DEFAULT_AUTH_URL: &str = "https://accounts.spotify.com/authorize";
pub const DEFAULT_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
pub const DEFAULT_API_URL: &str = "https://api.spotify.com/v1";
pub const DEFAULT_SCOPE: &str = "user-read-private user-read-email user-top-read \
    user-read-playback-state user-modify-playback-state user-read-currently-playing \
    streaming app-remote-control";

const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;
const DEFAULT_REFRESH_MARGIN_SECS: u64 = 30;
const DEFAULT_LOGIN_TTL_SECS: u64 = 600;

/// Loads environment variables from a `.env` file.
///
/// A `.env` in the current working directory wins. Otherwise the file is looked
/// up in the platform-specific local data directory under `spotgate/.env`:
/// - Linux: `~/.local/share/spotgate/.env`
/// - macOS: `~/Library/Application Support/spotgate/.env`
/// - Windows: `%LOCALAPPDATA%/spotgate/.env`
///
/// A missing file is not an error, the variables may come from the real
/// environment. A file that exists but cannot be parsed is.
///
/// # Example
///
/// ```
/// use spotgate::config;
///
/// if let Err(e) = config::load_env() {
///     eprintln!("Configuration error: {}", e);
/// }
/// ```
pub fn load_env() -> Result<Option<PathBuf>, String> {
    let local = PathBuf::from(".env");
    let path = if local.is_file() {
        local
    } else {
        let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push("spotgate/.env");
        path
    };

    if !path.is_file() {
        return Ok(None);
    }

    dotenv::from_path(&path).map_err(|e| format!("{}: {}", path.display(), e))?;
    Ok(Some(path))
}

/// OAuth client credentials registered with the provider.
///
/// Immutable for the lifetime of the process.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("redirect_uri", &self.redirect_uri)
            .finish()
    }
}

/// Provider endpoints. Overridable so tests and proxies can point elsewhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub authorize_url: String,
    pub token_url: String,
    pub api_url: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            authorize_url: DEFAULT_AUTH_URL.to_string(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
            api_url: DEFAULT_API_URL.to_string(),
        }
    }
}

/// Complete runtime configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub credentials: Credentials,
    pub endpoints: Endpoints,
    pub scope: Vec<String>,
    pub server_addr: SocketAddr,
    /// Upper bound for every outbound HTTP call.
    pub http_timeout: Duration,
    /// Tokens this close to expiry are refreshed before use.
    pub refresh_margin: Duration,
    /// How long a login nonce stays valid.
    pub login_ttl: Duration,
}

impl Config {
    /// Builds a configuration with default endpoints and tunables around the
    /// given credentials.
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            endpoints: Endpoints::default(),
            scope: split_scope(DEFAULT_SCOPE),
            server_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            refresh_margin: Duration::from_secs(DEFAULT_REFRESH_MARGIN_SECS),
            login_ttl: Duration::from_secs(DEFAULT_LOGIN_TTL_SECS),
        }
    }

    /// Reads the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] if any of the client id, client secret or
    /// redirect URI is unset or blank, and [`ConfigError::Invalid`] if an optional
    /// value cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Reads the configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let required = |key: &'static str| value(key).ok_or(ConfigError::Missing(key));

        let credentials = Credentials {
            client_id: required(CLIENT_ID_VAR)?,
            client_secret: required(CLIENT_SECRET_VAR)?,
            redirect_uri: required(REDIRECT_URI_VAR)?,
        };

        let mut config = Config::new(credentials);

        if let Some(url) = value(AUTH_URL_VAR) {
            config.endpoints.authorize_url = url;
        }
        if let Some(url) = value(TOKEN_URL_VAR) {
            config.endpoints.token_url = url;
        }
        if let Some(url) = value(API_URL_VAR) {
            config.endpoints.api_url = url.trim_end_matches('/').to_string();
        }
        if let Some(scope) = value(SCOPE_VAR) {
            config.scope = split_scope(&scope);
        }

        config.server_addr = parse_or(
            SERVER_ADDRESS_VAR,
            value(SERVER_ADDRESS_VAR),
            DEFAULT_SERVER_ADDRESS,
        )?;
        config.http_timeout =
            seconds_or(HTTP_TIMEOUT_VAR, value(HTTP_TIMEOUT_VAR), DEFAULT_HTTP_TIMEOUT_SECS)?;
        config.refresh_margin = seconds_or(
            REFRESH_MARGIN_VAR,
            value(REFRESH_MARGIN_VAR),
            DEFAULT_REFRESH_MARGIN_SECS,
        )?;
        config.login_ttl =
            seconds_or(LOGIN_TTL_VAR, value(LOGIN_TTL_VAR), DEFAULT_LOGIN_TTL_SECS)?;

        Ok(config)
    }

    /// Absolute URL of the local login entry point.
    pub fn login_url(&self) -> String {
        format!("http://{}/login", self.server_addr)
    }
}

fn split_scope(scope: &str) -> Vec<String> {
    scope.split_whitespace().map(str::to_string).collect()
}

fn parse_or<T>(var: &'static str, raw: Option<String>, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    let raw = raw.unwrap_or_else(|| default.to_string());
    raw.parse::<T>().map_err(|e| ConfigError::Invalid {
        var,
        reason: e.to_string(),
    })
}

fn seconds_or(var: &'static str, raw: Option<String>, default: u64) -> Result<Duration, ConfigError> {
    let secs: u64 = parse_or(var, raw, &default.to_string())?;
    Ok(Duration::from_secs(secs))
}
