//! Client configuration parsed from environment variables.

use std::path::PathBuf;

use crate::error::AuthError;

pub const DEFAULT_API_URL: &str = "http://localhost:3333";
pub const DEFAULT_LOGIN_ROUTE: &str = "/login";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;
pub const DEFAULT_STATE_FILE: &str = ".admin-session.json";

/// How `GET /users/me` authenticates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    /// `Authorization: Bearer <access token>`.
    Bearer,
    /// Rely on the credentialed cookie jar only.
    Cookie,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self { request_secs: DEFAULT_REQUEST_TIMEOUT_SECS, connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub api_url: String,
    pub auth_mode: AuthMode,
    pub login_route: String,
    pub timeouts: Timeouts,
    pub cookie_secure: bool,
    pub state_file: PathBuf,
}

impl ClientConfig {
    /// Config with defaults for everything except the backend URL.
    #[must_use]
    pub fn new(api_url: &str) -> Self {
        let api_url = normalize_api_url(api_url);
        Self {
            cookie_secure: api_url.starts_with("https://"),
            api_url,
            auth_mode: AuthMode::Bearer,
            login_route: DEFAULT_LOGIN_ROUTE.to_owned(),
            timeouts: Timeouts::default(),
            state_file: PathBuf::from(DEFAULT_STATE_FILE),
        }
    }

    /// Build typed config from environment variables.
    ///
    /// All optional:
    /// - `ADMIN_API_URL`: default `http://localhost:3333`
    /// - `ADMIN_AUTH_MODE`: `bearer` (default) or `cookie`
    /// - `ADMIN_LOGIN_ROUTE`: default `/login`
    /// - `ADMIN_REQUEST_TIMEOUT_SECS`: default 15
    /// - `ADMIN_CONNECT_TIMEOUT_SECS`: default 5
    /// - `ADMIN_COOKIE_SECURE`: default true iff the API URL is `https://`
    /// - `ADMIN_STATE_FILE`: default `.admin-session.json`
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Config`] for an unknown auth mode.
    pub fn from_env() -> Result<Self, AuthError> {
        let api_url = std::env::var("ADMIN_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_owned());
        let mut config = Self::new(&api_url);

        config.auth_mode = parse_auth_mode(std::env::var("ADMIN_AUTH_MODE").ok().as_deref())?;
        if let Ok(route) = std::env::var("ADMIN_LOGIN_ROUTE") {
            config.login_route = normalize_route(&route);
        }
        config.timeouts = Timeouts {
            request_secs: env_parse_u64("ADMIN_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_secs: env_parse_u64("ADMIN_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS),
        };
        if let Some(secure) = env_bool("ADMIN_COOKIE_SECURE") {
            config.cookie_secure = secure;
        }
        if let Ok(path) = std::env::var("ADMIN_STATE_FILE") {
            config.state_file = PathBuf::from(path);
        }
        Ok(config)
    }

    /// Replace the API URL, re-deriving the secure-cookie default.
    #[must_use]
    pub fn with_api_url(mut self, api_url: &str) -> Self {
        self.api_url = normalize_api_url(api_url);
        self.cookie_secure = self.api_url.starts_with("https://");
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_API_URL)
    }
}

pub(crate) fn env_bool(key: &str) -> Option<bool> {
    std::env::var(key)
        .ok()
        .and_then(|raw| match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Some(true),
            "0" | "false" | "no" | "off" => Some(false),
            _ => None,
        })
}

fn env_parse_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(default)
}

fn parse_auth_mode(raw: Option<&str>) -> Result<AuthMode, AuthError> {
    match raw.map(str::trim).unwrap_or("bearer") {
        "bearer" => Ok(AuthMode::Bearer),
        "cookie" => Ok(AuthMode::Cookie),
        other => Err(AuthError::Config(format!(
            "unknown ADMIN_AUTH_MODE '{other}' (expected 'bearer' or 'cookie')"
        ))),
    }
}

fn normalize_api_url(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_owned()
}

pub(crate) fn normalize_route(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.starts_with('/') { trimmed.to_owned() } else { format!("/{trimmed}") }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
