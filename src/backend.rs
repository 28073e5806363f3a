//! Auth backend — the HTTP seam between the session logic and the API.
//!
//! ARCHITECTURE
//! ============
//! `AuthBackend` is the trait the resolver, store, and guard depend on;
//! `HttpBackend` is the `reqwest` implementation. Tests substitute a scripted
//! backend so each navigation can be exercised without a server.
//!
//! TRADE-OFFS
//! ==========
//! Every request is bounded by the configured timeouts, so a hung backend
//! surfaces as `AuthError::Network` instead of stalling a navigation. The
//! client keeps its own cookie jar for credentialed calls; it lives as long
//! as the backend does, like a browser tab.

use std::time::Duration;

use reqwest::header::AUTHORIZATION;
use serde::de::DeserializeOwned;
use time::OffsetDateTime;

use crate::config::{AuthMode, ClientConfig};
use crate::error::AuthError;
use crate::types::{LoginRequest, LoginResponse, RefreshRequest, SessionPayload, TokenPair, UserProfile};

pub const SESSION_PATH: &str = "/session";
pub const REFRESH_PATH: &str = "/auth/refresh";
pub const LOGIN_PATH: &str = "/auth/login";
pub const LOGOUT_PATH: &str = "/auth/logout";
pub const PROFILE_PATH: &str = "/users/me";

/// Operations the session core needs from the backend API.
#[async_trait::async_trait]
pub trait AuthBackend: Send + Sync {
    /// `GET /session` with credentials.
    async fn get_session(&self) -> Result<SessionPayload, AuthError>;

    /// `DELETE /session` with credentials. The body is ignored.
    async fn delete_session(&self) -> Result<(), AuthError>;

    /// `POST /auth/refresh` exchanging a refresh token for a new pair.
    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError>;

    /// `GET /users/me`. The access token is sent as a bearer header in
    /// bearer mode and ignored in cookie mode.
    async fn fetch_profile(&self, access_token: Option<&str>) -> Result<UserProfile, AuthError>;

    /// `POST /auth/login`. Rejected credentials come back as
    /// `Ok(LoginResponse::Failure)` when the backend sends its error document.
    async fn login(&self, username: &str, password: &str) -> Result<LoginResponse, AuthError>;

    /// `POST /auth/logout` with credentials.
    async fn logout(&self) -> Result<(), AuthError>;
}

// =============================================================================
// HTTP BACKEND
// =============================================================================

pub struct HttpBackend {
    http: reqwest::Client,
    base_url: String,
    auth_mode: AuthMode,
}

impl HttpBackend {
    /// # Errors
    ///
    /// Returns [`AuthError::HttpClientBuild`] if the HTTP client cannot be built.
    pub fn new(config: &ClientConfig) -> Result<Self, AuthError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeouts.request_secs))
            .connect_timeout(Duration::from_secs(config.timeouts.connect_secs))
            .cookie_store(true)
            .build()
            .map_err(|e| AuthError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, base_url: config.api_url.clone(), auth_mode: config.auth_mode })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<(u16, String), AuthError> {
        let response = request.send().await.map_err(|e| AuthError::Network(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| AuthError::Network(e.to_string()))?;
        Ok((status, body))
    }

    async fn send_json<T: DeserializeOwned>(&self, request: reqwest::RequestBuilder) -> Result<T, AuthError> {
        let (status, body) = self.send(request).await?;
        if !(200..300).contains(&status) {
            return Err(AuthError::from_status(status, body));
        }
        parse_body(&body)
    }

    async fn send_ignoring_body(&self, request: reqwest::RequestBuilder) -> Result<(), AuthError> {
        let (status, body) = self.send(request).await?;
        if !(200..300).contains(&status) {
            return Err(AuthError::from_status(status, body));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl AuthBackend for HttpBackend {
    async fn get_session(&self) -> Result<SessionPayload, AuthError> {
        self.send_json(self.http.get(self.url(SESSION_PATH))).await
    }

    async fn delete_session(&self) -> Result<(), AuthError> {
        self.send_ignoring_body(self.http.delete(self.url(SESSION_PATH))).await
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        let request = self.http.post(self.url(REFRESH_PATH)).json(&RefreshRequest { refresh_token });
        self.send_json(request).await
    }

    async fn fetch_profile(&self, access_token: Option<&str>) -> Result<UserProfile, AuthError> {
        let mut request = self.http.get(self.url(PROFILE_PATH)).query(&[("v", cache_buster())]);
        if let (AuthMode::Bearer, Some(token)) = (self.auth_mode, access_token) {
            request = request.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        self.send_json(request).await
    }

    async fn login(&self, username: &str, password: &str) -> Result<LoginResponse, AuthError> {
        let request = self.http.post(self.url(LOGIN_PATH)).json(&LoginRequest { username, password });
        let (status, body) = self.send(request).await?;
        match status {
            200..=299 => parse_body(&body),
            400..=499 => {
                serde_json::from_str::<LoginResponse>(&body).map_err(|_| AuthError::from_status(status, body))
            }
            _ => Err(AuthError::from_status(status, body)),
        }
    }

    async fn logout(&self) -> Result<(), AuthError> {
        self.send_ignoring_body(self.http.post(self.url(LOGOUT_PATH))).await
    }
}

fn parse_body<T: DeserializeOwned>(body: &str) -> Result<T, AuthError> {
    serde_json::from_str(body).map_err(|e| AuthError::Decode(e.to_string()))
}

/// Millisecond timestamp appended to profile requests so intermediaries
/// never serve a cached identity.
fn cache_buster() -> String {
    (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000).to_string()
}

#[cfg(test)]
#[path = "backend_test.rs"]
mod tests;
