//! Error type shared by every auth/session component.
//!
//! ERROR HANDLING
//! ==============
//! Callers decide policy per kind: profile failures are swallowed by the
//! store, `AuthRejected` during refresh ends the navigation, and transport
//! failures while resolving the session leave it `Unknown`.

/// Errors produced by the auth backend, store, and supporting layers.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The request never produced a response (connect failure, timeout).
    #[error("network error: {0}")]
    Network(String),

    /// The backend refused the credentials (401/403, expired refresh token).
    #[error("authentication rejected: status {status}")]
    AuthRejected { status: u16 },

    /// The profile call failed even though a token was available.
    #[error("profile fetch failed: {0}")]
    ProfileFetchFailed(String),

    /// The login endpoint answered with its failure document.
    #[error("login failed: {message}")]
    LoginFailed { message: String },

    /// The backend returned a status the client has no mapping for.
    #[error("unexpected response status {status}")]
    UnexpectedStatus { status: u16, body: String },

    /// A response body could not be deserialized.
    #[error("response decode failed: {0}")]
    Decode(String),

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),

    /// Persisted cookie state could not be read or written.
    #[error("cookie storage error: {0}")]
    Storage(String),

    /// A configuration value could not be parsed.
    #[error("config parse failed: {0}")]
    Config(String),

    /// A refresh was requested but no refresh token is held.
    #[error("no refresh token available")]
    MissingRefreshToken,
}

impl AuthError {
    /// Stable machine-readable code for logs and CLI output.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Network(_) => "E_NETWORK",
            Self::AuthRejected { .. } => "E_AUTH_REJECTED",
            Self::ProfileFetchFailed(_) => "E_PROFILE_FETCH",
            Self::LoginFailed { .. } => "E_LOGIN_FAILED",
            Self::UnexpectedStatus { .. } => "E_UNEXPECTED_STATUS",
            Self::Decode(_) => "E_DECODE",
            Self::HttpClientBuild(_) => "E_HTTP_CLIENT_BUILD",
            Self::Storage(_) => "E_STORAGE",
            Self::Config(_) => "E_CONFIG",
            Self::MissingRefreshToken => "E_MISSING_REFRESH_TOKEN",
        }
    }

    /// Whether a later attempt could plausibly succeed. Nothing in this crate
    /// retries automatically; this only informs the caller.
    #[must_use]
    pub fn retryable(&self) -> bool {
        matches!(self, Self::Network(_) | Self::UnexpectedStatus { status: 429 | 500..=599, .. })
    }

    /// Map a non-success HTTP status onto an error kind.
    #[must_use]
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            401 | 403 => Self::AuthRejected { status },
            _ => Self::UnexpectedStatus { status, body },
        }
    }
}

#[cfg(test)]
#[path = "error_test.rs"]
mod tests;
