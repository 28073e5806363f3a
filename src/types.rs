//! Wire and domain types for the auth/session endpoints.
//!
//! SYSTEM CONTEXT
//! ==============
//! The backend speaks two casings: the session endpoint uses camelCase
//! (`isAuthenticated`, `userId`) while the auth endpoints use snake_case
//! (`access_token`). Each type pins its own casing instead of a crate-wide
//! convention.

use std::fmt;

use serde::{Deserialize, Serialize};

const REDACTED: &str = "<redacted>";

fn redact(token: Option<&String>) -> Option<&'static str> {
    token.map(|_| REDACTED)
}

// =============================================================================
// USER PROFILE
// =============================================================================

/// Identity document returned by `GET /users/me`.
///
/// Replaced wholesale on every fetch; the avatar is the only field the client
/// patches in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub full_name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(default)]
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    /// Referral code shared by affiliates.
    #[serde(rename = "ref", default, skip_serializing_if = "Option::is_none")]
    pub referral_code: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub affiliate_level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl UserProfile {
    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}

// =============================================================================
// SESSION
// =============================================================================

/// Tri-state view of the server-held session.
#[derive(Clone, PartialEq, Eq, Default)]
pub enum Session {
    /// Not resolved yet, or the last resolve attempt failed.
    #[default]
    Unknown,
    Unauthenticated,
    Authenticated {
        user_id: String,
        access_token: Option<String>,
        refresh_token: Option<String>,
    },
}

impl Session {
    #[must_use]
    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown)
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated { .. })
    }

    #[must_use]
    pub fn user_id(&self) -> Option<&str> {
        match self {
            Self::Authenticated { user_id, .. } => Some(user_id),
            _ => None,
        }
    }

    /// Short lowercase label, used in logs and CLI output.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Unauthenticated => "unauthenticated",
            Self::Authenticated { .. } => "authenticated",
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown => f.write_str("Unknown"),
            Self::Unauthenticated => f.write_str("Unauthenticated"),
            Self::Authenticated { user_id, access_token, refresh_token } => f
                .debug_struct("Authenticated")
                .field("user_id", user_id)
                .field("access_token", &redact(access_token.as_ref()))
                .field("refresh_token", &redact(refresh_token.as_ref()))
                .finish(),
        }
    }
}

/// Body of `GET /session`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_authenticated: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

impl SessionPayload {
    #[must_use]
    pub fn unauthenticated() -> Self {
        Self { is_authenticated: Some(false), ..Self::default() }
    }
}

impl From<SessionPayload> for Session {
    /// An authenticated payload without a user id cannot seed anything, so it
    /// stays `Unknown` rather than claiming either answer.
    fn from(payload: SessionPayload) -> Self {
        match (payload.is_authenticated, payload.user_id) {
            (Some(true), Some(user_id)) if !user_id.is_empty() => Self::Authenticated {
                user_id,
                access_token: payload.access_token.filter(|t| !t.is_empty()),
                refresh_token: payload.refresh_token.filter(|t| !t.is_empty()),
            },
            (Some(false), _) => Self::Unauthenticated,
            _ => Self::Unknown,
        }
    }
}

// =============================================================================
// TOKENS
// =============================================================================

/// Access/refresh pair minted by `/auth/refresh` or `/auth/login`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

impl fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenPair")
            .field("access_token", &REDACTED)
            .field("refresh_token", &REDACTED)
            .finish()
    }
}

#[derive(Serialize)]
pub(crate) struct RefreshRequest<'a> {
    pub refresh_token: &'a str,
}

#[derive(Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

// =============================================================================
// LOGIN RESPONSE
// =============================================================================

/// Successful `/auth/login` body. `user` is optional; the store fetches the
/// profile when it is absent.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginSuccess {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<UserProfile>,
}

impl fmt::Debug for LoginSuccess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginSuccess")
            .field("access_token", &REDACTED)
            .field("refresh_token", &REDACTED)
            .field("user", &self.user)
            .finish()
    }
}

/// Failure document in the backend's error shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginFailure {
    #[serde(default)]
    pub message: String,
    #[serde(rename = "statusCode", default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
}

/// Discriminated `/auth/login` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LoginResponse {
    Success(LoginSuccess),
    Failure(LoginFailure),
}

#[cfg(test)]
#[path = "types_test.rs"]
mod tests;
