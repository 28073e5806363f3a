//! Re-login: exchange a refresh token for a fresh token pair.
//!
//! Refresh tokens rotate on every exchange, so a rejected token is final;
//! there is no retry here and callers must not add one.

use crate::error::AuthError;
use crate::store::AuthStore;
use crate::types::TokenPair;

/// Exchange `refresh_token` (or the store's own when `None`) for a new pair.
///
/// On success the store holds the new pair and the session resolver has been
/// re-fetched so both views agree.
///
/// # Errors
///
/// - [`AuthError::MissingRefreshToken`] when no token is available.
/// - [`AuthError::AuthRejected`] when the backend refuses the token.
/// - Transport errors from the backend, unchanged.
pub async fn re_login(store: &AuthStore, refresh_token: Option<&str>) -> Result<TokenPair, AuthError> {
    let token = match refresh_token.filter(|t| !t.is_empty()) {
        Some(token) => token.to_owned(),
        None => store.refresh_token().ok_or(AuthError::MissingRefreshToken)?,
    };

    tracing::debug!("exchanging refresh token");
    let pair = match store.backend().refresh(&token).await {
        Ok(pair) => pair,
        Err(e) => {
            tracing::warn!(error = %e, code = e.error_code(), "refresh token exchange failed");
            return Err(e);
        }
    };

    store.set_tokens(pair.clone());
    store.session().fetch_session().await;
    tracing::info!("token pair refreshed");
    Ok(pair)
}

#[cfg(test)]
#[path = "relogin_test.rs"]
mod tests;
