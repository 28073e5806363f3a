//! Auth store — the context's cached identity and tokens.
//!
//! SYSTEM CONTEXT
//! ==============
//! The store is the single source of truth for "is this context logged in".
//! The session resolver and the refresh flow feed it; the route guard reads
//! it. All mutation goes through the setters below, which also keep the
//! persisted cookie subset in sync.
//!
//! DESIGN
//! ======
//! State sits behind a `std::sync::Mutex` that is never held across an
//! `.await`. Network calls snapshot what they need, release the lock, and
//! re-check the state before applying their result.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::backend::AuthBackend;
use crate::cookies::{ACCESS_TOKEN_COOKIE, CookiePolicy, CookieStorage, REFRESH_TOKEN_COOKIE, USER_COOKIE};
use crate::error::AuthError;
use crate::session::SessionResolver;
use crate::types::{LoginResponse, TokenPair, UserProfile};

// =============================================================================
// STATE
// =============================================================================

/// Snapshot of the store.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct AuthState {
    pub user: Option<UserProfile>,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
}

impl AuthState {
    /// True iff both a user identity and a non-empty access token are present.
    #[must_use]
    pub fn is_login(&self) -> bool {
        self.user.is_some() && self.access_token.as_deref().is_some_and(|t| !t.is_empty())
    }
}

impl fmt::Debug for AuthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthState")
            .field("user", &self.user.as_ref().map(|u| &u.id))
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
            .field("is_login", &self.is_login())
            .finish()
    }
}

// =============================================================================
// STORE
// =============================================================================

/// Handle to the context's auth state. Clones share state.
#[derive(Clone)]
pub struct AuthStore {
    inner: Arc<StoreInner>,
}

struct StoreInner {
    state: Mutex<AuthState>,
    backend: Arc<dyn AuthBackend>,
    session: SessionResolver,
    storage: Arc<dyn CookieStorage>,
    cookie_secure: bool,
}

impl AuthStore {
    #[must_use]
    pub fn new(
        backend: Arc<dyn AuthBackend>,
        session: SessionResolver,
        storage: Arc<dyn CookieStorage>,
        cookie_secure: bool,
    ) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                state: Mutex::new(AuthState::default()),
                backend,
                session,
                storage,
                cookie_secure,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, AuthState> {
        self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn backend(&self) -> &Arc<dyn AuthBackend> {
        &self.inner.backend
    }

    pub(crate) fn session(&self) -> &SessionResolver {
        &self.inner.session
    }

    // -------------------------------------------------------------------------
    // Reads
    // -------------------------------------------------------------------------

    #[must_use]
    pub fn state(&self) -> AuthState {
        self.lock().clone()
    }

    #[must_use]
    pub fn is_login(&self) -> bool {
        self.lock().is_login()
    }

    #[must_use]
    pub fn user(&self) -> Option<UserProfile> {
        self.lock().user.clone()
    }

    #[must_use]
    pub fn access_token(&self) -> Option<String> {
        self.lock().access_token.clone()
    }

    #[must_use]
    pub fn refresh_token(&self) -> Option<String> {
        self.lock().refresh_token.clone()
    }

    // -------------------------------------------------------------------------
    // Setters
    // -------------------------------------------------------------------------

    pub fn set_access_token(&self, token: Option<String>) {
        let token = token.filter(|t| !t.is_empty());
        self.persist(ACCESS_TOKEN_COOKIE, token.as_deref(), CookiePolicy::access_token(self.inner.cookie_secure));
        self.lock().access_token = token;
    }

    pub fn set_refresh_token(&self, token: Option<String>) {
        let token = token.filter(|t| !t.is_empty());
        self.persist(REFRESH_TOKEN_COOKIE, token.as_deref(), CookiePolicy::refresh_token(self.inner.cookie_secure));
        self.lock().refresh_token = token;
    }

    pub(crate) fn set_tokens(&self, pair: TokenPair) {
        self.set_access_token(Some(pair.access_token));
        self.set_refresh_token(Some(pair.refresh_token));
    }

    /// Replace the cached profile wholesale.
    pub fn set_user_info(&self, user: UserProfile) {
        self.persist_user(&user);
        self.lock().user = Some(user);
    }

    /// Patch the avatar URL in place. Returns false when no user is cached.
    pub fn set_avatar(&self, avatar: Option<String>) -> bool {
        let updated = {
            let mut state = self.lock();
            let Some(user) = state.user.as_mut() else {
                return false;
            };
            user.avatar = avatar;
            user.clone()
        };
        self.persist_user(&updated);
        true
    }

    // -------------------------------------------------------------------------
    // Network-backed operations
    // -------------------------------------------------------------------------

    /// Refresh the cached profile with the current access token.
    ///
    /// Best-effort: a failure is logged and the previous user state is kept.
    /// A result that arrives after the token changed is discarded.
    pub async fn get_user_info(&self) {
        let token = self.access_token();
        match self.inner.backend.fetch_profile(token.as_deref()).await {
            Ok(profile) => {
                if self.access_token() != token {
                    tracing::debug!("access token changed during profile fetch; discarding result");
                    return;
                }
                tracing::debug!(user_id = %profile.id, "profile refreshed");
                self.set_user_info(profile);
            }
            Err(e) => {
                let err = AuthError::ProfileFetchFailed(e.to_string());
                tracing::warn!(error = %err, code = err.error_code(), "keeping previous user state");
            }
        }
    }

    /// Log in with username and password.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::LoginFailed`] when the backend rejects the
    /// credentials, or the transport error when the call itself fails. State
    /// is untouched on error.
    pub async fn login(&self, username: &str, password: &str) -> Result<(), AuthError> {
        match self.inner.backend.login(username, password).await? {
            LoginResponse::Success(success) => {
                self.set_tokens(TokenPair {
                    access_token: success.access_token,
                    refresh_token: success.refresh_token,
                });
                match success.user {
                    Some(user) => self.set_user_info(user),
                    None => self.get_user_info().await,
                }
                tracing::info!(username, logged_in = self.is_login(), "login succeeded");
                Ok(())
            }
            LoginResponse::Failure(failure) => {
                tracing::info!(username, status = ?failure.status_code, "login rejected");
                Err(AuthError::LoginFailed { message: failure.message })
            }
        }
    }

    /// Clear local state, then tell the backend. Server failures never undo
    /// the local logout.
    pub async fn logout(&self) {
        self.clear_local();
        tracing::info!("logged out");
        if let Err(e) = self.inner.backend.logout().await {
            tracing::warn!(error = %e, "server logout failed");
        }
        self.inner.session.clear_session().await;
    }

    /// Drop tokens and user without any network call.
    pub fn clear_local(&self) {
        for name in [ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE, USER_COOKIE] {
            if let Err(e) = self.inner.storage.remove(name) {
                tracing::warn!(cookie = name, error = %e, "failed to remove auth cookie");
            }
        }
        *self.lock() = AuthState::default();
    }

    /// Reload the persisted subset into memory.
    pub fn restore(&self) {
        let storage = &self.inner.storage;
        let access_token = storage.get(ACCESS_TOKEN_COOKIE).map(|c| c.value);
        let refresh_token = storage.get(REFRESH_TOKEN_COOKIE).map(|c| c.value);
        let user = storage.get(USER_COOKIE).and_then(|c| match serde_json::from_str::<UserProfile>(&c.value) {
            Ok(user) => Some(user),
            Err(e) => {
                tracing::warn!(error = %e, "discarding unreadable user cookie");
                let _ = storage.remove(USER_COOKIE);
                None
            }
        });

        let restored = AuthState { user, access_token, refresh_token };
        tracing::debug!(state = ?restored, "auth state restored");
        *self.lock() = restored;
    }

    // -------------------------------------------------------------------------
    // Persistence
    // -------------------------------------------------------------------------

    fn persist(&self, name: &str, value: Option<&str>, policy: CookiePolicy) {
        let result = match value {
            Some(value) => self.inner.storage.set(policy.issue(name, value)),
            None => self.inner.storage.remove(name),
        };
        if let Err(e) = result {
            tracing::warn!(cookie = name, error = %e, "failed to persist auth cookie");
        }
    }

    fn persist_user(&self, user: &UserProfile) {
        match serde_json::to_string(user) {
            Ok(raw) => self.persist(USER_COOKIE, Some(&raw), CookiePolicy::user(self.inner.cookie_secure)),
            Err(e) => tracing::warn!(error = %e, "failed to serialize user cookie"),
        }
    }
}

#[cfg(test)]
#[path = "store_test.rs"]
mod tests;
