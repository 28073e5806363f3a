//! Auth context — one wired set of resolver, store, and guard.
//!
//! All three share a single backend and observe each other's state through
//! cheap clones. Build one per page load (or per CLI invocation); tests build
//! one per case so nothing leaks between navigations.

use std::sync::Arc;

use crate::backend::{AuthBackend, HttpBackend};
use crate::config::ClientConfig;
use crate::cookies::{CookieStorage, FileCookieStorage};
use crate::error::AuthError;
use crate::guard::RouteGuard;
use crate::session::SessionResolver;
use crate::store::AuthStore;

#[derive(Clone)]
pub struct AuthContext {
    pub session: SessionResolver,
    pub store: AuthStore,
    pub guard: RouteGuard,
}

impl AuthContext {
    #[must_use]
    pub fn new(config: &ClientConfig, backend: Arc<dyn AuthBackend>, storage: Arc<dyn CookieStorage>) -> Self {
        let session = SessionResolver::new(backend.clone());
        let store = AuthStore::new(backend, session.clone(), storage, config.cookie_secure);
        let guard = RouteGuard::new(store.clone(), session.clone(), &config.login_route);
        Self { session, store, guard }
    }

    /// HTTP backend plus a file-backed cookie jar, with persisted state
    /// already restored into the store.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built or the state file
    /// exists but cannot be read.
    pub fn from_config(config: &ClientConfig) -> Result<Self, AuthError> {
        let backend = Arc::new(HttpBackend::new(config)?);
        let storage = Arc::new(FileCookieStorage::open(&config.state_file)?);
        let ctx = Self::new(config, backend, storage);
        ctx.store.restore();
        tracing::debug!(
            api_url = %config.api_url,
            state_file = %config.state_file.display(),
            logged_in = ctx.store.is_login(),
            "auth context ready"
        );
        Ok(ctx)
    }
}

#[cfg(test)]
#[path = "context_test.rs"]
mod tests;
