//! Route guard — decides each navigation before the destination renders.
//!
//! SYSTEM CONTEXT
//! ==============
//! The host router calls [`RouteGuard::before_each`] with the destination
//! path and waits for the result. Decision order:
//!
//! 1. Login route: allow, no checks.
//! 2. Store logged in: allow, no network.
//! 3. Session never resolved: hydrate the store from the server session.
//! 4. Refresh token held: refresh, fetch the profile, allow if logged in.
//! 5. Otherwise: redirect to login.
//!
//! A navigation never ends half-authenticated: every path that does not end
//! in `Allowed` clears the local tokens.
//!
//! CONCURRENCY
//! ===========
//! Navigations are serialized through an async mutex so overlapping
//! requests from the host cannot interleave refresh exchanges.

use std::sync::{Arc, Mutex, PoisonError};

use crate::config::normalize_route;
use crate::relogin::re_login;
use crate::session::SessionResolver;
use crate::store::AuthStore;
use crate::types::Session;

/// Guard state. `Refreshing` is only observable while a navigation is
/// suspended on a refresh; `before_each` returns one of the other two.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardState {
    Allowed,
    RedirectLogin,
    Refreshing,
}

#[derive(Clone)]
pub struct RouteGuard {
    store: AuthStore,
    session: SessionResolver,
    login_route: String,
    state: Arc<Mutex<GuardState>>,
    navigation: Arc<tokio::sync::Mutex<()>>,
}

impl RouteGuard {
    #[must_use]
    pub fn new(store: AuthStore, session: SessionResolver, login_route: &str) -> Self {
        Self {
            store,
            session,
            login_route: normalize_route(login_route),
            state: Arc::new(Mutex::new(GuardState::Allowed)),
            navigation: Arc::new(tokio::sync::Mutex::new(())),
        }
    }

    /// Where `RedirectLogin` sends the user.
    #[must_use]
    pub fn login_route(&self) -> &str {
        &self.login_route
    }

    #[must_use]
    pub fn state(&self) -> GuardState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn transition(&self, next: GuardState) -> GuardState {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if *state != next {
            tracing::debug!(from = ?*state, to = ?next, "guard transition");
        }
        *state = next;
        next
    }

    #[must_use]
    pub fn is_login_route(&self, to: &str) -> bool {
        let path = to.split(['?', '#']).next().unwrap_or_default();
        normalize_route(path) == self.login_route
    }

    /// Run the guard for a navigation to `to`. Returns `Allowed` or
    /// `RedirectLogin` once every backend call has settled.
    pub async fn before_each(&self, to: &str) -> GuardState {
        let _navigation = self.navigation.lock().await;

        if self.is_login_route(to) {
            return self.transition(GuardState::Allowed);
        }
        if self.store.is_login() {
            return self.transition(GuardState::Allowed);
        }

        if self.session.current().is_unknown() {
            self.hydrate().await;
            if self.store.is_login() {
                tracing::debug!(to, "allowed from server session");
                return self.transition(GuardState::Allowed);
            }
        }

        let Some(refresh_token) = self.store.refresh_token() else {
            tracing::debug!(to, "no credentials; redirecting to login");
            self.store.clear_local();
            return self.transition(GuardState::RedirectLogin);
        };

        self.transition(GuardState::Refreshing);
        match re_login(&self.store, Some(&refresh_token)).await {
            Ok(_) => {
                self.store.get_user_info().await;
                if self.store.is_login() {
                    self.transition(GuardState::Allowed)
                } else {
                    tracing::warn!(to, "refresh succeeded but no profile is available; redirecting to login");
                    self.store.clear_local();
                    self.transition(GuardState::RedirectLogin)
                }
            }
            Err(e) => {
                tracing::info!(to, error = %e, "refresh failed; redirecting to login");
                self.store.clear_local();
                self.transition(GuardState::RedirectLogin)
            }
        }
    }

    /// Seed the store from the server session. Safe to call at context start
    /// before any navigation.
    pub async fn hydrate_from_session(&self) -> Session {
        let _navigation = self.navigation.lock().await;
        self.hydrate().await
    }

    async fn hydrate(&self) -> Session {
        let session = self.session.fetch_session().await;
        if let Session::Authenticated { user_id, access_token, refresh_token } = &session {
            tracing::debug!(user_id = %user_id, "hydrating store from server session");
            if access_token.is_some() {
                self.store.set_access_token(access_token.clone());
            }
            if refresh_token.is_some() {
                self.store.set_refresh_token(refresh_token.clone());
            }
            self.store.get_user_info().await;
        }
        session
    }
}

#[cfg(test)]
#[path = "guard_test.rs"]
mod tests;
