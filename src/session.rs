//! Session resolver — tri-state view of the server-held session.
//!
//! SYSTEM CONTEXT
//! ==============
//! The resolver is a hydration source for the auth store, not a second
//! source of truth. The guard consults it only while the store is logged
//! out, and the refresh flow re-fetches it so both views converge.
//!
//! ERROR HANDLING
//! ==============
//! A failed fetch leaves the session `Unknown` so the next navigation asks
//! again; a transient outage never reads as a logout.

use std::sync::{Arc, Mutex, PoisonError};

use crate::backend::AuthBackend;
use crate::types::Session;

/// Shared handle to the current context's session state. Clones share state.
#[derive(Clone)]
pub struct SessionResolver {
    backend: Arc<dyn AuthBackend>,
    state: Arc<Mutex<Session>>,
}

impl SessionResolver {
    #[must_use]
    pub fn new(backend: Arc<dyn AuthBackend>) -> Self {
        Self { backend, state: Arc::new(Mutex::new(Session::Unknown)) }
    }

    /// Last resolved session, `Unknown` until a fetch succeeds.
    #[must_use]
    pub fn current(&self) -> Session {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn replace(&self, session: Session) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = session;
    }

    /// Resolve the session via `GET /session` and store the result.
    pub async fn fetch_session(&self) -> Session {
        match self.backend.get_session().await {
            Ok(payload) => {
                let session = Session::from(payload);
                tracing::debug!(session = session.kind(), user_id = ?session.user_id(), "session resolved");
                self.replace(session.clone());
                session
            }
            Err(e) => {
                tracing::warn!(error = %e, code = e.error_code(), "session resolve failed; leaving session unknown");
                self.replace(Session::Unknown);
                Session::Unknown
            }
        }
    }

    /// Invalidate the server session (best-effort) and reset to `Unknown`.
    pub async fn clear_session(&self) {
        if let Err(e) = self.backend.delete_session().await {
            tracing::warn!(error = %e, "server session delete failed; clearing local session anyway");
        }
        self.replace(Session::Unknown);
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
