//! Session and route-guard layer for an admin dashboard client.
//!
//! SYSTEM CONTEXT
//! ==============
//! Sits between a host router and the auth backend. Before each navigation
//! the host calls [`RouteGuard::before_each`]; the guard consults the
//! [`AuthStore`], hydrates from the server session through the
//! [`SessionResolver`], and silently refreshes an expired access token
//! before letting the navigation through or sending it to the login route.
//!
//! DESIGN
//! ======
//! - Client-held tokens in the store are the only source of truth for "is
//!   logged in". The server session seeds the store and is never consulted
//!   while the store says logged in.
//! - Every component takes an `Arc<dyn AuthBackend>`, so tests swap in a
//!   scripted backend and production uses [`HttpBackend`].
//! - [`AuthContext`] wires the three components together for one page load.

pub mod backend;
pub mod config;
pub mod context;
pub mod cookies;
pub mod error;
pub mod guard;
pub mod relogin;
pub mod session;
pub mod store;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use backend::{AuthBackend, HttpBackend};
pub use config::{AuthMode, ClientConfig};
pub use context::AuthContext;
pub use cookies::{CookieStorage, FileCookieStorage, MemoryCookieStorage};
pub use error::AuthError;
pub use guard::{GuardState, RouteGuard};
pub use relogin::re_login;
pub use session::SessionResolver;
pub use store::{AuthState, AuthStore};
pub use types::{Session, TokenPair, UserProfile};
