//! Scripted backend and fixtures shared by unit tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::AuthContext;
use crate::backend::AuthBackend;
use crate::config::ClientConfig;
use crate::cookies::MemoryCookieStorage;
use crate::error::AuthError;
use crate::types::{LoginFailure, LoginResponse, LoginSuccess, SessionPayload, TokenPair, UserProfile};

/// Canned reply for one backend operation.
#[derive(Debug, Clone)]
pub enum Reply<T> {
    Ok(T),
    Network,
    Rejected(u16),
}

impl<T: Clone> Reply<T> {
    fn to_result(&self) -> Result<T, AuthError> {
        match self {
            Self::Ok(value) => Ok(value.clone()),
            Self::Network => Err(AuthError::Network("connection refused".into())),
            Self::Rejected(status) => Err(AuthError::AuthRejected { status: *status }),
        }
    }
}

/// `AuthBackend` that answers from scripted replies and records every call.
///
/// Refresh tokens not registered with [`MockBackend::with_refresh`] are
/// rejected with 401, and each accepted token is single-use.
pub struct MockBackend {
    session: Mutex<Reply<SessionPayload>>,
    delete_session: Mutex<Reply<()>>,
    refresh: Mutex<HashMap<String, TokenPair>>,
    refresh_reply: Mutex<Option<Reply<TokenPair>>>,
    profile: Mutex<Reply<UserProfile>>,
    login: Mutex<Reply<LoginResponse>>,
    logout: Mutex<Reply<()>>,
    calls: Mutex<Vec<String>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            session: Mutex::new(Reply::Ok(SessionPayload::unauthenticated())),
            delete_session: Mutex::new(Reply::Ok(())),
            refresh: Mutex::new(HashMap::new()),
            refresh_reply: Mutex::new(None),
            profile: Mutex::new(Reply::Ok(sample_user())),
            login: Mutex::new(Reply::Ok(LoginResponse::Failure(LoginFailure {
                message: "Invalid credentials".into(),
                status_code: Some(401),
            }))),
            logout: Mutex::new(Reply::Ok(())),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_session(self, reply: Reply<SessionPayload>) -> Self {
        *self.session.lock().unwrap() = reply;
        self
    }

    pub fn with_refresh(self, refresh_token: &str, access: &str, next_refresh: &str) -> Self {
        self.refresh.lock().unwrap().insert(
            refresh_token.to_owned(),
            TokenPair { access_token: access.to_owned(), refresh_token: next_refresh.to_owned() },
        );
        self
    }

    /// Answer every refresh with `reply`, ignoring registered tokens.
    pub fn with_refresh_reply(self, reply: Reply<TokenPair>) -> Self {
        *self.refresh_reply.lock().unwrap() = Some(reply);
        self
    }

    pub fn with_profile(self, reply: Reply<UserProfile>) -> Self {
        *self.profile.lock().unwrap() = reply;
        self
    }

    pub fn with_login(self, reply: Reply<LoginResponse>) -> Self {
        *self.login.lock().unwrap() = reply;
        self
    }

    pub fn with_logout(self, reply: Reply<()>) -> Self {
        *self.logout.lock().unwrap() = reply;
        self
    }

    pub fn with_delete_session(self, reply: Reply<()>) -> Self {
        *self.delete_session.lock().unwrap() = reply;
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self, name: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| *c == name).count()
    }

    fn record(&self, name: &str) {
        self.calls.lock().unwrap().push(name.to_owned());
    }
}

#[async_trait::async_trait]
impl AuthBackend for MockBackend {
    async fn get_session(&self) -> Result<SessionPayload, AuthError> {
        self.record("get_session");
        self.session.lock().unwrap().to_result()
    }

    async fn delete_session(&self) -> Result<(), AuthError> {
        self.record("delete_session");
        self.delete_session.lock().unwrap().to_result()
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        self.record("refresh");
        if let Some(reply) = self.refresh_reply.lock().unwrap().as_ref() {
            return reply.to_result();
        }
        self.refresh
            .lock()
            .unwrap()
            .remove(refresh_token)
            .ok_or(AuthError::AuthRejected { status: 401 })
    }

    async fn fetch_profile(&self, access_token: Option<&str>) -> Result<UserProfile, AuthError> {
        self.record("fetch_profile");
        if access_token.is_none() {
            return Err(AuthError::AuthRejected { status: 401 });
        }
        self.profile.lock().unwrap().to_result()
    }

    async fn login(&self, _username: &str, _password: &str) -> Result<LoginResponse, AuthError> {
        self.record("login");
        self.login.lock().unwrap().to_result()
    }

    async fn logout(&self) -> Result<(), AuthError> {
        self.record("logout");
        self.logout.lock().unwrap().to_result()
    }
}

pub fn sample_user() -> UserProfile {
    UserProfile {
        id: "u1".into(),
        username: "alice".into(),
        full_name: "Alice Admin".into(),
        email: "alice@example.com".into(),
        avatar: None,
        phone: "0900000000".into(),
        bio: None,
        referral_code: Some("ALICE10".into()),
        roles: vec!["admin".into()],
        affiliate_level: Some("gold".into()),
        created_at: None,
        updated_at: None,
    }
}

pub fn login_success(access: &str, refresh: &str, user: Option<UserProfile>) -> LoginResponse {
    LoginResponse::Success(LoginSuccess { access_token: access.into(), refresh_token: refresh.into(), user })
}

/// Fresh context over `backend` with in-memory cookies.
pub fn context(backend: Arc<MockBackend>) -> AuthContext {
    AuthContext::new(&ClientConfig::default(), backend, Arc::new(MemoryCookieStorage::new()))
}
