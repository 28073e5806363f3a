use super::*;
use crate::cookies::MemoryCookieStorage;
use crate::test_helpers::{MockBackend, Reply, login_success, sample_user};
use crate::types::{LoginFailure, UserProfile};

fn store_with(backend: Arc<MockBackend>) -> (AuthStore, Arc<MemoryCookieStorage>) {
    let storage = Arc::new(MemoryCookieStorage::new());
    let session = SessionResolver::new(backend.clone());
    (AuthStore::new(backend, session, storage.clone(), true), storage)
}

fn other_user() -> UserProfile {
    UserProfile { id: "u2".into(), username: "bob".into(), ..sample_user() }
}

// =============================================================================
// is_login invariant
// =============================================================================

#[test]
fn is_login_requires_user_and_token() {
    let mut state = AuthState::default();
    assert!(!state.is_login());

    state.user = Some(sample_user());
    assert!(!state.is_login());

    state.access_token = Some(String::new());
    assert!(!state.is_login());

    state.access_token = Some("at".into());
    assert!(state.is_login());

    state.user = None;
    assert!(!state.is_login());
}

#[test]
fn auth_state_debug_redacts_tokens() {
    let state = AuthState {
        user: Some(sample_user()),
        access_token: Some("at-secret".into()),
        refresh_token: Some("rt-secret".into()),
    };
    let debug = format!("{state:?}");
    assert!(!debug.contains("at-secret"));
    assert!(!debug.contains("rt-secret"));
    assert!(debug.contains("is_login: true"));
}

// =============================================================================
// setters + persistence
// =============================================================================

#[test]
fn setters_persist_cookie_subset() {
    let (store, storage) = store_with(Arc::new(MockBackend::new()));
    store.set_access_token(Some("at-1".into()));
    store.set_refresh_token(Some("rt-1".into()));
    store.set_user_info(sample_user());

    assert!(store.is_login());
    assert_eq!(storage.get(ACCESS_TOKEN_COOKIE).unwrap().value, "at-1");
    let refresh = storage.get(REFRESH_TOKEN_COOKIE).unwrap();
    assert!(refresh.http_only);
    assert!(refresh.secure);
    let user: UserProfile = serde_json::from_str(&storage.get(USER_COOKIE).unwrap().value).unwrap();
    assert_eq!(user, sample_user());
}

#[test]
fn empty_token_is_treated_as_absent() {
    let (store, storage) = store_with(Arc::new(MockBackend::new()));
    store.set_access_token(Some("at-1".into()));
    store.set_access_token(Some(String::new()));
    assert!(store.access_token().is_none());
    assert!(storage.get(ACCESS_TOKEN_COOKIE).is_none());
}

#[test]
fn restore_reloads_persisted_state() {
    let backend = Arc::new(MockBackend::new());
    let (store, storage) = store_with(backend.clone());
    store.set_access_token(Some("at-1".into()));
    store.set_refresh_token(Some("rt-1".into()));
    store.set_user_info(sample_user());

    let reloaded = AuthStore::new(backend.clone(), SessionResolver::new(backend), storage, true);
    assert!(!reloaded.is_login());
    reloaded.restore();
    assert!(reloaded.is_login());
    assert_eq!(reloaded.refresh_token().as_deref(), Some("rt-1"));
}

#[test]
fn restore_discards_corrupt_user_cookie() {
    let (store, storage) = store_with(Arc::new(MockBackend::new()));
    storage.set(CookiePolicy::user(false).issue(USER_COOKIE, "{broken")).unwrap();
    store.restore();
    assert!(store.user().is_none());
    assert!(storage.get(USER_COOKIE).is_none());
}

#[test]
fn set_avatar_patches_only_avatar() {
    let (store, storage) = store_with(Arc::new(MockBackend::new()));
    assert!(!store.set_avatar(Some("https://cdn.example/a.png".into())));

    store.set_user_info(sample_user());
    assert!(store.set_avatar(Some("https://cdn.example/a.png".into())));
    let user = store.user().unwrap();
    assert_eq!(user.avatar.as_deref(), Some("https://cdn.example/a.png"));
    assert_eq!(user.username, "alice");

    let persisted: UserProfile = serde_json::from_str(&storage.get(USER_COOKIE).unwrap().value).unwrap();
    assert_eq!(persisted.avatar.as_deref(), Some("https://cdn.example/a.png"));
}

// =============================================================================
// get_user_info
// =============================================================================

#[tokio::test]
async fn get_user_info_replaces_user() {
    let backend = Arc::new(MockBackend::new().with_profile(Reply::Ok(other_user())));
    let (store, _) = store_with(backend.clone());
    store.set_access_token(Some("at-1".into()));
    store.set_user_info(sample_user());

    store.get_user_info().await;
    assert_eq!(store.user().unwrap().id, "u2");
    assert_eq!(backend.call_count("fetch_profile"), 1);
}

#[tokio::test]
async fn get_user_info_failure_keeps_previous_user() {
    let backend = Arc::new(MockBackend::new().with_profile(Reply::Network));
    let (store, _) = store_with(backend);
    store.set_access_token(Some("at-1".into()));
    store.set_user_info(sample_user());

    store.get_user_info().await;
    assert_eq!(store.user(), Some(sample_user()));
    assert!(store.is_login());
}

#[tokio::test]
async fn get_user_info_failure_without_user_stays_logged_out() {
    let backend = Arc::new(MockBackend::new().with_profile(Reply::Rejected(401)));
    let (store, _) = store_with(backend);
    store.set_access_token(Some("at-1".into()));

    store.get_user_info().await;
    assert!(store.user().is_none());
    assert!(!store.is_login());
}

// =============================================================================
// login
// =============================================================================

#[tokio::test]
async fn login_with_embedded_user() {
    let backend = Arc::new(MockBackend::new().with_login(Reply::Ok(login_success("at-1", "rt-1", Some(sample_user())))));
    let (store, _) = store_with(backend.clone());

    store.login("alice", "hunter2").await.unwrap();
    assert!(store.is_login());
    assert_eq!(store.refresh_token().as_deref(), Some("rt-1"));
    assert_eq!(backend.call_count("fetch_profile"), 0);
}

#[tokio::test]
async fn login_without_user_fetches_profile() {
    let backend = Arc::new(MockBackend::new().with_login(Reply::Ok(login_success("at-1", "rt-1", None))));
    let (store, _) = store_with(backend.clone());

    store.login("alice", "hunter2").await.unwrap();
    assert!(store.is_login());
    assert_eq!(backend.call_count("fetch_profile"), 1);
}

#[tokio::test]
async fn login_failure_document_leaves_state_untouched() {
    let backend = Arc::new(MockBackend::new().with_login(Reply::Ok(LoginResponse::Failure(LoginFailure {
        message: "Invalid credentials".into(),
        status_code: Some(401),
    }))));
    let (store, _) = store_with(backend);

    let err = store.login("alice", "nope").await.unwrap_err();
    match err {
        AuthError::LoginFailed { message } => assert_eq!(message, "Invalid credentials"),
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(store.state(), AuthState::default());
}

#[tokio::test]
async fn login_transport_failure_propagates() {
    let backend = Arc::new(MockBackend::new().with_login(Reply::Network));
    let (store, _) = store_with(backend);
    assert!(matches!(store.login("alice", "hunter2").await, Err(AuthError::Network(_))));
    assert!(store.access_token().is_none());
}

// =============================================================================
// logout
// =============================================================================

#[tokio::test]
async fn logout_clears_state_and_cookies() {
    let backend = Arc::new(MockBackend::new());
    let (store, storage) = store_with(backend.clone());
    store.set_access_token(Some("at-1".into()));
    store.set_refresh_token(Some("rt-1".into()));
    store.set_user_info(sample_user());

    store.logout().await;
    assert!(!store.is_login());
    assert_eq!(store.state(), AuthState::default());
    assert!(storage.get(ACCESS_TOKEN_COOKIE).is_none());
    assert!(storage.get(REFRESH_TOKEN_COOKIE).is_none());
    assert!(storage.get(USER_COOKIE).is_none());
    assert_eq!(backend.calls(), vec!["logout", "delete_session"]);
}

#[tokio::test]
async fn logout_succeeds_locally_when_server_fails() {
    let backend = Arc::new(MockBackend::new().with_logout(Reply::Network).with_delete_session(Reply::Rejected(500)));
    let (store, _) = store_with(backend.clone());
    store.set_access_token(Some("at-1".into()));
    store.set_user_info(sample_user());

    store.logout().await;
    assert!(!store.is_login());
    assert!(store.session().current().is_unknown());
}
