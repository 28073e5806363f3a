//! Cookie-style persistence for the client-held auth subset.
//!
//! SYSTEM CONTEXT
//! ==============
//! The store persists the access token and user profile for half a day and
//! the refresh token for a month. Each entry carries the same attributes a
//! browser cookie would (`SameSite`, `Secure`, `HttpOnly`, expiry) so the
//! policy is explicit even when the backing store is a file.
//!
//! TRADE-OFFS
//! ==========
//! `FileCookieStorage` rewrites the whole jar on every mutation. The jar
//! holds three entries, so simplicity wins over incremental writes.

use std::collections::HashMap;
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use crate::error::AuthError;

pub const ACCESS_TOKEN_COOKIE: &str = "accessToken";
pub const REFRESH_TOKEN_COOKIE: &str = "refreshToken";
pub const USER_COOKIE: &str = "user";

pub const ACCESS_TOKEN_TTL_HOURS: i64 = 12;
pub const REFRESH_TOKEN_TTL_DAYS: i64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SameSite {
    Strict,
    Lax,
}

// =============================================================================
// COOKIE
// =============================================================================

/// One persisted entry. `expires_at` is a unix timestamp in seconds.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedCookie {
    pub name: String,
    pub value: String,
    pub expires_at: i64,
    pub same_site: SameSite,
    pub secure: bool,
    pub http_only: bool,
}

impl PersistedCookie {
    #[must_use]
    pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
        now.unix_timestamp() >= self.expires_at
    }

    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(OffsetDateTime::now_utc())
    }
}

// Values are tokens or profile JSON; never print them.
impl fmt::Debug for PersistedCookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PersistedCookie")
            .field("name", &self.name)
            .field("value", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .field("same_site", &self.same_site)
            .field("secure", &self.secure)
            .field("http_only", &self.http_only)
            .finish()
    }
}

// =============================================================================
// POLICY
// =============================================================================

/// Attributes applied when issuing a cookie.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CookiePolicy {
    pub ttl: Duration,
    pub same_site: SameSite,
    pub secure: bool,
    pub http_only: bool,
}

impl CookiePolicy {
    #[must_use]
    pub fn access_token(secure: bool) -> Self {
        Self { ttl: Duration::hours(ACCESS_TOKEN_TTL_HOURS), same_site: SameSite::Strict, secure, http_only: false }
    }

    /// The refresh token is the long-lived credential; it is `HttpOnly`.
    #[must_use]
    pub fn refresh_token(secure: bool) -> Self {
        Self { ttl: Duration::days(REFRESH_TOKEN_TTL_DAYS), same_site: SameSite::Strict, secure, http_only: true }
    }

    /// Profile JSON is display data, not a credential; it follows the
    /// access token's lifetime with a relaxed `SameSite`.
    #[must_use]
    pub fn user(secure: bool) -> Self {
        Self { same_site: SameSite::Lax, ..Self::access_token(secure) }
    }

    #[must_use]
    pub fn issue_at(&self, name: &str, value: &str, now: OffsetDateTime) -> PersistedCookie {
        PersistedCookie {
            name: name.to_owned(),
            value: value.to_owned(),
            expires_at: (now + self.ttl).unix_timestamp(),
            same_site: self.same_site,
            secure: self.secure,
            http_only: self.http_only,
        }
    }

    #[must_use]
    pub fn issue(&self, name: &str, value: &str) -> PersistedCookie {
        self.issue_at(name, value, OffsetDateTime::now_utc())
    }
}

// =============================================================================
// STORAGE
// =============================================================================

/// Backing store for persisted cookies. Expired entries are never returned.
pub trait CookieStorage: Send + Sync {
    fn get(&self, name: &str) -> Option<PersistedCookie>;

    /// # Errors
    ///
    /// Returns [`AuthError::Storage`] when the entry cannot be persisted.
    fn set(&self, cookie: PersistedCookie) -> Result<(), AuthError>;

    /// # Errors
    ///
    /// Returns [`AuthError::Storage`] when the removal cannot be persisted.
    fn remove(&self, name: &str) -> Result<(), AuthError>;
}

/// Page-lifetime storage. Nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryCookieStorage {
    cookies: Mutex<HashMap<String, PersistedCookie>>,
}

impl MemoryCookieStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl CookieStorage for MemoryCookieStorage {
    fn get(&self, name: &str) -> Option<PersistedCookie> {
        let mut cookies = self.cookies.lock().unwrap_or_else(PoisonError::into_inner);
        live_entry(&mut cookies, name)
    }

    fn set(&self, cookie: PersistedCookie) -> Result<(), AuthError> {
        let mut cookies = self.cookies.lock().unwrap_or_else(PoisonError::into_inner);
        cookies.insert(cookie.name.clone(), cookie);
        Ok(())
    }

    fn remove(&self, name: &str) -> Result<(), AuthError> {
        let mut cookies = self.cookies.lock().unwrap_or_else(PoisonError::into_inner);
        cookies.remove(name);
        Ok(())
    }
}

/// JSON-file storage; the jar survives process restarts.
#[derive(Debug)]
pub struct FileCookieStorage {
    path: PathBuf,
    cookies: Mutex<HashMap<String, PersistedCookie>>,
}

impl FileCookieStorage {
    /// Open the jar at `path`, dropping entries that have already expired.
    /// A missing file is an empty jar.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Storage`] if the file exists but cannot be read
    /// or parsed.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, AuthError> {
        let path = path.into();
        let cookies = match std::fs::read_to_string(&path) {
            Ok(raw) => parse_jar(&raw)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(AuthError::Storage(format!("read {}: {e}", path.display()))),
        };
        Ok(Self { path, cookies: Mutex::new(cookies) })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, cookies: &HashMap<String, PersistedCookie>) -> Result<(), AuthError> {
        let mut entries: Vec<&PersistedCookie> = cookies.values().collect();
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        let raw = serde_json::to_string_pretty(&entries).map_err(|e| AuthError::Storage(e.to_string()))?;

        let tmp = self.path.with_extension("tmp");
        write_private(&tmp, raw.as_bytes()).map_err(|e| AuthError::Storage(format!("write {}: {e}", tmp.display())))?;
        std::fs::rename(&tmp, &self.path)
            .map_err(|e| AuthError::Storage(format!("rename {}: {e}", self.path.display())))
    }
}

impl CookieStorage for FileCookieStorage {
    fn get(&self, name: &str) -> Option<PersistedCookie> {
        let mut cookies = self.cookies.lock().unwrap_or_else(PoisonError::into_inner);
        live_entry(&mut cookies, name)
    }

    fn set(&self, cookie: PersistedCookie) -> Result<(), AuthError> {
        let mut cookies = self.cookies.lock().unwrap_or_else(PoisonError::into_inner);
        cookies.insert(cookie.name.clone(), cookie);
        self.flush(&cookies)
    }

    fn remove(&self, name: &str) -> Result<(), AuthError> {
        let mut cookies = self.cookies.lock().unwrap_or_else(PoisonError::into_inner);
        if cookies.remove(name).is_none() {
            return Ok(());
        }
        self.flush(&cookies)
    }
}

/// Write `bytes` to a fresh file readable only by the owner. The jar holds
/// the refresh token, so group and other bits stay clear on unix.
fn write_private(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Err(e) = std::fs::remove_file(path) {
        if e.kind() != std::io::ErrorKind::NotFound {
            return Err(e);
        }
    }

    let mut options = std::fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}

fn live_entry(cookies: &mut HashMap<String, PersistedCookie>, name: &str) -> Option<PersistedCookie> {
    if cookies.get(name).is_some_and(PersistedCookie::is_expired) {
        cookies.remove(name);
        return None;
    }
    cookies.get(name).cloned()
}

fn parse_jar(raw: &str) -> Result<HashMap<String, PersistedCookie>, AuthError> {
    if raw.trim().is_empty() {
        return Ok(HashMap::new());
    }
    let entries: Vec<PersistedCookie> =
        serde_json::from_str(raw).map_err(|e| AuthError::Storage(format!("parse cookie jar: {e}")))?;
    let now = OffsetDateTime::now_utc();
    Ok(entries
        .into_iter()
        .filter(|c| !c.is_expired_at(now))
        .map(|c| (c.name.clone(), c))
        .collect())
}

#[cfg(test)]
#[path = "cookies_test.rs"]
mod tests;
