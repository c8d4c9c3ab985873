//! Shared session state for one gateway

use std::sync::RwLock;

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, info, warn};

use crate::http::client::normalize_base_url;
use crate::models::session_info::is_valid_sid;
use crate::storage::settings::GlobalSettings;

/// Gateway address and login
pub struct Credentials {
    pub base_url: String,
    pub user_name: String,
    pub password: SecretString,
}

impl Credentials {
    pub fn new(base_url: impl Into<String>, user_name: impl Into<String>, password: &str) -> Self {
        Self {
            base_url: base_url.into(),
            user_name: user_name.into(),
            password: SecretString::from(password.to_owned()),
        }
    }

    pub fn from_settings(settings: &GlobalSettings) -> Self {
        Self::new(
            settings.base_url.clone().unwrap_or_default(),
            settings.user_name.clone().unwrap_or_default(),
            settings.password.as_deref().unwrap_or_default(),
        )
    }

    /// All three fields are filled in and the base URL is usable
    pub fn is_complete(&self) -> bool {
        normalize_base_url(&self.base_url).is_ok()
            && !self.user_name.trim().is_empty()
            && !self.password.expose_secret().trim().is_empty()
    }

    /// Both point at the same gateway; a trailing slash makes no difference
    pub fn same_gateway(&self, other: &Credentials) -> bool {
        match (normalize_base_url(&self.base_url), normalize_base_url(&other.base_url)) {
            (Ok(a), Ok(b)) => a == b,
            _ => self.base_url.trim() == other.base_url.trim(),
        }
    }

    fn same_as(&self, other: &Credentials) -> bool {
        self.same_gateway(other)
            && self.user_name == other.user_name
            && self.password.expose_secret() == other.password.expose_secret()
    }
}

impl Clone for Credentials {
    fn clone(&self) -> Self {
        Self::new(self.base_url.clone(), self.user_name.clone(), self.password.expose_secret())
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("base_url", &self.base_url)
            .field("user_name", &self.user_name)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// What an update of the credentials changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CredentialChange {
    pub changed: bool,
    pub base_url_changed: bool,
}

#[derive(Debug)]
struct SessionInner {
    credentials: Credentials,
    sid: Option<String>,
    last_auth_attempt: Option<DateTime<Utc>>,
}

/// Session token and credentials shared by every action talking to one gateway
#[derive(Debug)]
pub struct SessionState {
    inner: RwLock<SessionInner>,
}

impl SessionState {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            inner: RwLock::new(SessionInner {
                credentials,
                sid: None,
                last_auth_attempt: None,
            }),
        }
    }

    /// Restore credentials and a previously persisted session id
    pub fn from_settings(settings: &GlobalSettings) -> Self {
        let state = Self::new(Credentials::from_settings(settings));
        if let Some(sid) = settings.sid.as_deref() {
            state.adopt(sid);
        }
        state
    }

    /// A login is needed: no usable token, but complete credentials
    pub fn needs_login(&self) -> bool {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        inner.sid.is_none() && inner.credentials.is_complete()
    }

    pub fn is_authenticated(&self) -> bool {
        self.sid().is_some()
    }

    pub fn sid(&self) -> Option<String> {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        inner.sid.clone()
    }

    pub fn credentials(&self) -> Credentials {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        inner.credentials.clone()
    }

    /// Store a token. Blank, short and sentinel tokens are refused.
    pub fn adopt(&self, token: &str) -> bool {
        if !is_valid_sid(token) {
            warn!("Refusing to store an unusable session id");
            return false;
        }
        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
        inner.sid = Some(token.trim().to_string());
        debug!("Adopted session id ({} chars)", token.trim().len());
        true
    }

    /// Drop the token. Returns whether there was one.
    pub fn invalidate(&self) -> bool {
        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
        let had_token = inner.sid.take().is_some();
        if had_token {
            info!("Gateway session invalidated");
        }
        had_token
    }

    /// Drop the token only if it is still `sid`, so a token freshly adopted by
    /// another action survives a failure observed with the old one.
    pub fn invalidate_if_current(&self, sid: &str) -> bool {
        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
        if inner.sid.as_deref() != Some(sid) {
            return false;
        }
        inner.sid = None;
        info!("Gateway session invalidated");
        true
    }

    pub fn update_credentials(&self, credentials: Credentials) -> CredentialChange {
        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
        if inner.credentials.same_as(&credentials) {
            return CredentialChange::default();
        }
        let change = CredentialChange {
            changed: true,
            base_url_changed: !inner.credentials.same_gateway(&credentials),
        };
        inner.credentials = credentials;
        change
    }

    pub fn record_auth_attempt(&self, at: DateTime<Utc>) {
        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
        inner.last_auth_attempt = Some(at);
    }

    pub fn last_auth_attempt(&self) -> Option<DateTime<Utc>> {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        inner.last_auth_attempt
    }

    /// Persisted form of credentials and token
    pub fn to_settings(&self) -> GlobalSettings {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        GlobalSettings {
            base_url: Some(inner.credentials.base_url.clone()),
            user_name: Some(inner.credentials.user_name.clone()),
            password: Some(inner.credentials.password.expose_secret().to_string()),
            sid: inner.sid.clone(),
        }
    }
}
