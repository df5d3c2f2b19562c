//! The session store: single source of truth for who is logged in.
//!
//! State is derived from the persisted bearer token. Passive checks
//! (startup, the expiry sweep) degrade to logged-out and clean the slot;
//! explicit `login` calls report their failures.

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::storage::{StorageError, TokenStorage};
use super::token::{self, Claims, DecodeError, Identity, Role};

#[derive(Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("Token is expired")]
    ExpiredToken,

    #[error("Failed to persist token: {0}")]
    Storage(#[from] StorageError),
}

/// Source of the current time for expiry checks.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Snapshot of the in-memory session. `authenticated` is true exactly
/// when an identity is present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct SessionState {
    identity: Option<Identity>,
    authenticated: bool,
}

impl SessionState {
    pub fn logged_out() -> Self {
        Self::default()
    }

    pub fn authenticated_as(identity: Identity) -> Self {
        Self {
            identity: Some(identity),
            authenticated: true,
        }
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    pub fn has_role(&self, required: Role) -> bool {
        self.identity.as_ref().is_some_and(|i| i.role == required)
    }
}

struct Inner {
    state: SessionState,
    token: Option<String>,
}

pub struct SessionStore {
    storage: Box<dyn TokenStorage>,
    clock: Arc<dyn Clock>,
    inner: Mutex<Inner>,
    changes: watch::Sender<SessionState>,
}

impl SessionStore {
    /// Create a logged-out store. Call [`initialize`](Self::initialize)
    /// to pick up a persisted token.
    pub fn new(storage: impl TokenStorage + 'static) -> Self {
        Self::with_clock(storage, Arc::new(SystemClock))
    }

    pub fn with_clock(storage: impl TokenStorage + 'static, clock: Arc<dyn Clock>) -> Self {
        Self::from_parts(Box::new(storage), clock)
    }

    pub fn from_parts(storage: Box<dyn TokenStorage>, clock: Arc<dyn Clock>) -> Self {
        let (changes, _) = watch::channel(SessionState::logged_out());
        Self {
            storage,
            clock,
            inner: Mutex::new(Inner {
                state: SessionState::logged_out(),
                token: None,
            }),
            changes,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // Every write leaves Inner consistent, so a poisoned lock is still usable.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn install(&self, inner: &mut Inner, token: String, claims: &Claims) {
        inner.state = SessionState::authenticated_as(claims.identity());
        inner.token = Some(token);
        self.changes.send_replace(inner.state.clone());
    }

    fn reset(&self, inner: &mut Inner) {
        if let Err(e) = self.storage.clear() {
            warn!(error = %e, "Failed to clear persisted token");
        }
        let was_authenticated = inner.state.is_authenticated();
        inner.state = SessionState::logged_out();
        inner.token = None;
        if was_authenticated {
            self.changes.send_replace(SessionState::logged_out());
        }
    }

    /// Load and validate the persisted token. Anything unusable leaves the
    /// session logged out with the slot cleared.
    pub fn initialize(&self) -> SessionState {
        let mut inner = self.lock();

        let token = match self.storage.load() {
            Ok(Some(token)) => token,
            Ok(None) => {
                debug!("No persisted token");
                return inner.state.clone();
            }
            Err(e) => {
                warn!(error = %e, "Failed to read persisted token");
                return inner.state.clone();
            }
        };

        let now = self.clock.now();
        match token::decode(&token) {
            Ok(claims) if !claims.is_expired_at(now) => {
                info!(username = %claims.username, role = %claims.role, "Session restored");
                self.install(&mut inner, token, &claims);
            }
            Ok(claims) => {
                debug!(exp = claims.exp, "Persisted token expired");
                self.reset(&mut inner);
            }
            Err(e) => {
                warn!(error = %e, "Persisted token is invalid");
                self.reset(&mut inner);
            }
        }
        inner.state.clone()
    }

    /// Install a token obtained from the backend and return its claims.
    /// On failure the previous session is left untouched.
    pub fn login(&self, token: &str) -> Result<Claims, SessionError> {
        let token = token.trim();
        let claims = token::decode(token)?;
        if claims.is_expired_at(self.clock.now()) {
            return Err(SessionError::ExpiredToken);
        }

        let mut inner = self.lock();
        self.storage.save(token)?;
        self.install(&mut inner, token.to_string(), &claims);
        info!(username = %claims.username, role = %claims.role, "Login successful");
        Ok(claims)
    }

    /// Clear the session. Always succeeds.
    pub fn logout(&self) {
        let mut inner = self.lock();
        if inner.state.is_authenticated() {
            info!("Logged out");
        }
        self.reset(&mut inner);
    }

    /// One pass of the expiry check. Returns true if the session was
    /// logged out by it.
    pub fn sweep(&self) -> bool {
        let mut inner = self.lock();
        if !inner.state.is_authenticated() {
            return false;
        }

        let still_valid = match self.storage.load() {
            Ok(Some(token)) => token::is_valid_at(&token, self.clock.now()),
            Ok(None) => {
                debug!("Persisted token disappeared");
                false
            }
            Err(e) => {
                warn!(error = %e, "Failed to read persisted token during sweep");
                false
            }
        };

        if still_valid {
            return false;
        }
        info!("Session expired");
        self.reset(&mut inner);
        true
    }

    pub fn state(&self) -> SessionState {
        self.lock().state.clone()
    }

    pub fn authenticated(&self) -> bool {
        self.lock().state.is_authenticated()
    }

    pub fn identity(&self) -> Option<Identity> {
        self.lock().state.identity().cloned()
    }

    pub fn has_role(&self, required: Role) -> bool {
        self.lock().state.has_role(required)
    }

    /// The bearer token for outgoing requests, while authenticated.
    pub fn token(&self) -> Option<String> {
        self.lock().token.clone()
    }

    /// Receive a new snapshot on every login/logout transition.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.changes.subscribe()
    }
}

// ============================================================================
// Tests
// ============================================================================
