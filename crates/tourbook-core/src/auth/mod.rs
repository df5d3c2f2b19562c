//! Authentication module for the client-side session.
//!
//! This module provides:
//! - `token`: decode-only bearer token codec
//! - `TokenStorage`: the single persisted token slot (file, keyring, memory)
//! - `SessionStore`: login/logout state machine with an expiry sweep
//! - `RouteGuard`: navigation predicates over the session

pub mod guard;
pub mod session;
pub mod storage;
pub mod sweep;
pub mod token;

pub use guard::{Access, Requirement, RouteGuard};
pub use session::{Clock, SessionError, SessionState, SessionStore, SystemClock};
pub use storage::{FileTokenStorage, KeyringTokenStorage, MemoryTokenStorage, StorageError, TokenStorage};
pub use sweep::{SweepHandle, DEFAULT_SWEEP_INTERVAL};
pub use token::{Claims, DecodeError, Identity, Role};
