//! tourbook-core - client-side session core for the tour-booking service.
//!
//! - `auth`: token codec, token storage, session store, expiry sweep, route guard
//! - `nav`: admin/customer navigation shell
//! - `api`: REST client for tours, transporters and orders
//! - `models`: backend data types
//! - `config`: application configuration

pub mod api;
pub mod auth;
pub mod config;
pub mod models;
pub mod nav;

pub use api::{ApiClient, ApiError};
pub use auth::{
    Access, Claims, Identity, Requirement, Role, RouteGuard, SessionError, SessionState,
    SessionStore, SweepHandle,
};
pub use config::{Config, TokenBackend};
pub use nav::{NavLink, NavShell};
