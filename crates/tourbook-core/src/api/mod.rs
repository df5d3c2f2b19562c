//! REST API client module for the tour-booking backend.
//!
//! This module provides the `ApiClient` for fetching tours, transporters
//! and orders and for creating detail tours. Requests carry the session's
//! bearer token; responses use the `{state, data, message}` envelope.

pub mod client;
pub mod envelope;
pub mod error;

pub use client::ApiClient;
pub use envelope::Envelope;
pub use error::ApiError;
