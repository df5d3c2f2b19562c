use thiserror::Error;

use crate::models::ValidationError;

/// Longest slice of a response body kept in an error message
const BODY_EXCERPT_LEN: usize = 500;

#[derive(Error, Debug)]
pub enum ApiError {
    /// 401: the backend no longer accepts the session token.
    #[error("Session token rejected by the server")]
    Unauthorized,

    /// 403: the token is fine but does not grant this action.
    #[error("Not permitted: {0}")]
    Forbidden(String),

    #[error("Too many requests, gave up after retrying")]
    RateLimited,

    #[error("Server answered {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Could not reach the server: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Unexpected response: {0}")]
    InvalidResponse(String),

    /// The envelope came back with `state: false`.
    #[error("Request rejected: {0}")]
    Rejected(String),

    #[error("Invalid request: {0}")]
    Validation(#[from] ValidationError),
}

fn excerpt(body: &str) -> String {
    if body.len() <= BODY_EXCERPT_LEN {
        return body.to_string();
    }
    let end = (0..=BODY_EXCERPT_LEN)
        .rev()
        .find(|&i| body.is_char_boundary(i))
        .unwrap_or(0);
    format!("{}... ({} bytes)", &body[..end], body.len())
}

impl ApiError {
    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        match status.as_u16() {
            401 => ApiError::Unauthorized,
            403 => ApiError::Forbidden(excerpt(body)),
            429 => ApiError::RateLimited,
            code => ApiError::Status {
                status: code,
                body: excerpt(body),
            },
        }
    }

    /// Only a rejected token ends the session; a 403 leaves it in place.
    pub fn requires_login(&self) -> bool {
        matches!(self, ApiError::Unauthorized)
    }
}
