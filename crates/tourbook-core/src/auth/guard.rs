//! Route guard consulted by navigation before entering protected views.
//!
//! The guard only decides; redirecting is up to the caller.

use std::sync::Arc;

use serde::Serialize;

use super::session::SessionStore;
use super::token::Role;

/// Path of the login entry point that denied navigation should go to.
pub const LOGIN_PATH: &str = "/login";

/// Path to fall back to when the user is logged in but lacks the role.
pub const HOME_PATH: &str = "/";

/// Routes that need more than an anonymous visitor.
const PROTECTED_ROUTES: &[(&str, Requirement)] = &[
    ("/order", Requirement::Authenticated),
    ("/admin", Requirement::Role(Role::Admin)),
    ("/admin/create-tour", Requirement::Role(Role::Admin)),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    Authenticated,
    Role(Role),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Access {
    Allow,
    /// Not logged in.
    RedirectToLogin,
    /// Logged in with the wrong role.
    Forbidden,
}

impl Access {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Access::Allow)
    }

    /// Where the navigation layer should send the user instead, if anywhere.
    pub fn redirect_path(&self) -> Option<&'static str> {
        match self {
            Access::Allow => None,
            Access::RedirectToLogin => Some(LOGIN_PATH),
            Access::Forbidden => Some(HOME_PATH),
        }
    }
}

/// Requirement for `path`, or `None` for public routes.
pub fn requirement_for(path: &str) -> Option<Requirement> {
    let path = path.split(['?', '#']).next().unwrap_or(path);
    let path = if path.len() > 1 { path.trim_end_matches('/') } else { path };
    PROTECTED_ROUTES
        .iter()
        .find(|(route, _)| *route == path)
        .map(|(_, requirement)| *requirement)
}

#[derive(Clone)]
pub struct RouteGuard {
    session: Arc<SessionStore>,
}

impl RouteGuard {
    pub fn new(session: Arc<SessionStore>) -> Self {
        Self { session }
    }

    pub fn can_enter(&self) -> bool {
        self.session.authenticated()
    }

    pub fn has_role(&self, required: Role) -> bool {
        self.session.has_role(required)
    }

    pub fn check(&self, requirement: Requirement) -> Access {
        let state = self.session.state();
        if !state.is_authenticated() {
            return Access::RedirectToLogin;
        }
        match requirement {
            Requirement::Authenticated => Access::Allow,
            Requirement::Role(role) if state.has_role(role) => Access::Allow,
            Requirement::Role(_) => Access::Forbidden,
        }
    }

    /// Decide navigation to `path` using the protected route table.
    pub fn check_path(&self, path: &str) -> Access {
        match requirement_for(path) {
            Some(requirement) => self.check(requirement),
            None => Access::Allow,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
