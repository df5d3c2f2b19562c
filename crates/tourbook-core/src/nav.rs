//! Navigation shell: which layout and menu the current session sees.
//!
//! Administrators get the dashboard sidebar; everybody else, logged in or
//! not, gets the customer navigation bar.

use serde::Serialize;

use crate::auth::{Role, SessionState};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavLink {
    pub path: &'static str,
    pub label: &'static str,
    /// Counter shown next to the label.
    pub badge: Option<usize>,
}

impl NavLink {
    fn new(path: &'static str, label: &'static str) -> Self {
        Self { path, label, badge: None }
    }

    /// True if `current` is this link's route.
    pub fn is_active(&self, current: &str) -> bool {
        let current = current.split(['?', '#']).next().unwrap_or(current);
        current == self.path || (current.len() > 1 && current.trim_end_matches('/') == self.path)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "layout", rename_all = "snake_case")]
pub enum NavShell {
    Admin {
        username: String,
        links: Vec<NavLink>,
    },
    Customer {
        /// `None` when logged out; the shell then offers login/register.
        username: Option<String>,
        links: Vec<NavLink>,
    },
}

impl NavShell {
    pub fn for_state(state: &SessionState, order_count: usize) -> Self {
        match state.identity() {
            Some(identity) if state.has_role(Role::Admin) => NavShell::Admin {
                username: identity.username.clone(),
                links: vec![
                    NavLink::new("/admin", "Tours Overview"),
                    NavLink::new("/admin/create-tour", "Create Detail Tour"),
                ],
            },
            identity => {
                let logged_in = identity.is_some();
                let mut orders = NavLink::new("/order", "Orders");
                if logged_in && order_count > 0 {
                    orders.badge = Some(order_count);
                }
                NavShell::Customer {
                    username: identity.map(|i| i.username.clone()),
                    links: vec![
                        NavLink::new("/", "Home"),
                        NavLink::new("/visit", "Tours"),
                        orders,
                        NavLink::new("/about", "About"),
                    ],
                }
            }
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, NavShell::Admin { .. })
    }

    pub fn links(&self) -> &[NavLink] {
        match self {
            NavShell::Admin { links, .. } | NavShell::Customer { links, .. } => links,
        }
    }

    /// Title for the admin top bar, by current route.
    pub fn admin_title(path: &str) -> &'static str {
        if path.trim_end_matches('/') == "/admin" {
            "Tours Overview"
        } else {
            "Create New Tour"
        }
    }

    /// Account actions offered beside the menu.
    pub fn account_links(&self) -> Vec<NavLink> {
        match self {
            NavShell::Admin { .. } | NavShell::Customer { username: Some(_), .. } => {
                vec![NavLink::new("/login", "Logout")]
            }
            NavShell::Customer { username: None, .. } => vec![
                NavLink::new("/login", "Login"),
                NavLink::new("/register", "Register"),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Identity;

    fn state(role: Role) -> SessionState {
        SessionState::authenticated_as(Identity { username: "alice".into(), role })
    }

    #[test]
    fn test_admin_layout() {
        let shell = NavShell::for_state(&state(Role::Admin), 5);
        assert!(shell.is_admin());
        let paths: Vec<_> = shell.links().iter().map(|l| l.path).collect();
        assert_eq!(paths, ["/admin", "/admin/create-tour"]);
        assert_eq!(shell.account_links()[0].label, "Logout");
    }

    #[test]
    fn test_customer_layout_with_badge() {
        let shell = NavShell::for_state(&state(Role::Customer), 3);
        assert!(!shell.is_admin());
        let orders = shell.links().iter().find(|l| l.path == "/order").unwrap();
        assert_eq!(orders.badge, Some(3));
        assert!(matches!(shell, NavShell::Customer { username: Some(ref u), .. } if u == "alice"));
    }

    #[test]
    fn test_logged_out_layout() {
        let shell = NavShell::for_state(&SessionState::logged_out(), 3);
        assert!(shell.links().iter().all(|l| l.badge.is_none()));
        let labels: Vec<_> = shell.account_links().iter().map(|l| l.label).collect();
        assert_eq!(labels, ["Login", "Register"]);
    }

    #[test]
    fn test_zero_orders_has_no_badge() {
        let shell = NavShell::for_state(&state(Role::Customer), 0);
        assert!(shell.links().iter().all(|l| l.badge.is_none()));
    }

    #[test]
    fn test_active_link() {
        let link = NavLink::new("/admin", "Tours Overview");
        assert!(link.is_active("/admin"));
        assert!(link.is_active("/admin/"));
        assert!(!link.is_active("/admin/create-tour"));
        assert!(NavLink::new("/", "Home").is_active("/?q=1"));
        assert_eq!(NavShell::admin_title("/admin/create-tour"), "Create New Tour");
    }
}
