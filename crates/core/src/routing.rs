//! Session gate in front of the dashboard destination.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::session::Session;

/// The three logical destinations of the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Route {
    Landing,
    Login,
    Dashboard,
}

impl Route {
    pub fn path(self) -> &'static str {
        match self {
            Route::Landing => "/",
            Route::Login => "/login",
            Route::Dashboard => "/dashboard",
        }
    }

    pub fn requires_session(self) -> bool {
        matches!(self, Route::Dashboard)
    }
}

/// Where a request for `requested` actually lands.
///
/// The dashboard without a session redirects to login; everything else is
/// reachable by anyone.
pub fn resolve(requested: Route, session: Option<&Session>) -> Route {
    if requested.requires_session() && session.is_none() {
        Route::Login
    } else {
        requested
    }
}

/// The session, or `Unauthorized` when there is none.
pub fn require_session(session: Option<&Session>) -> Result<&Session, CoreError> {
    session.ok_or_else(|| CoreError::Unauthorized("dashboard requires a session".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn demo() -> Session {
        Session {
            token: "demo_token_1".into(),
            email: "demo@arsafety.space".into(),
        }
    }

    #[test]
    fn dashboard_without_session_redirects_to_login() {
        assert_eq!(resolve(Route::Dashboard, None), Route::Login);
        assert_matches!(require_session(None), Err(CoreError::Unauthorized(_)));
    }

    #[test]
    fn dashboard_with_session_is_reachable() {
        let session = demo();
        assert_eq!(resolve(Route::Dashboard, Some(&session)), Route::Dashboard);
        assert_eq!(require_session(Some(&session)).map(|s| s.email.as_str()).ok(), Some("demo@arsafety.space"));
    }

    #[test]
    fn public_routes_are_always_reachable() {
        let session = demo();
        for route in [Route::Landing, Route::Login] {
            assert_eq!(resolve(route, None), route);
            assert_eq!(resolve(route, Some(&session)), route);
        }
    }

    #[test]
    fn paths() {
        assert_eq!(Route::Landing.path(), "/");
        assert_eq!(Route::Login.path(), "/login");
        assert_eq!(Route::Dashboard.path(), "/dashboard");
    }
}
