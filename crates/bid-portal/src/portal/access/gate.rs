use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use super::role::Role;
use super::routes::{RouteAccess, RouteTable};
use super::session::{Session, SessionError, SessionResolver, SessionToken};

/// Entry point anonymous visitors are sent to.
pub const LOGIN_PATH: &str = "/auth/login";

/// Navigation verdict for a requested route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum Decision {
    Render,
    /// `return_to` is the originally requested location, replayed after login.
    RedirectLogin { return_to: String },
    /// Role mismatch; sent to the role's landing page without any error.
    RedirectHome { location: String },
}

impl Decision {
    /// Target for an HTTP redirect, if the decision navigates away.
    pub fn location(&self) -> Option<String> {
        match self {
            Decision::Render => None,
            Decision::RedirectLogin { return_to } => Some(login_location(return_to)),
            Decision::RedirectHome { location } => Some(location.clone()),
        }
    }
}

pub fn login_location(return_to: &str) -> String {
    let encoded: String = url::form_urlencoded::byte_serialize(return_to.as_bytes()).collect();
    format!("{LOGIN_PATH}?redirect={encoded}")
}

/// Decide whether `route` may render for `session`.
///
/// Pure in its inputs: the session is never modified.
pub fn authorize(session: Option<&Session>, route: &str, allowed_roles: &[Role]) -> Decision {
    match session {
        None => Decision::RedirectLogin {
            return_to: route.to_string(),
        },
        Some(session) if permits(allowed_roles, session.role) => Decision::Render,
        Some(session) => Decision::RedirectHome {
            location: session.role.landing_page(),
        },
    }
}

fn permits(allowed_roles: &[Role], role: Role) -> bool {
    allowed_roles.is_empty() || allowed_roles.contains(&role)
}

/// Lifecycle of a guarded view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateState {
    Loading,
    Anonymous,
    Authorized(Session),
    Forbidden(Session),
}

/// What the shell shows for a gate state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateOutcome {
    /// Neutral placeholder while the session is still resolving.
    Placeholder,
    Navigate(Decision),
}

impl GateState {
    pub fn mount() -> Self {
        GateState::Loading
    }

    /// Complete session resolution. Only a `Loading` gate transitions.
    ///
    /// A failed lookup counts as anonymous so a corrupt session falls through
    /// to the login screen.
    pub fn resolve(
        self,
        lookup: Result<Option<Session>, SessionError>,
        allowed_roles: &[Role],
    ) -> Self {
        if self != GateState::Loading {
            return self;
        }

        match lookup {
            Ok(None) => GateState::Anonymous,
            Ok(Some(session)) if permits(allowed_roles, session.role) => {
                GateState::Authorized(session)
            }
            Ok(Some(session)) => GateState::Forbidden(session),
            Err(err) => {
                warn!(error = %err, "session resolution failed; treating visitor as anonymous");
                GateState::Anonymous
            }
        }
    }

    pub fn outcome(&self, route: &str) -> GateOutcome {
        match self {
            GateState::Loading => GateOutcome::Placeholder,
            GateState::Anonymous => GateOutcome::Navigate(Decision::RedirectLogin {
                return_to: route.to_string(),
            }),
            GateState::Authorized(_) => GateOutcome::Navigate(Decision::Render),
            GateState::Forbidden(session) => GateOutcome::Navigate(Decision::RedirectHome {
                location: session.role.landing_page(),
            }),
        }
    }

    pub fn session(&self) -> Option<&Session> {
        match self {
            GateState::Authorized(session) | GateState::Forbidden(session) => Some(session),
            GateState::Loading | GateState::Anonymous => None,
        }
    }
}

/// Route guard combining a session source with the portal route table.
pub struct AccessGate<S> {
    resolver: Arc<S>,
    routes: RouteTable,
}

impl<S> AccessGate<S>
where
    S: SessionResolver + 'static,
{
    pub fn new(resolver: Arc<S>, routes: RouteTable) -> Self {
        Self { resolver, routes }
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// Evaluate a shell path against the route table.
    pub fn navigate(&self, token: Option<&SessionToken>, path: &str) -> Decision {
        match self.routes.lookup(path) {
            RouteAccess::Public => Decision::Render,
            RouteAccess::Protected(roles) => self.guard(token, path, &roles).0,
        }
    }

    /// Run the gate for an explicit role set, returning the resolved session
    /// alongside the decision so callers can act on the caller's identity.
    pub fn guard(
        &self,
        token: Option<&SessionToken>,
        route: &str,
        allowed_roles: &[Role],
    ) -> (Decision, Option<Session>) {
        let lookup = match token {
            Some(token) => self.resolver.resolve(token),
            None => Ok(None),
        };

        let state = GateState::mount().resolve(lookup, allowed_roles);
        let decision = match state.outcome(route) {
            GateOutcome::Navigate(decision) => decision,
            GateOutcome::Placeholder => Decision::RedirectLogin {
                return_to: route.to_string(),
            },
        };
        debug!(route, ?decision, "access gate evaluated");

        let session = match state {
            GateState::Authorized(session) => Some(session),
            _ => None,
        };
        (decision, session)
    }

    /// Where to send a user right after login.
    ///
    /// The remembered location is honoured only when it is a local path the
    /// new session may render; otherwise the role landing page is used.
    pub fn login_destination(&self, session: &Session, return_to: Option<&str>) -> String {
        let fallback = session.role.landing_page();
        let Some(path) = return_to.filter(|path| is_local_path(path)) else {
            return fallback;
        };

        let allowed = match self.routes.lookup(path) {
            RouteAccess::Public => true,
            RouteAccess::Protected(roles) => permits(&roles, session.role),
        };
        if allowed {
            path.to_string()
        } else {
            fallback
        }
    }
}

fn is_local_path(path: &str) -> bool {
    path.starts_with('/') && !path.starts_with("//") && !path.contains('\\')
}
