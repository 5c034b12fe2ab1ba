//! Session handling and the route guard deciding what a visitor may see.

pub mod auth;
pub mod gate;
pub mod role;
pub mod routes;
pub mod session;

pub use auth::{Credential, SessionService};
pub use gate::{
    authorize, login_location, AccessGate, Decision, GateOutcome, GateState, LOGIN_PATH,
};
pub use role::{Role, UnknownRole};
pub use routes::{RouteAccess, RoutePattern, RouteTable};
pub use session::{Session, SessionError, SessionResolver, SessionToken};
