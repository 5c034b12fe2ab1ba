use std::fmt;

use serde::{Deserialize, Serialize};

use super::role::Role;
use crate::portal::users::{User, UserId};

/// Authenticated identity; absence of a session means anonymous.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: UserId,
    pub email: String,
    pub name: String,
    pub role: Role,
}

impl From<&User> for Session {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            email: user.email.clone(),
            name: user.name.clone(),
            role: user.role,
        }
    }
}

/// Opaque handle a client presents to look up its session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionToken(pub String);

impl SessionToken {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Source of session state consumed by the access gate.
pub trait SessionResolver: Send + Sync {
    fn resolve(&self, token: &SessionToken) -> Result<Option<Session>, SessionError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("session not found")]
    UnknownSession,
    #[error("role switching is disabled")]
    RoleSwitchingDisabled,
    #[error("stored session is corrupted: {0}")]
    Corrupted(String),
    #[error("session store unavailable: {0}")]
    Unavailable(String),
}
