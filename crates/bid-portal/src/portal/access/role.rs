use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Access-level classification of an authenticated session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Bidder,
    Officer,
    Committee,
    Admin,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Bidder, Role::Officer, Role::Committee, Role::Admin];

    pub const fn label(self) -> &'static str {
        match self {
            Role::Bidder => "BIDDER",
            Role::Officer => "OFFICER",
            Role::Committee => "COMMITTEE",
            Role::Admin => "ADMIN",
        }
    }

    /// Dashboard section owned by this role.
    pub const fn slug(self) -> &'static str {
        match self {
            Role::Bidder => "bidder",
            Role::Officer => "officer",
            Role::Committee => "committee",
            Role::Admin => "admin",
        }
    }

    /// Default page a session with this role lands on.
    pub fn landing_page(self) -> String {
        format!("/dashboard/{}", self.slug())
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role '{0}'")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "BIDDER" => Ok(Role::Bidder),
            "OFFICER" => Ok(Role::Officer),
            "COMMITTEE" => Ok(Role::Committee),
            "ADMIN" => Ok(Role::Admin),
            _ => Err(UnknownRole(value.to_string())),
        }
    }
}
