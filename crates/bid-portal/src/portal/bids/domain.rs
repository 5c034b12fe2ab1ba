use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::portal::repository::Entity;
use crate::portal::users::UserId;

/// Identifier wrapper for published procurement opportunities.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BidId(pub String);

impl fmt::Display for BidId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BidStatus {
    Open,
    Closed,
}

impl BidStatus {
    pub const fn label(self) -> &'static str {
        match self {
            BidStatus::Open => "open",
            BidStatus::Closed => "closed",
        }
    }
}

/// A published procurement opportunity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bid {
    pub id: BidId,
    pub title: String,
    pub category: String,
    pub budget: u64,
    pub deadline: DateTime<Utc>,
    pub description: String,
    pub status: BidStatus,
    pub created_at: DateTime<Utc>,
    pub created_by: UserId,
    /// Number of proposals received so far.
    pub proposals: u32,
}

impl Bid {
    pub fn accepts_proposals(&self, now: DateTime<Utc>) -> bool {
        self.status == BidStatus::Open && self.deadline > now
    }
}

impl Entity for Bid {
    type Id = BidId;

    fn id(&self) -> &BidId {
        &self.id
    }
}

/// Officer-provided fields for a new bid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBid {
    pub title: String,
    pub category: String,
    pub budget: u64,
    pub deadline: DateTime<Utc>,
    #[serde(default)]
    pub description: String,
}
