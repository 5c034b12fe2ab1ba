use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::portal::bids::BidId;
use crate::portal::repository::Entity;
use crate::portal::users::UserId;

/// Identifier wrapper for bidder submissions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProposalId(pub String);

impl fmt::Display for ProposalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProposalStatus {
    Pending,
    Approved,
    Rejected,
}

impl ProposalStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ProposalStatus::Pending => "pending",
            ProposalStatus::Approved => "approved",
            ProposalStatus::Rejected => "rejected",
        }
    }
}

/// A bidder's submission against a published bid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Proposal {
    pub id: ProposalId,
    pub bid_id: BidId,
    pub bidder_id: UserId,
    /// Document names; file contents are not stored.
    pub files: Vec<String>,
    pub cover_letter: String,
    pub proposed_budget: u64,
    pub completion_days: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    pub status: ProposalStatus,
    pub submitted_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
}

impl Entity for Proposal {
    type Id = ProposalId;

    fn id(&self) -> &ProposalId {
        &self.id
    }
}

/// Form payload a bidder submits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalSubmission {
    pub bid_id: BidId,
    pub cover_letter: String,
    pub proposed_budget: u64,
    pub completion_days: u32,
    pub files: Vec<String>,
}
