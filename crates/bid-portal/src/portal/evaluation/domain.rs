use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::criteria::{CriterionError, CriterionId, EvaluationCriterion};
use crate::portal::proposals::ProposalId;
use crate::portal::repository::Entity;
use crate::portal::users::UserId;

/// Identifier wrapper for committee evaluations.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EvaluationId(pub String);

impl fmt::Display for EvaluationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EvaluationStatus {
    Draft,
    /// Terminal: scores can no longer change.
    Submitted,
}

impl EvaluationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            EvaluationStatus::Draft => "draft",
            EvaluationStatus::Submitted => "submitted",
        }
    }
}

/// A committee member's scored review of a proposal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub id: EvaluationId,
    pub proposal_id: ProposalId,
    pub committee_id: UserId,
    pub score: f64,
    pub comments: String,
    pub criteria: Vec<EvaluationCriterion>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    pub status: EvaluationStatus,
}

impl Evaluation {
    pub fn is_submitted(&self) -> bool {
        self.status == EvaluationStatus::Submitted
    }

    pub(crate) fn criterion_mut(
        &mut self,
        id: &CriterionId,
    ) -> Result<&mut EvaluationCriterion, CriterionError> {
        self.criteria
            .iter_mut()
            .find(|criterion| &criterion.id == id)
            .ok_or_else(|| CriterionError::UnknownCriterion(id.clone()))
    }
}

impl Entity for Evaluation {
    type Id = EvaluationId;

    fn id(&self) -> &EvaluationId {
        &self.id
    }
}

/// Editable state a committee member saves; `id` is absent for a new draft.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationDraft {
    #[serde(default)]
    pub id: Option<EvaluationId>,
    pub proposal_id: ProposalId,
    #[serde(default)]
    pub comments: String,
    pub criteria: Vec<EvaluationCriterion>,
}
