use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use super::criteria::{CriterionError, CriterionId, EvaluationCriterion};
use super::domain::{Evaluation, EvaluationDraft, EvaluationId, EvaluationStatus};
use super::scorer::{overall_score, ScoreError};
use crate::portal::inflight::{InFlightError, InFlightRegistry};
use crate::portal::proposals::{Proposal, ProposalId};
use crate::portal::repository::{Repository, RepositoryError};
use crate::portal::users::UserId;

/// Committee workflow: draft, rescore and submit evaluations.
pub struct EvaluationService<E, P> {
    evaluations: Arc<E>,
    proposals: Arc<P>,
    in_flight: InFlightRegistry,
    sequence: AtomicU64,
}

impl<E, P> EvaluationService<E, P>
where
    E: Repository<Evaluation> + 'static,
    P: Repository<Proposal> + 'static,
{
    pub fn new(evaluations: Arc<E>, proposals: Arc<P>) -> Self {
        Self {
            evaluations,
            proposals,
            in_flight: InFlightRegistry::default(),
            sequence: AtomicU64::new(1),
        }
    }

    pub fn in_flight(&self) -> &InFlightRegistry {
        &self.in_flight
    }

    /// Create or update a draft, recomputing its overall score.
    ///
    /// Without an id, the committee member's existing evaluation of the same
    /// proposal is reused so repeated saves never fork a second draft.
    pub fn save_draft(
        &self,
        committee: &UserId,
        draft: EvaluationDraft,
    ) -> Result<Evaluation, EvaluationServiceError> {
        let _ticket = self
            .in_flight
            .begin(format!("save-evaluation:{}:{}", committee, draft.proposal_id))?;

        if self.proposals.get_by_id(&draft.proposal_id)?.is_none() {
            return Err(EvaluationServiceError::UnknownProposal(draft.proposal_id));
        }

        let criteria = normalize_criteria(draft.criteria)?;
        let score = overall_score(&criteria)?;

        let existing = match &draft.id {
            Some(id) => Some(self.get_owned(committee, id)?.id),
            None => self
                .for_committee(committee)?
                .into_iter()
                .find(|evaluation| evaluation.proposal_id == draft.proposal_id)
                .map(|evaluation| evaluation.id),
        };

        let Some(id) = existing else {
            let evaluation = Evaluation {
                id: self.next_id(),
                proposal_id: draft.proposal_id,
                committee_id: committee.clone(),
                score,
                comments: draft.comments,
                criteria,
                completed_at: None,
                status: EvaluationStatus::Draft,
            };

            let stored = self.evaluations.create(evaluation)?;
            info!(evaluation_id = %stored.id, score = stored.score, "evaluation draft created");
            return Ok(stored);
        };

        let _edit = self.in_flight.begin(edit_action(&id))?;
        let proposal_id = draft.proposal_id;
        let comments = draft.comments;
        let stored = self
            .evaluations
            .modify(&id, |evaluation| -> Result<(), EvaluationServiceError> {
                ensure_owner(committee, evaluation)?;
                if evaluation.is_submitted() {
                    return Err(EvaluationServiceError::Immutable(evaluation.id.clone()));
                }
                if evaluation.proposal_id != proposal_id {
                    return Err(EvaluationServiceError::ProposalMismatch(evaluation.id.clone()));
                }
                evaluation.comments = comments;
                evaluation.criteria = criteria;
                evaluation.score = score;
                Ok(())
            })?;
        info!(evaluation_id = %stored.id, score = stored.score, "evaluation draft updated");
        Ok(stored)
    }

    /// Rescore a single criterion of a draft. Out-of-range scores are clamped.
    pub fn set_criterion_score(
        &self,
        committee: &UserId,
        id: &EvaluationId,
        criterion: &CriterionId,
        score: f64,
    ) -> Result<Evaluation, EvaluationServiceError> {
        let _ticket = self.in_flight.begin(edit_action(id))?;

        let mut stored_score = score;
        let stored = self
            .evaluations
            .modify(id, |evaluation| -> Result<(), EvaluationServiceError> {
                ensure_owner(committee, evaluation)?;
                if evaluation.is_submitted() {
                    return Err(EvaluationServiceError::Immutable(evaluation.id.clone()));
                }
                stored_score = evaluation.criterion_mut(criterion)?.set_score(score)?;
                evaluation.score = overall_score(&evaluation.criteria)?;
                Ok(())
            })?;

        if stored_score != score {
            warn!(
                evaluation_id = %id,
                criterion = %criterion,
                requested = score,
                stored = stored_score,
                "criterion score clamped"
            );
        }
        Ok(stored)
    }

    /// Finalise an evaluation. Submitting twice is rejected.
    pub fn submit(
        &self,
        committee: &UserId,
        id: &EvaluationId,
    ) -> Result<Evaluation, EvaluationServiceError> {
        let _ticket = self.in_flight.begin(edit_action(id))?;

        let stored = self
            .evaluations
            .modify(id, |evaluation| -> Result<(), EvaluationServiceError> {
                ensure_owner(committee, evaluation)?;
                if evaluation.is_submitted() {
                    return Err(EvaluationServiceError::AlreadySubmitted(evaluation.id.clone()));
                }
                evaluation.score = overall_score(&evaluation.criteria)?;
                evaluation.status = EvaluationStatus::Submitted;
                evaluation.completed_at = Some(Utc::now());
                Ok(())
            })?;
        info!(
            evaluation_id = %stored.id,
            proposal_id = %stored.proposal_id,
            score = stored.score,
            "evaluation submitted"
        );
        Ok(stored)
    }

    pub fn get(&self, id: &EvaluationId) -> Result<Evaluation, EvaluationServiceError> {
        self.evaluations
            .get_by_id(id)?
            .ok_or(EvaluationServiceError::Repository(RepositoryError::NotFound))
    }

    pub fn for_proposal(
        &self,
        proposal: &ProposalId,
    ) -> Result<Vec<Evaluation>, EvaluationServiceError> {
        Ok(self
            .evaluations
            .list()?
            .into_iter()
            .filter(|evaluation| &evaluation.proposal_id == proposal)
            .collect())
    }

    pub fn for_committee(
        &self,
        committee: &UserId,
    ) -> Result<Vec<Evaluation>, EvaluationServiceError> {
        Ok(self
            .evaluations
            .list()?
            .into_iter()
            .filter(|evaluation| &evaluation.committee_id == committee)
            .collect())
    }

    /// Another member's evaluation is reported as missing rather than forbidden.
    pub fn get_owned(
        &self,
        committee: &UserId,
        id: &EvaluationId,
    ) -> Result<Evaluation, EvaluationServiceError> {
        let evaluation = self.get(id)?;
        ensure_owner(committee, &evaluation)?;
        Ok(evaluation)
    }

    fn next_id(&self) -> EvaluationId {
        let id = self.sequence.fetch_add(1, Ordering::Relaxed);
        EvaluationId(format!("eval-{id:06}"))
    }
}

/// In-flight key shared by every mutation of one evaluation.
fn edit_action(id: &EvaluationId) -> String {
    format!("edit-evaluation:{id}")
}

fn ensure_owner(
    committee: &UserId,
    evaluation: &Evaluation,
) -> Result<(), EvaluationServiceError> {
    if &evaluation.committee_id != committee {
        return Err(EvaluationServiceError::Repository(RepositoryError::NotFound));
    }
    Ok(())
}

/// Clamp scores, fill in missing criterion ids, then validate each criterion.
fn normalize_criteria(
    criteria: Vec<EvaluationCriterion>,
) -> Result<Vec<EvaluationCriterion>, CriterionError> {
    criteria
        .into_iter()
        .map(|mut criterion| {
            if criterion.id.0.trim().is_empty() {
                criterion.id = CriterionId(uuid::Uuid::new_v4().to_string());
            }
            let requested = criterion.score;
            criterion.set_score(requested)?;
            criterion.validate()?;
            Ok(criterion)
        })
        .collect()
}

/// Error raised by the evaluation workflow.
#[derive(Debug, thiserror::Error)]
pub enum EvaluationServiceError {
    #[error(transparent)]
    Criterion(#[from] CriterionError),
    #[error(transparent)]
    Score(#[from] ScoreError),
    #[error("proposal {0} does not exist")]
    UnknownProposal(ProposalId),
    #[error("evaluation {0} belongs to a different proposal")]
    ProposalMismatch(EvaluationId),
    #[error("evaluation {0} has already been submitted")]
    AlreadySubmitted(EvaluationId),
    #[error("evaluation {0} is submitted and can no longer be edited")]
    Immutable(EvaluationId),
    #[error(transparent)]
    InFlight(#[from] InFlightError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
