use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use super::domain::{Proposal, ProposalId, ProposalStatus, ProposalSubmission};
use crate::portal::bids::{Bid, BidId, BidStatus};
use crate::portal::inflight::{InFlightError, InFlightRegistry};
use crate::portal::repository::{Repository, RepositoryError};
use crate::portal::users::UserId;

const MIN_COVER_LETTER_CHARS: usize = 50;

/// Proposal intake against published bids.
pub struct ProposalService<P, B> {
    proposals: Arc<P>,
    bids: Arc<B>,
    in_flight: InFlightRegistry,
    sequence: AtomicU64,
}

impl<P, B> ProposalService<P, B>
where
    P: Repository<Proposal> + 'static,
    B: Repository<Bid> + 'static,
{
    pub fn new(proposals: Arc<P>, bids: Arc<B>) -> Self {
        Self {
            proposals,
            bids,
            in_flight: InFlightRegistry::default(),
            sequence: AtomicU64::new(1),
        }
    }

    pub fn in_flight(&self) -> &InFlightRegistry {
        &self.in_flight
    }

    /// Submit a proposal; the bid's proposal counter is bumped on success.
    pub fn submit(
        &self,
        bidder: &UserId,
        submission: ProposalSubmission,
    ) -> Result<Proposal, ProposalServiceError> {
        let _ticket = self
            .in_flight
            .begin(format!("submit-proposal:{}:{}", bidder, submission.bid_id))?;

        let cover_letter = submission.cover_letter.trim().to_string();
        if cover_letter.chars().count() < MIN_COVER_LETTER_CHARS {
            return Err(ProposalServiceError::CoverLetterTooShort);
        }
        if submission.proposed_budget == 0 {
            return Err(ProposalServiceError::InvalidBudget);
        }
        if submission.completion_days == 0 {
            return Err(ProposalServiceError::InvalidCompletionDays);
        }
        let files = validate_documents(submission.files)?;

        // Open/deadline check and counter bump are a single store write.
        let now = Utc::now();
        let bid = self
            .bids
            .modify(&submission.bid_id, |bid| {
                if bid.status == BidStatus::Closed {
                    return Err(ProposalServiceError::BidClosed(bid.id.clone()));
                }
                if !bid.accepts_proposals(now) {
                    return Err(ProposalServiceError::DeadlinePassed(bid.id.clone()));
                }
                bid.proposals = bid.proposals.saturating_add(1);
                Ok(())
            })
            .map_err(|err| match err {
                ProposalServiceError::Repository(RepositoryError::NotFound) => {
                    ProposalServiceError::UnknownBid(submission.bid_id.clone())
                }
                other => other,
            })?;

        let proposal = Proposal {
            id: self.next_id(),
            bid_id: bid.id.clone(),
            bidder_id: bidder.clone(),
            files,
            cover_letter,
            proposed_budget: submission.proposed_budget,
            completion_days: submission.completion_days,
            score: None,
            status: ProposalStatus::Pending,
            submitted_at: now,
            feedback: None,
        };

        let stored = match self.proposals.create(proposal) {
            Ok(stored) => stored,
            Err(err) => {
                self.release_slot(&bid.id);
                return Err(err.into());
            }
        };
        info!(proposal_id = %stored.id, bid_id = %stored.bid_id, "proposal submitted");

        Ok(stored)
    }

    pub fn get(&self, id: &ProposalId) -> Result<Proposal, ProposalServiceError> {
        self.proposals
            .get_by_id(id)?
            .ok_or(ProposalServiceError::Repository(RepositoryError::NotFound))
    }

    pub fn for_bidder(&self, bidder: &UserId) -> Result<Vec<Proposal>, ProposalServiceError> {
        Ok(self
            .proposals
            .list()?
            .into_iter()
            .filter(|proposal| &proposal.bidder_id == bidder)
            .collect())
    }

    pub fn for_bid(&self, bid: &BidId) -> Result<Vec<Proposal>, ProposalServiceError> {
        Ok(self
            .proposals
            .list()?
            .into_iter()
            .filter(|proposal| &proposal.bid_id == bid)
            .collect())
    }

    /// Undo the counter bump of a submission whose proposal was not stored.
    fn release_slot(&self, bid: &BidId) {
        let released = self.bids.modify(bid, |bid| {
            bid.proposals = bid.proposals.saturating_sub(1);
            Ok::<_, RepositoryError>(())
        });
        if let Err(err) = released {
            warn!(bid_id = %bid, error = %err, "proposal counter not released");
        }
    }

    fn next_id(&self) -> ProposalId {
        let id = self.sequence.fetch_add(1, Ordering::Relaxed);
        ProposalId(format!("prop-{id:06}"))
    }
}

/// Proposal documents must be named PDF files.
fn validate_documents(files: Vec<String>) -> Result<Vec<String>, ProposalServiceError> {
    let files: Vec<String> = files
        .into_iter()
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .collect();
    if files.is_empty() {
        return Err(ProposalServiceError::MissingDocuments);
    }

    for name in &files {
        let is_pdf = mime_guess::from_path(name)
            .iter()
            .any(|guess| guess == mime::APPLICATION_PDF);
        if !is_pdf {
            return Err(ProposalServiceError::UnsupportedDocument(name.clone()));
        }
    }

    Ok(files)
}

/// Error raised by the proposal service.
#[derive(Debug, thiserror::Error)]
pub enum ProposalServiceError {
    #[error("cover letter must be at least 50 characters")]
    CoverLetterTooShort,
    #[error("proposed budget must be a positive number")]
    InvalidBudget,
    #[error("completion days must be a positive integer")]
    InvalidCompletionDays,
    #[error("at least one proposal document is required")]
    MissingDocuments,
    #[error("'{0}' is not a PDF document")]
    UnsupportedDocument(String),
    #[error("bid {0} does not exist")]
    UnknownBid(BidId),
    #[error("bid {0} is closed")]
    BidClosed(BidId),
    #[error("the deadline for bid {0} has passed")]
    DeadlinePassed(BidId),
    #[error(transparent)]
    InFlight(#[from] InFlightError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
