use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use super::domain::{Bid, BidId, BidStatus, NewBid};
use crate::portal::repository::{Repository, RepositoryError};
use crate::portal::users::UserId;

/// Publishing and closing of procurement opportunities.
pub struct BidService<R> {
    repository: Arc<R>,
    sequence: AtomicU64,
}

impl<R> BidService<R>
where
    R: Repository<Bid> + 'static,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self {
            repository,
            sequence: AtomicU64::new(1),
        }
    }

    /// Newest bids first; `open_only` hides closed opportunities.
    pub fn list(&self, open_only: bool) -> Result<Vec<Bid>, BidServiceError> {
        let mut bids: Vec<Bid> = self
            .repository
            .list()?
            .into_iter()
            .filter(|bid| !open_only || bid.status == BidStatus::Open)
            .collect();
        bids.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(bids)
    }

    pub fn get(&self, id: &BidId) -> Result<Bid, BidServiceError> {
        self.repository
            .get_by_id(id)?
            .ok_or(BidServiceError::Repository(RepositoryError::NotFound))
    }

    pub fn create(&self, officer: &UserId, payload: NewBid) -> Result<Bid, BidServiceError> {
        let now = Utc::now();
        let title = required("title", &payload.title)?;
        let category = required("category", &payload.category)?;
        if payload.budget == 0 {
            return Err(BidServiceError::InvalidBudget);
        }
        if payload.deadline <= now {
            return Err(BidServiceError::DeadlineInPast);
        }

        let bid = Bid {
            id: self.next_id(),
            title,
            category,
            budget: payload.budget,
            deadline: payload.deadline,
            description: payload.description.trim().to_string(),
            status: BidStatus::Open,
            created_at: now,
            created_by: officer.clone(),
            proposals: 0,
        };

        let stored = self.repository.create(bid)?;
        info!(bid_id = %stored.id, officer = %officer, "bid published");
        Ok(stored)
    }

    pub fn close(&self, id: &BidId) -> Result<Bid, BidServiceError> {
        let stored = self.repository.modify(id, |bid| {
            if bid.status == BidStatus::Closed {
                return Err(BidServiceError::AlreadyClosed(bid.id.clone()));
            }
            bid.status = BidStatus::Closed;
            Ok(())
        })?;
        info!(bid_id = %stored.id, "bid closed");
        Ok(stored)
    }

    fn next_id(&self) -> BidId {
        let id = self.sequence.fetch_add(1, Ordering::Relaxed);
        BidId(format!("bid-{id:06}"))
    }
}

fn required(field: &'static str, value: &str) -> Result<String, BidServiceError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(BidServiceError::MissingField(field));
    }
    Ok(trimmed.to_string())
}

/// Error raised by the bid service.
#[derive(Debug, thiserror::Error)]
pub enum BidServiceError {
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("budget must be greater than zero")]
    InvalidBudget,
    #[error("deadline must be in the future")]
    DeadlineInPast,
    #[error("bid {0} is already closed")]
    AlreadyClosed(BidId),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
