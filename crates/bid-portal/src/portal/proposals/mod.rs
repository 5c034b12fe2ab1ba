pub mod domain;
pub mod service;

pub use domain::{Proposal, ProposalId, ProposalStatus, ProposalSubmission};
pub use service::{ProposalService, ProposalServiceError};
