use std::sync::Arc;
use std::time::Duration;

use super::access::{AccessGate, Credential, RouteTable, SessionService};
use super::bids::{Bid, BidService};
use super::evaluation::{Evaluation, EvaluationService};
use super::proposals::{Proposal, ProposalService};
use super::repository::InMemoryRepository;
use super::users::{User, UserDirectory};
use crate::config::PortalConfig;

pub type UserStore = InMemoryRepository<User>;
pub type BidStore = InMemoryRepository<Bid>;
pub type ProposalStore = InMemoryRepository<Proposal>;
pub type EvaluationStore = InMemoryRepository<Evaluation>;

/// Records a portal instance starts with.
#[derive(Debug, Clone, Default)]
pub struct PortalSeed {
    pub users: Vec<User>,
    pub credentials: Vec<Credential>,
    pub bids: Vec<Bid>,
    pub proposals: Vec<Proposal>,
    pub evaluations: Vec<Evaluation>,
}

/// Every portal service wired to one set of shared stores.
pub struct Portal {
    pub sessions: Arc<SessionService<UserStore>>,
    pub gate: AccessGate<SessionService<UserStore>>,
    pub users: UserDirectory<UserStore>,
    pub bids: BidService<BidStore>,
    pub proposals: ProposalService<ProposalStore, BidStore>,
    pub evaluations: EvaluationService<EvaluationStore, ProposalStore>,
    simulated_latency: Option<Duration>,
}

impl Portal {
    pub fn new(config: &PortalConfig, seed: PortalSeed) -> Self {
        let users = Arc::new(UserStore::seeded(seed.users));
        let bids = Arc::new(BidStore::seeded(seed.bids));
        let proposals = Arc::new(ProposalStore::seeded(seed.proposals));
        let evaluations = Arc::new(EvaluationStore::seeded(seed.evaluations));

        let sessions = Arc::new(
            SessionService::new(Arc::clone(&users), seed.credentials)
                .with_role_switching(config.allow_role_switching),
        );

        Self {
            gate: AccessGate::new(Arc::clone(&sessions), RouteTable::portal()),
            sessions,
            users: UserDirectory::new(users),
            bids: BidService::new(Arc::clone(&bids)),
            proposals: ProposalService::new(Arc::clone(&proposals), bids),
            evaluations: EvaluationService::new(evaluations, proposals),
            simulated_latency: config.simulated_latency(),
        }
    }

    pub fn simulated_latency(&self) -> Option<Duration> {
        self.simulated_latency
    }
}
