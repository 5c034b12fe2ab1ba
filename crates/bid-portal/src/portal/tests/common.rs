use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{Duration, Utc};
use serde_json::Value;

use crate::config::PortalConfig;
use crate::portal::access::{Credential, Role, Session, SessionError, SessionResolver, SessionToken};
use crate::portal::bids::{Bid, BidId, BidStatus};
use crate::portal::evaluation::{CriterionId, EvaluationCriterion};
use crate::portal::proposals::{Proposal, ProposalId, ProposalStatus, ProposalSubmission};
use crate::portal::users::{User, UserId};
use crate::portal::{Portal, PortalSeed};

pub(super) const PASSWORD: &str = "password123";

pub(super) fn user(id: &str, role: Role, email: &str, name: &str) -> User {
    User {
        id: UserId(id.to_string()),
        role,
        email: email.to_string(),
        name: name.to_string(),
        organization: None,
        verified: true,
        created_at: Utc::now() - Duration::days(90),
    }
}

pub(super) fn users() -> Vec<User> {
    vec![
        user("bidder-001", Role::Bidder, "bidder@example.com", "Abebe Bidder"),
        user("officer-001", Role::Officer, "officer@example.com", "Sara Officer"),
        user("committee-001", Role::Committee, "committee@example.com", "Dawit Reviewer"),
        user("committee-002", Role::Committee, "committee2@example.com", "Hana Reviewer"),
        user("admin-001", Role::Admin, "admin@example.com", "Meron Admin"),
    ]
}

pub(super) fn credentials(users: &[User]) -> Vec<Credential> {
    users
        .iter()
        .map(|user| Credential {
            email: user.email.clone(),
            password: PASSWORD.to_string(),
            user_id: user.id.clone(),
        })
        .collect()
}

pub(super) fn bid(id: &str, status: BidStatus, deadline_in_days: i64) -> Bid {
    let now = Utc::now();
    Bid {
        id: BidId(id.to_string()),
        title: format!("Tender {id}"),
        category: "Construction".to_string(),
        budget: 5_000_000,
        deadline: now + Duration::days(deadline_in_days),
        description: "Primary school with 10 classrooms".to_string(),
        status,
        created_at: now - Duration::days(10),
        created_by: UserId("officer-001".to_string()),
        proposals: 1,
    }
}

pub(super) fn bids() -> Vec<Bid> {
    vec![
        bid("bid-001", BidStatus::Open, 30),
        bid("bid-002", BidStatus::Closed, 5),
        bid("bid-003", BidStatus::Open, -1),
    ]
}

pub(super) fn proposals() -> Vec<Proposal> {
    vec![Proposal {
        id: ProposalId("prop-001".to_string()),
        bid_id: BidId("bid-001".to_string()),
        bidder_id: UserId("bidder-001".to_string()),
        files: vec!["technical-proposal.pdf".to_string()],
        cover_letter: cover_letter(),
        proposed_budget: 4_750_000,
        completion_days: 180,
        score: None,
        status: ProposalStatus::Pending,
        submitted_at: Utc::now() - Duration::days(2),
        feedback: None,
    }]
}

pub(super) fn cover_letter() -> String {
    "We propose a phased construction plan delivered by our certified civil engineering team."
        .to_string()
}

pub(super) fn submission(bid_id: &str) -> ProposalSubmission {
    ProposalSubmission {
        bid_id: BidId(bid_id.to_string()),
        cover_letter: cover_letter(),
        proposed_budget: 4_200_000,
        completion_days: 150,
        files: vec!["company-profile.pdf".to_string(), "bill-of-quantities.PDF".to_string()],
    }
}

pub(super) fn seed() -> PortalSeed {
    let users = users();
    PortalSeed {
        credentials: credentials(&users),
        users,
        bids: bids(),
        proposals: proposals(),
        evaluations: Vec::new(),
    }
}

pub(super) fn portal() -> Arc<Portal> {
    Arc::new(Portal::new(&PortalConfig::default(), seed()))
}

pub(super) fn portal_with_role_switching() -> Arc<Portal> {
    let config = PortalConfig {
        allow_role_switching: true,
        ..PortalConfig::default()
    };
    Arc::new(Portal::new(&config, seed()))
}

pub(super) fn login(portal: &Portal, email: &str) -> SessionToken {
    portal
        .sessions
        .login(email, PASSWORD)
        .expect("fixture credentials are valid")
        .0
}

pub(super) fn session(id: &str, role: Role) -> Session {
    Session {
        id: UserId(id.to_string()),
        email: format!("{id}@example.com"),
        name: id.to_string(),
        role,
    }
}

/// Criteria of the reference evaluation: 0.4*9 + 0.3*8 + 0.3*8.5 = 8.55.
pub(super) fn scored_criteria() -> Vec<EvaluationCriterion> {
    let mut criteria = EvaluationCriterion::default_template();
    for (criterion, score) in criteria.iter_mut().zip([9.0, 8.0, 8.5]) {
        criterion.score = score;
    }
    criteria
}

pub(super) fn criterion_id(id: &str) -> CriterionId {
    CriterionId(id.to_string())
}

/// Session source that always returns the same canned answer.
pub(super) struct StaticResolver {
    answer: Mutex<Result<Option<Session>, SessionError>>,
}

impl StaticResolver {
    pub(super) fn new(answer: Result<Option<Session>, SessionError>) -> Self {
        Self {
            answer: Mutex::new(answer),
        }
    }
}

impl SessionResolver for StaticResolver {
    fn resolve(&self, _token: &SessionToken) -> Result<Option<Session>, SessionError> {
        self.answer
            .lock()
            .expect("resolver mutex poisoned")
            .clone()
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("valid json")
}

pub(super) fn location(response: &Response) -> Option<&str> {
    response
        .headers()
        .get(axum::http::header::LOCATION)
        .and_then(|value| value.to_str().ok())
}
