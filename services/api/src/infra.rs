use bid_portal::config::PortalConfig;
use bid_portal::error::AppError;
use bid_portal::portal::access::{Credential, Role};
use bid_portal::portal::bids::{Bid, BidCatalogImporter, BidId, BidStatus};
use bid_portal::portal::proposals::{Proposal, ProposalId, ProposalStatus};
use bid_portal::portal::users::{User, UserId};
use bid_portal::portal::PortalSeed;
use chrono::{DateTime, Duration, Utc};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

/// Shared password of every seeded account.
pub(crate) const DEMO_PASSWORD: &str = "password123";

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Seed data for a fresh portal, with bids from the configured catalogue when present.
pub(crate) fn portal_seed(config: &PortalConfig) -> Result<PortalSeed, AppError> {
    let now = Utc::now();
    let mut seed = demo_seed(now);

    if let Some(path) = &config.bid_catalogue {
        let bids = BidCatalogImporter::from_path(path)?;
        info!(path = %path.display(), count = bids.len(), "bid catalogue imported");
        seed.bids = bids;
        seed.proposals.clear();
    }

    Ok(seed)
}

pub(crate) fn demo_seed(now: DateTime<Utc>) -> PortalSeed {
    let users = demo_users(now);
    let credentials = users
        .iter()
        .map(|user| Credential {
            email: user.email.clone(),
            password: DEMO_PASSWORD.to_string(),
            user_id: user.id.clone(),
        })
        .collect();

    PortalSeed {
        users,
        credentials,
        bids: demo_bids(now),
        proposals: demo_proposals(now),
        evaluations: Vec::new(),
    }
}

fn demo_users(now: DateTime<Utc>) -> Vec<User> {
    [
        ("user-001", Role::Bidder, "John Doe", "john.doe@example.com", "ABC Construction", true),
        ("user-002", Role::Officer, "Jane Smith", "jane.smith@gov.et", "Ministry of Education", true),
        ("user-003", Role::Bidder, "Mike Johnson", "mike.johnson@example.com", "MediTech Supplies", true),
        ("user-004", Role::Committee, "Sarah Williams", "sarah.williams@gov.et", "Ministry of Health", true),
        ("user-005", Role::Bidder, "David Chen", "david.chen@example.com", "SolarTech Solutions", false),
        ("user-006", Role::Admin, "Portal Administrator", "admin@gov.et", "Public Procurement Agency", true),
    ]
    .into_iter()
    .enumerate()
    .map(|(index, (id, role, name, email, organization, verified))| User {
        id: UserId(id.to_string()),
        role,
        email: email.to_string(),
        name: name.to_string(),
        organization: Some(organization.to_string()),
        verified,
        created_at: now - Duration::days(120 - index as i64 * 10),
    })
    .collect()
}

fn demo_bids(now: DateTime<Utc>) -> Vec<Bid> {
    [
        ("bid-001", "School Construction Project", "Construction", 5_000_000, 30, BidStatus::Open, 4,
         "Construction of a new primary school building with 10 classrooms, administrative offices, and sanitation facilities."),
        ("bid-002", "Medical Supplies Procurement", "Healthcare", 2_500_000, 21, BidStatus::Open, 7,
         "Supply of essential medical equipment and consumables for 5 district hospitals."),
        ("bid-003", "Solar Power Installation", "Energy", 3_500_000, 45, BidStatus::Open, 2,
         "Installation of solar power systems for 20 rural health centers."),
        ("bid-004", "Road Rehabilitation Project", "Infrastructure", 12_000_000, 60, BidStatus::Open, 0,
         "Rehabilitation of 50km of rural roads including drainage works."),
        ("bid-005", "IT Equipment Supply", "Technology", 1_800_000, -5, BidStatus::Closed, 12,
         "Supply of computers, servers, and networking equipment for government offices."),
    ]
    .into_iter()
    .enumerate()
    .map(
        |(index, (id, title, category, budget, deadline_days, status, proposals, description))| Bid {
            id: BidId(id.to_string()),
            title: title.to_string(),
            category: category.to_string(),
            budget,
            deadline: now + Duration::days(deadline_days),
            description: description.to_string(),
            status,
            created_at: now - Duration::days(20 - index as i64 * 3),
            created_by: UserId("user-002".to_string()),
            proposals,
        },
    )
    .collect()
}

fn demo_proposals(now: DateTime<Utc>) -> Vec<Proposal> {
    vec![Proposal {
        id: ProposalId("prop-001".to_string()),
        bid_id: BidId("bid-001".to_string()),
        bidder_id: UserId("user-001".to_string()),
        files: vec![
            "technical-proposal.pdf".to_string(),
            "financial-offer.pdf".to_string(),
        ],
        cover_letter: "ABC Construction proposes a phased build with local labour and certified site engineers.".to_string(),
        proposed_budget: 4_750_000,
        completion_days: 240,
        score: None,
        status: ProposalStatus::Pending,
        submitted_at: now - Duration::days(3),
        feedback: None,
    }]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_seed_covers_every_role() {
        let seed = demo_seed(Utc::now());
        for role in Role::ALL {
            assert!(
                seed.users.iter().any(|user| user.role == role),
                "no seeded {role} account"
            );
        }
        assert_eq!(seed.credentials.len(), seed.users.len());
    }

    #[test]
    fn demo_bids_accept_proposals_until_their_deadline() {
        let now = Utc::now();
        let seed = demo_seed(now);
        let open = seed
            .bids
            .iter()
            .filter(|bid| bid.accepts_proposals(now))
            .count();
        assert_eq!(open, 4);
    }

    #[test]
    fn default_config_keeps_demo_bids() {
        let seed = portal_seed(&PortalConfig::default()).expect("seed builds");
        assert_eq!(seed.bids.len(), 5);
        assert_eq!(seed.proposals.len(), 1);
    }
}
