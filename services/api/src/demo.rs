use crate::infra::{demo_seed, DEMO_PASSWORD};
use bid_portal::config::PortalConfig;
use bid_portal::error::AppError;
use bid_portal::portal::access::{Decision, SessionToken};
use bid_portal::portal::bids::NewBid;
use bid_portal::portal::evaluation::{EvaluationCriterion, EvaluationDraft, ScoreCard};
use bid_portal::portal::proposals::ProposalSubmission;
use bid_portal::portal::Portal;
use chrono::{Duration, Utc};
use clap::Args;
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub(crate) struct ScoreArgs {
    /// JSON file holding a criteria array or an object with a `criteria` field
    #[arg(long)]
    pub(crate) criteria: PathBuf,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Skip the bid, proposal and evaluation walkthrough.
    #[arg(long)]
    pub(crate) skip_workflow: bool,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CriteriaFile {
    List(Vec<EvaluationCriterion>),
    Wrapped { criteria: Vec<EvaluationCriterion> },
}

impl CriteriaFile {
    fn into_criteria(self) -> Vec<EvaluationCriterion> {
        match self {
            CriteriaFile::List(criteria) | CriteriaFile::Wrapped { criteria } => criteria,
        }
    }
}

pub(crate) fn parse_criteria(raw: &str) -> Result<Vec<EvaluationCriterion>, AppError> {
    serde_json::from_str::<CriteriaFile>(raw)
        .map(CriteriaFile::into_criteria)
        .map_err(|err| AppError::Validation(format!("invalid criteria file: {err}")))
}

pub(crate) fn run_score(args: ScoreArgs) -> Result<(), AppError> {
    let raw = std::fs::read_to_string(&args.criteria)?;
    let criteria = parse_criteria(&raw)?;
    let card = ScoreCard::from_criteria(&criteria)?;
    render_score_card(&card);
    Ok(())
}

fn render_score_card(card: &ScoreCard) {
    println!("Overall score: {:.2}", card.overall_score);
    println!("Total weight: {:.0}%", card.weights.total * 100.0);
    if let Some(warning) = card.weight_warning() {
        println!("Warning: {warning}");
    }
    for line in &card.breakdown {
        println!(
            "  - {}: {}/{} x {:.0}% = {:.2}",
            line.name,
            line.score,
            line.max_score,
            line.weight * 100.0,
            line.weighted_score
        );
    }
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let portal = Portal::new(&PortalConfig::default(), demo_seed(Utc::now()));

    println!("Bid portal demo");
    println!("\nAccess gate");
    let anonymous = portal.gate.navigate(None, "/dashboard/admin/users");
    println!(
        "- anonymous -> /dashboard/admin/users: {}",
        describe(&anonymous)
    );

    let accounts = [
        "john.doe@example.com",
        "jane.smith@gov.et",
        "sarah.williams@gov.et",
        "admin@gov.et",
    ];
    let pages = ["/dashboard", "/dashboard/officer/bids", "/dashboard/admin/users"];
    for email in accounts {
        let (token, session) = portal.sessions.login(email, DEMO_PASSWORD)?;
        println!(
            "- {} ({}) lands on {}",
            session.name,
            session.role.label(),
            portal.gate.login_destination(&session, None)
        );
        for path in pages {
            let decision = portal.gate.navigate(Some(&token), path);
            println!("    {path}: {}", describe(&decision));
        }
        portal.sessions.logout(&token)?;
    }

    if args.skip_workflow {
        return Ok(());
    }

    println!("\nProcurement workflow");
    let (_, officer) = portal.sessions.login("jane.smith@gov.et", DEMO_PASSWORD)?;
    let bid = portal.bids.create(
        &officer.id,
        NewBid {
            title: "Water Supply Expansion".to_string(),
            category: "Infrastructure".to_string(),
            budget: 4_200_000,
            deadline: Utc::now() + Duration::days(28),
            description: "Boreholes and distribution lines for three kebeles.".to_string(),
        },
    )?;
    println!(
        "- {} published {} ({}, budget {})",
        officer.name, bid.id, bid.title, bid.budget
    );

    let (_, bidder) = portal
        .sessions
        .login("mike.johnson@example.com", DEMO_PASSWORD)?;
    let rejected = portal.proposals.submit(
        &bidder.id,
        ProposalSubmission {
            bid_id: bid.id.clone(),
            cover_letter: "Cheap and fast.".to_string(),
            proposed_budget: 3_900_000,
            completion_days: 120,
            files: vec!["offer.docx".to_string()],
        },
    );
    if let Err(err) = rejected {
        println!("- first attempt rejected: {err}");
    }

    let proposal = portal.proposals.submit(
        &bidder.id,
        ProposalSubmission {
            bid_id: bid.id.clone(),
            cover_letter: "MediTech Supplies has delivered water infrastructure for regional health posts since 2015.".to_string(),
            proposed_budget: 3_900_000,
            completion_days: 120,
            files: vec!["technical-offer.pdf".to_string(), "financial-offer.pdf".to_string()],
        },
    )?;
    println!(
        "- {} submitted {} for {} ({} days)",
        bidder.name, proposal.id, proposal.bid_id, proposal.completion_days
    );

    let (committee_token, committee) = portal
        .sessions
        .login("sarah.williams@gov.et", DEMO_PASSWORD)?;
    let mut criteria = EvaluationCriterion::default_template();
    for (criterion, score) in criteria.iter_mut().zip([9.0, 8.0, 8.5]) {
        criterion.score = score;
    }
    let draft = portal.evaluations.save_draft(
        &committee.id,
        EvaluationDraft {
            id: None,
            proposal_id: proposal.id.clone(),
            comments: "Credible delivery plan and competitive pricing.".to_string(),
            criteria,
        },
    )?;
    println!("- {} saved draft {}", committee.name, draft.id);
    render_score_card(&ScoreCard::from_criteria(&draft.criteria)?);

    let submitted = portal.evaluations.submit(&committee.id, &draft.id)?;
    println!(
        "- evaluation {} {} with score {:.2}",
        submitted.id,
        submitted.status.label(),
        submitted.score
    );
    if let Err(err) = portal.evaluations.submit(&committee.id, &draft.id) {
        println!("- second submit refused: {err}");
    }

    report_session(&portal, &committee_token);
    Ok(())
}

fn report_session(portal: &Portal, token: &SessionToken) {
    match portal.gate.navigate(Some(token), "/dashboard/committee/evaluations") {
        Decision::Render => println!("- committee dashboard remains available"),
        other => println!("- committee dashboard unavailable: {}", describe(&other)),
    }
}

fn describe(decision: &Decision) -> String {
    match decision {
        Decision::Render => "render".to_string(),
        Decision::RedirectLogin { .. } => format!(
            "redirect to {}",
            decision.location().unwrap_or_default()
        ),
        Decision::RedirectHome { location } => format!("redirect home to {location}"),
    }
}
