use std::sync::Arc;

use axum::{
    extract::{Path, Query, Request, State},
    http::{HeaderMap, StatusCode, Uri},
    middleware::{self, Next},
    response::{IntoResponse, Redirect, Response},
    routing::{get, patch, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::access::{Decision, Role, Session, SessionToken, LOGIN_PATH};
use super::app::Portal;
use super::bids::{BidId, NewBid};
use super::evaluation::{
    CriterionId, EvaluationCriterion, EvaluationDraft, EvaluationId, ScoreCard,
};
use super::proposals::{ProposalId, ProposalSubmission};
use super::users::{NewUser, UserId, UserUpdate};
use crate::error::AppError;

/// Header carrying the opaque session token.
pub const SESSION_HEADER: &str = "x-session-token";

const BIDDER: &[Role] = &[Role::Bidder];
const OFFICER: &[Role] = &[Role::Officer];
const COMMITTEE: &[Role] = &[Role::Committee];
const ADMIN: &[Role] = &[Role::Admin];
const REVIEWERS: &[Role] = &[Role::Committee, Role::Officer];
const ANY_SESSION: &[Role] = &[];

/// Router exposing the portal's JSON API.
pub fn portal_router(portal: Arc<Portal>) -> Router {
    Router::new()
        .route("/api/v1/auth/login", post(login_handler))
        .route("/api/v1/auth/logout", post(logout_handler))
        .route("/api/v1/session", get(session_handler))
        .route("/api/v1/session/role", post(switch_role_handler))
        .route("/api/v1/navigate", get(navigate_handler))
        .route("/api/v1/bids", get(list_bids_handler).post(create_bid_handler))
        .route("/api/v1/bids/:bid_id", get(bid_handler))
        .route("/api/v1/bids/:bid_id/close", post(close_bid_handler))
        .route("/api/v1/bids/:bid_id/proposals", get(bid_proposals_handler))
        .route("/api/v1/proposals", post(submit_proposal_handler))
        .route("/api/v1/proposals/mine", get(my_proposals_handler))
        .route(
            "/api/v1/proposals/:proposal_id/evaluations",
            get(proposal_evaluations_handler),
        )
        .route("/api/v1/evaluations", post(save_evaluation_handler))
        .route("/api/v1/evaluations/score", post(score_handler))
        .route("/api/v1/evaluations/template", get(template_handler))
        .route("/api/v1/evaluations/mine", get(my_evaluations_handler))
        .route("/api/v1/evaluations/:evaluation_id", get(evaluation_handler))
        .route(
            "/api/v1/evaluations/:evaluation_id/criteria/:criterion_id",
            patch(criterion_score_handler),
        )
        .route(
            "/api/v1/evaluations/:evaluation_id/submit",
            post(submit_evaluation_handler),
        )
        .route("/api/v1/users", get(list_users_handler).post(create_user_handler))
        .route(
            "/api/v1/users/:user_id",
            patch(update_user_handler).delete(delete_user_handler),
        )
        .route("/api/v1/users/:user_id/verify", post(verify_user_handler))
        .layer(middleware::from_fn_with_state(
            Arc::clone(&portal),
            simulated_latency,
        ))
        .with_state(portal)
}

async fn simulated_latency(
    State(portal): State<Arc<Portal>>,
    request: Request,
    next: Next,
) -> Response {
    if let Some(delay) = portal.simulated_latency() {
        tokio::time::sleep(delay).await;
    }
    next.run(request).await
}

pub(crate) fn session_token(headers: &HeaderMap) -> Option<SessionToken> {
    headers
        .get(SESSION_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(|value| SessionToken(value.to_string()))
}

/// Run the access gate for an API route; denial becomes a 303 redirect.
fn admit(
    portal: &Portal,
    headers: &HeaderMap,
    uri: &Uri,
    allowed_roles: &[Role],
) -> Result<Session, Response> {
    let token = session_token(headers);
    match portal.gate.guard(token.as_ref(), uri.path(), allowed_roles) {
        (Decision::Render, Some(session)) => Ok(session),
        (decision, _) => Err(redirect(&decision)),
    }
}

fn redirect(decision: &Decision) -> Response {
    let location = decision
        .location()
        .unwrap_or_else(|| LOGIN_PATH.to_string());
    Redirect::to(&location).into_response()
}

fn respond<T, E>(status: StatusCode, result: Result<T, E>) -> Response
where
    T: Serialize,
    E: Into<AppError>,
{
    match result {
        Ok(value) => (status, Json(value)).into_response(),
        Err(err) => {
            let err: AppError = err.into();
            err.into_response()
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct LoginRequest {
    pub(crate) email: String,
    pub(crate) password: String,
    #[serde(default)]
    pub(crate) redirect: Option<String>,
}

#[derive(Debug, Serialize)]
struct LoginResponse {
    token: SessionToken,
    session: Session,
    redirect: String,
}

pub(crate) async fn login_handler(
    State(portal): State<Arc<Portal>>,
    Json(request): Json<LoginRequest>,
) -> Response {
    let result = portal
        .sessions
        .login(&request.email, &request.password)
        .map(|(token, session)| LoginResponse {
            redirect: portal
                .gate
                .login_destination(&session, request.redirect.as_deref()),
            token,
            session,
        });
    respond(StatusCode::OK, result)
}

async fn logout_handler(
    State(portal): State<Arc<Portal>>,
    headers: HeaderMap,
    uri: Uri,
) -> Response {
    if let Err(denied) = admit(&portal, &headers, &uri, ANY_SESSION) {
        return denied;
    }
    let Some(token) = session_token(&headers) else {
        return Redirect::to(LOGIN_PATH).into_response();
    };
    match portal.sessions.logout(&token) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => AppError::from(err).into_response(),
    }
}

pub(crate) async fn session_handler(
    State(portal): State<Arc<Portal>>,
    headers: HeaderMap,
    uri: Uri,
) -> Response {
    match admit(&portal, &headers, &uri, ANY_SESSION) {
        Ok(session) => {
            let payload = json!({
                "session": session,
                "landing_page": session.role.landing_page(),
                "role_switching": portal.sessions.role_switching_enabled(),
            });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(denied) => denied,
    }
}

#[derive(Debug, Deserialize)]
struct SwitchRoleRequest {
    role: Role,
}

async fn switch_role_handler(
    State(portal): State<Arc<Portal>>,
    headers: HeaderMap,
    uri: Uri,
    Json(request): Json<SwitchRoleRequest>,
) -> Response {
    if let Err(denied) = admit(&portal, &headers, &uri, ANY_SESSION) {
        return denied;
    }
    let Some(token) = session_token(&headers) else {
        return Redirect::to(LOGIN_PATH).into_response();
    };
    respond(
        StatusCode::OK,
        portal.sessions.switch_role(&token, request.role),
    )
}

#[derive(Debug, Deserialize)]
pub(crate) struct NavigateQuery {
    pub(crate) path: String,
}

/// Report what the shell would do for `path`, without redirecting the API call.
pub(crate) async fn navigate_handler(
    State(portal): State<Arc<Portal>>,
    headers: HeaderMap,
    Query(query): Query<NavigateQuery>,
) -> Response {
    let token = session_token(&headers);
    let decision = portal.gate.navigate(token.as_ref(), &query.path);
    let payload = json!({
        "path": query.path,
        "outcome": decision,
        "location": decision.location(),
    });
    (StatusCode::OK, Json(payload)).into_response()
}

#[derive(Debug, Default, Deserialize)]
struct BidListQuery {
    #[serde(default)]
    open: bool,
}

async fn list_bids_handler(
    State(portal): State<Arc<Portal>>,
    Query(query): Query<BidListQuery>,
) -> Response {
    respond(StatusCode::OK, portal.bids.list(query.open))
}

async fn bid_handler(State(portal): State<Arc<Portal>>, Path(bid_id): Path<String>) -> Response {
    respond(StatusCode::OK, portal.bids.get(&BidId(bid_id)))
}

pub(crate) async fn create_bid_handler(
    State(portal): State<Arc<Portal>>,
    headers: HeaderMap,
    uri: Uri,
    Json(payload): Json<NewBid>,
) -> Response {
    match admit(&portal, &headers, &uri, OFFICER) {
        Ok(session) => respond(StatusCode::CREATED, portal.bids.create(&session.id, payload)),
        Err(denied) => denied,
    }
}

async fn close_bid_handler(
    State(portal): State<Arc<Portal>>,
    headers: HeaderMap,
    uri: Uri,
    Path(bid_id): Path<String>,
) -> Response {
    match admit(&portal, &headers, &uri, OFFICER) {
        Ok(_) => respond(StatusCode::OK, portal.bids.close(&BidId(bid_id))),
        Err(denied) => denied,
    }
}

async fn bid_proposals_handler(
    State(portal): State<Arc<Portal>>,
    headers: HeaderMap,
    uri: Uri,
    Path(bid_id): Path<String>,
) -> Response {
    match admit(&portal, &headers, &uri, REVIEWERS) {
        Ok(_) => respond(StatusCode::OK, portal.proposals.for_bid(&BidId(bid_id))),
        Err(denied) => denied,
    }
}

pub(crate) async fn submit_proposal_handler(
    State(portal): State<Arc<Portal>>,
    headers: HeaderMap,
    uri: Uri,
    Json(submission): Json<ProposalSubmission>,
) -> Response {
    match admit(&portal, &headers, &uri, BIDDER) {
        Ok(session) => respond(
            StatusCode::CREATED,
            portal.proposals.submit(&session.id, submission),
        ),
        Err(denied) => denied,
    }
}

async fn my_proposals_handler(
    State(portal): State<Arc<Portal>>,
    headers: HeaderMap,
    uri: Uri,
) -> Response {
    match admit(&portal, &headers, &uri, BIDDER) {
        Ok(session) => respond(StatusCode::OK, portal.proposals.for_bidder(&session.id)),
        Err(denied) => denied,
    }
}

async fn proposal_evaluations_handler(
    State(portal): State<Arc<Portal>>,
    headers: HeaderMap,
    uri: Uri,
    Path(proposal_id): Path<String>,
) -> Response {
    match admit(&portal, &headers, &uri, REVIEWERS) {
        Ok(_) => respond(
            StatusCode::OK,
            portal.evaluations.for_proposal(&ProposalId(proposal_id)),
        ),
        Err(denied) => denied,
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ScoreRequest {
    pub(crate) criteria: Vec<EvaluationCriterion>,
}

/// Stateless scoring preview: overall score, weight health and breakdown.
pub(crate) async fn score_handler(
    State(portal): State<Arc<Portal>>,
    headers: HeaderMap,
    uri: Uri,
    Json(request): Json<ScoreRequest>,
) -> Response {
    if let Err(denied) = admit(&portal, &headers, &uri, ANY_SESSION) {
        return denied;
    }
    match ScoreCard::from_criteria(&request.criteria) {
        Ok(card) => {
            let payload = json!({
                "overall_score": card.overall_score,
                "weights": card.weights,
                "weight_warning": card.weight_warning(),
                "breakdown": card.breakdown,
            });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(err) => AppError::from(err).into_response(),
    }
}

async fn template_handler(
    State(portal): State<Arc<Portal>>,
    headers: HeaderMap,
    uri: Uri,
) -> Response {
    match admit(&portal, &headers, &uri, COMMITTEE) {
        Ok(_) => (
            StatusCode::OK,
            Json(EvaluationCriterion::default_template()),
        )
            .into_response(),
        Err(denied) => denied,
    }
}

pub(crate) async fn save_evaluation_handler(
    State(portal): State<Arc<Portal>>,
    headers: HeaderMap,
    uri: Uri,
    Json(draft): Json<EvaluationDraft>,
) -> Response {
    match admit(&portal, &headers, &uri, COMMITTEE) {
        Ok(session) => respond(
            StatusCode::OK,
            portal.evaluations.save_draft(&session.id, draft),
        ),
        Err(denied) => denied,
    }
}

async fn my_evaluations_handler(
    State(portal): State<Arc<Portal>>,
    headers: HeaderMap,
    uri: Uri,
) -> Response {
    match admit(&portal, &headers, &uri, COMMITTEE) {
        Ok(session) => respond(StatusCode::OK, portal.evaluations.for_committee(&session.id)),
        Err(denied) => denied,
    }
}

async fn evaluation_handler(
    State(portal): State<Arc<Portal>>,
    headers: HeaderMap,
    uri: Uri,
    Path(evaluation_id): Path<String>,
) -> Response {
    match admit(&portal, &headers, &uri, COMMITTEE) {
        Ok(session) => respond(
            StatusCode::OK,
            portal
                .evaluations
                .get_owned(&session.id, &EvaluationId(evaluation_id)),
        ),
        Err(denied) => denied,
    }
}

#[derive(Debug, Deserialize)]
struct CriterionScoreRequest {
    score: f64,
}

async fn criterion_score_handler(
    State(portal): State<Arc<Portal>>,
    headers: HeaderMap,
    uri: Uri,
    Path((evaluation_id, criterion_id)): Path<(String, String)>,
    Json(request): Json<CriterionScoreRequest>,
) -> Response {
    match admit(&portal, &headers, &uri, COMMITTEE) {
        Ok(session) => respond(
            StatusCode::OK,
            portal.evaluations.set_criterion_score(
                &session.id,
                &EvaluationId(evaluation_id),
                &CriterionId(criterion_id),
                request.score,
            ),
        ),
        Err(denied) => denied,
    }
}

pub(crate) async fn submit_evaluation_handler(
    State(portal): State<Arc<Portal>>,
    headers: HeaderMap,
    uri: Uri,
    Path(evaluation_id): Path<String>,
) -> Response {
    match admit(&portal, &headers, &uri, COMMITTEE) {
        Ok(session) => respond(
            StatusCode::OK,
            portal
                .evaluations
                .submit(&session.id, &EvaluationId(evaluation_id)),
        ),
        Err(denied) => denied,
    }
}

async fn list_users_handler(
    State(portal): State<Arc<Portal>>,
    headers: HeaderMap,
    uri: Uri,
) -> Response {
    match admit(&portal, &headers, &uri, ADMIN) {
        Ok(_) => respond(StatusCode::OK, portal.users.list()),
        Err(denied) => denied,
    }
}

pub(crate) async fn create_user_handler(
    State(portal): State<Arc<Portal>>,
    headers: HeaderMap,
    uri: Uri,
    Json(payload): Json<NewUser>,
) -> Response {
    match admit(&portal, &headers, &uri, ADMIN) {
        Ok(_) => respond(StatusCode::CREATED, portal.users.create(payload)),
        Err(denied) => denied,
    }
}

async fn update_user_handler(
    State(portal): State<Arc<Portal>>,
    headers: HeaderMap,
    uri: Uri,
    Path(user_id): Path<String>,
    Json(changes): Json<UserUpdate>,
) -> Response {
    match admit(&portal, &headers, &uri, ADMIN) {
        Ok(_) => respond(StatusCode::OK, portal.users.update(&UserId(user_id), changes)),
        Err(denied) => denied,
    }
}

async fn delete_user_handler(
    State(portal): State<Arc<Portal>>,
    headers: HeaderMap,
    uri: Uri,
    Path(user_id): Path<String>,
) -> Response {
    match admit(&portal, &headers, &uri, ADMIN) {
        Ok(_) => match portal.users.delete(&UserId(user_id)) {
            Ok(()) => StatusCode::NO_CONTENT.into_response(),
            Err(err) => AppError::from(err).into_response(),
        },
        Err(denied) => denied,
    }
}

async fn verify_user_handler(
    State(portal): State<Arc<Portal>>,
    headers: HeaderMap,
    uri: Uri,
    Path(user_id): Path<String>,
) -> Response {
    match admit(&portal, &headers, &uri, ADMIN) {
        Ok(_) => respond(StatusCode::OK, portal.users.verify(&UserId(user_id))),
        Err(denied) => denied,
    }
}
