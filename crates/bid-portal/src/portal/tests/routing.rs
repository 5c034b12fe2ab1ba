use super::common::*;
use axum::body::Body;
use axum::extract::State;
use axum::http::{header, Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use crate::portal::evaluation::EvaluationCriterion;
use crate::portal::router::{
    login_handler, score_handler, LoginRequest, ScoreRequest, SESSION_HEADER,
};
use crate::portal::portal_router;

fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(SESSION_HEADER, token);
    }
    builder
        .body(Body::from(serde_json::to_vec(&body).expect("serialize body")))
        .expect("request builds")
}

fn get_request(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header(SESSION_HEADER, token);
    }
    builder.body(Body::empty()).expect("request builds")
}

#[tokio::test]
async fn login_handler_returns_token_and_landing_page() {
    let portal = portal();

    let response = login_handler(
        State(portal),
        axum::Json(LoginRequest {
            email: "committee@example.com".to_string(),
            password: PASSWORD.to_string(),
            redirect: None,
        }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert!(payload.get("token").and_then(Value::as_str).is_some());
    assert_eq!(payload["session"]["role"], json!("COMMITTEE"));
    assert_eq!(payload["redirect"], json!("/dashboard/committee"));
}

#[tokio::test]
async fn login_handler_replays_permitted_return_path() {
    let response = login_handler(
        State(portal()),
        axum::Json(LoginRequest {
            email: "officer@example.com".to_string(),
            password: PASSWORD.to_string(),
            redirect: Some("/dashboard/officer/bids".to_string()),
        }),
    )
    .await;

    let payload = read_json_body(response).await;
    assert_eq!(payload["redirect"], json!("/dashboard/officer/bids"));
}

#[tokio::test]
async fn login_handler_rejects_bad_password() {
    let response = login_handler(
        State(portal()),
        axum::Json(LoginRequest {
            email: "officer@example.com".to_string(),
            password: "wrong".to_string(),
            redirect: None,
        }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn anonymous_calls_are_redirected_to_login() {
    let router = portal_router(portal());

    let response = router
        .oneshot(get_request("/api/v1/users", None))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        location(&response),
        Some("/auth/login?redirect=%2Fapi%2Fv1%2Fusers")
    );
}

#[tokio::test]
async fn wrong_role_is_redirected_to_its_landing_page() {
    let portal = portal();
    let token = login(&portal, "bidder@example.com");
    let router = portal_router(portal);

    let response = router
        .oneshot(get_request("/api/v1/users", Some(&token.0)))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/dashboard/bidder"));
}

#[tokio::test]
async fn unknown_token_counts_as_anonymous() {
    let router = portal_router(portal());

    let response = router
        .oneshot(get_request("/api/v1/session", Some("not-a-session")))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn navigate_reports_gate_decision() {
    let portal = portal();
    let token = login(&portal, "officer@example.com");
    let router = portal_router(portal);

    let response = router
        .oneshot(get_request(
            "/api/v1/navigate?path=/dashboard/admin/users",
            Some(&token.0),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["outcome"]["decision"], json!("redirect_home"));
    assert_eq!(payload["location"], json!("/dashboard/officer"));
}

#[tokio::test]
async fn public_bid_listing_needs_no_session() {
    let router = portal_router(portal());

    let response = router
        .oneshot(get_request("/api/v1/bids?open=true", None))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    let bids = payload.as_array().expect("array of bids");
    assert!(bids.iter().all(|bid| bid["status"] == json!("OPEN")));
}

#[tokio::test]
async fn officer_publishes_bid() {
    let portal = portal();
    let token = login(&portal, "officer@example.com");
    let router = portal_router(portal);
    let deadline = (chrono::Utc::now() + chrono::Duration::days(14)).to_rfc3339();

    let response = router
        .oneshot(json_request(
            "POST",
            "/api/v1/bids",
            Some(&token.0),
            json!({
                "title": "Office Furniture Procurement",
                "category": "Supplies",
                "budget": 750000,
                "deadline": deadline,
                "description": "Desks, chairs and cabinets",
            }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::CREATED);
    let payload = read_json_body(response).await;
    assert_eq!(payload["status"], json!("OPEN"));
    assert_eq!(payload["proposals"], json!(0));
    assert_eq!(payload["created_by"], json!("officer-001"));
}

#[tokio::test]
async fn short_cover_letter_is_unprocessable() {
    let portal = portal();
    let token = login(&portal, "bidder@example.com");
    let router = portal_router(portal);

    let response = router
        .oneshot(json_request(
            "POST",
            "/api/v1/proposals",
            Some(&token.0),
            json!({
                "bid_id": "bid-001",
                "cover_letter": "Too short.",
                "proposed_budget": 100,
                "completion_days": 10,
                "files": ["proposal.pdf"],
            }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let payload = read_json_body(response).await;
    assert!(payload["error"]
        .as_str()
        .unwrap_or_default()
        .contains("50 characters"));
}

#[tokio::test]
async fn committee_saves_and_submits_evaluation() {
    let portal = portal();
    let token = login(&portal, "committee@example.com");
    let router = portal_router(portal);

    let saved = router
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/evaluations",
            Some(&token.0),
            json!({
                "proposal_id": "prop-001",
                "comments": "Solid plan",
                "criteria": scored_criteria(),
            }),
        ))
        .await
        .expect("route executes");
    assert_eq!(saved.status(), StatusCode::OK);
    let saved = read_json_body(saved).await;
    assert_eq!(saved["status"], json!("DRAFT"));
    assert_eq!(saved["score"], json!(8.55));
    let id = saved["id"].as_str().expect("evaluation id").to_string();

    let submit_uri = format!("/api/v1/evaluations/{id}/submit");
    let submitted = router
        .clone()
        .oneshot(json_request("POST", &submit_uri, Some(&token.0), json!({})))
        .await
        .expect("route executes");
    assert_eq!(submitted.status(), StatusCode::OK);
    let submitted = read_json_body(submitted).await;
    assert_eq!(submitted["status"], json!("SUBMITTED"));
    assert!(submitted["completed_at"].is_string());

    let again = router
        .oneshot(json_request("POST", &submit_uri, Some(&token.0), json!({})))
        .await
        .expect("route executes");
    assert_eq!(again.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn score_handler_reports_weight_warning() {
    let portal = portal();
    let token = login(&portal, "committee@example.com");
    let mut headers = axum::http::HeaderMap::new();
    headers.insert(
        SESSION_HEADER,
        token.0.parse().expect("token is a valid header value"),
    );
    let mut criteria: Vec<EvaluationCriterion> = scored_criteria();
    criteria[0].weight = 0.2;

    let response = score_handler(
        State(portal),
        headers,
        "/api/v1/evaluations/score".parse().expect("valid uri"),
        axum::Json(ScoreRequest { criteria }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["weights"]["valid"], json!(false));
    assert_eq!(
        payload["weight_warning"],
        json!("total weight should sum to 100% (currently 80%)")
    );
    assert_eq!(payload["breakdown"].as_array().map(Vec::len), Some(3));
}

#[tokio::test]
async fn admin_manages_users() {
    let portal = portal();
    let token = login(&portal, "admin@example.com");
    let router = portal_router(portal);

    let created = router
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/users",
            Some(&token.0),
            json!({
                "name": "Yonas Bidder",
                "email": "yonas@contractor.et",
                "role": "BIDDER",
            }),
        ))
        .await
        .expect("route executes");
    assert_eq!(created.status(), StatusCode::CREATED);
    let created = read_json_body(created).await;
    assert_eq!(created["verified"], json!(false));

    let duplicate = router
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/users",
            Some(&token.0),
            json!({
                "name": "Yonas Again",
                "email": "yonas@contractor.et",
                "role": "BIDDER",
            }),
        ))
        .await
        .expect("route executes");
    assert_eq!(duplicate.status(), StatusCode::CONFLICT);

    let verify_uri = format!(
        "/api/v1/users/{}/verify",
        created["id"].as_str().expect("user id")
    );
    let verified = router
        .oneshot(json_request("POST", &verify_uri, Some(&token.0), json!({})))
        .await
        .expect("route executes");
    assert_eq!(verified.status(), StatusCode::OK);
    assert_eq!(read_json_body(verified).await["verified"], json!(true));
}

#[tokio::test]
async fn role_switch_endpoint_is_capability_gated() {
    let portal = portal();
    let token = login(&portal, "bidder@example.com");
    let router = portal_router(portal);

    let response = router
        .oneshot(json_request(
            "POST",
            "/api/v1/session/role",
            Some(&token.0),
            json!({ "role": "ADMIN" }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
