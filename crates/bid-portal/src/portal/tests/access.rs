use super::common::*;
use std::sync::Arc;

use crate::portal::access::{
    authorize, AccessGate, Decision, GateOutcome, GateState, Role, RouteAccess, RouteTable,
    SessionError, SessionToken,
};
use crate::portal::users::{UserId, UserUpdate};

fn token() -> SessionToken {
    SessionToken("fixture-token".to_string())
}

#[test]
fn anonymous_visitor_is_sent_to_login_with_return_path() {
    let decision = authorize(None, "/dashboard/admin/users", &[Role::Admin]);

    assert_eq!(
        decision,
        Decision::RedirectLogin {
            return_to: "/dashboard/admin/users".to_string()
        }
    );
    assert_eq!(
        decision.location().as_deref(),
        Some("/auth/login?redirect=%2Fdashboard%2Fadmin%2Fusers")
    );
}

#[test]
fn role_mismatch_redirects_home_without_error() {
    let bidder = session("bidder-001", Role::Bidder);
    let decision = authorize(Some(&bidder), "/dashboard/admin/users", &[Role::Admin]);

    assert_eq!(
        decision,
        Decision::RedirectHome {
            location: "/dashboard/bidder".to_string()
        }
    );
}

#[test]
fn empty_role_set_admits_any_session() {
    let admin = session("admin-001", Role::Admin);
    assert_eq!(authorize(Some(&admin), "/settings", &[]), Decision::Render);
}

#[test]
fn authorize_does_not_alter_the_session() {
    let officer = session("officer-001", Role::Officer);
    let before = officer.clone();
    let _ = authorize(Some(&officer), "/dashboard/admin", &[Role::Admin]);
    assert_eq!(officer, before);
}

#[test]
fn every_landing_page_is_reachable_for_its_role() {
    let table = RouteTable::portal();
    for role in Role::ALL {
        let landing = role.landing_page();
        let active = session("someone", role);
        let decision = match table.lookup(&landing) {
            RouteAccess::Public => Decision::Render,
            RouteAccess::Protected(roles) => {
                authorize(Some(&active), &landing, &roles)
            }
        };
        assert_eq!(decision, Decision::Render, "{role} landing page {landing}");
    }
}

#[test]
fn loading_gate_shows_placeholder_until_resolved() {
    let state = GateState::mount();
    assert_eq!(state.outcome("/dashboard"), GateOutcome::Placeholder);

    let resolved = state.resolve(Ok(Some(session("admin-001", Role::Admin))), &[]);
    assert_eq!(
        resolved.outcome("/dashboard"),
        GateOutcome::Navigate(Decision::Render)
    );
}

#[test]
fn resolved_gate_ignores_late_lookups() {
    let state = GateState::mount().resolve(Ok(None), &[Role::Admin]);
    let again = state
        .clone()
        .resolve(Ok(Some(session("admin-001", Role::Admin))), &[Role::Admin]);
    assert_eq!(again, GateState::Anonymous);
}

#[test]
fn corrupted_session_fails_open_to_login() {
    let resolver = Arc::new(StaticResolver::new(Err(SessionError::Corrupted(
        "unexpected token".to_string(),
    ))));
    let gate = AccessGate::new(resolver, RouteTable::portal());

    let (decision, session) = gate.guard(Some(&token()), "/dashboard/officer", &[Role::Officer]);

    assert_eq!(
        decision,
        Decision::RedirectLogin {
            return_to: "/dashboard/officer".to_string()
        }
    );
    assert!(session.is_none());
}

#[test]
fn navigate_uses_route_table() {
    let resolver = Arc::new(StaticResolver::new(Ok(Some(session(
        "committee-001",
        Role::Committee,
    )))));
    let gate = AccessGate::new(resolver, RouteTable::portal());

    assert_eq!(gate.navigate(None, "/bids/bid-001"), Decision::Render);
    assert_eq!(
        gate.navigate(Some(&token()), "/dashboard/committee/evaluations"),
        Decision::Render
    );
    assert_eq!(
        gate.navigate(Some(&token()), "/dashboard/officer/bids"),
        Decision::RedirectHome {
            location: "/dashboard/committee".to_string()
        }
    );
    assert_eq!(
        gate.navigate(None, "/dashboard"),
        Decision::RedirectLogin {
            return_to: "/dashboard".to_string()
        }
    );
}

#[test]
fn login_destination_only_replays_permitted_local_paths() {
    let resolver = Arc::new(StaticResolver::new(Ok(None)));
    let gate = AccessGate::new(resolver, RouteTable::portal());
    let bidder = session("bidder-001", Role::Bidder);

    assert_eq!(
        gate.login_destination(&bidder, Some("/dashboard/bidder/proposals")),
        "/dashboard/bidder/proposals"
    );
    assert_eq!(
        gate.login_destination(&bidder, Some("/dashboard/admin/users")),
        "/dashboard/bidder"
    );
    assert_eq!(
        gate.login_destination(&bidder, Some("https://evil.example/phish")),
        "/dashboard/bidder"
    );
    assert_eq!(
        gate.login_destination(&bidder, Some("//evil.example")),
        "/dashboard/bidder"
    );
    assert_eq!(gate.login_destination(&bidder, None), "/dashboard/bidder");
}

#[test]
fn role_switch_changes_gate_outcome() {
    let portal = portal_with_role_switching();
    let token = login(&portal, "bidder@example.com");

    let (before, _) = portal
        .gate
        .guard(Some(&token), "/dashboard/admin", &[Role::Admin]);
    assert!(matches!(before, Decision::RedirectHome { .. }));

    portal
        .sessions
        .switch_role(&token, Role::Admin)
        .expect("switching enabled");
    let (after, session) = portal
        .gate
        .guard(Some(&token), "/dashboard/admin", &[Role::Admin]);
    assert_eq!(after, Decision::Render);
    assert_eq!(session.map(|s| s.role), Some(Role::Admin));
}

#[test]
fn mixed_case_paths_are_still_protected() {
    let portal = portal();

    assert_eq!(
        portal.gate.navigate(None, "/Dashboard/Admin/users"),
        Decision::RedirectLogin {
            return_to: "/Dashboard/Admin/users".to_string()
        }
    );

    let token = login(&portal, "bidder@example.com");
    assert_eq!(
        portal.gate.navigate(Some(&token), "/DASHBOARD/admin/users"),
        Decision::RedirectHome {
            location: "/dashboard/bidder".to_string()
        }
    );
}

#[test]
fn deleted_account_loses_its_open_session() {
    let portal = portal();
    let token = login(&portal, "admin@example.com");
    assert_eq!(
        portal.gate.navigate(Some(&token), "/dashboard/admin/users"),
        Decision::Render
    );

    portal
        .users
        .delete(&UserId("admin-001".to_string()))
        .expect("delete admin");

    assert_eq!(
        portal.gate.navigate(Some(&token), "/dashboard/admin/users"),
        Decision::RedirectLogin {
            return_to: "/dashboard/admin/users".to_string()
        }
    );
}

#[test]
fn role_change_applies_to_open_session() {
    let portal = portal();
    let token = login(&portal, "officer@example.com");

    portal
        .users
        .update(
            &UserId("officer-001".to_string()),
            UserUpdate {
                role: Some(Role::Bidder),
                ..UserUpdate::default()
            },
        )
        .expect("demote officer");

    assert_eq!(
        portal.gate.navigate(Some(&token), "/dashboard/officer/bids"),
        Decision::RedirectHome {
            location: "/dashboard/bidder".to_string()
        }
    );
}
