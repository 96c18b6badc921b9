//! integration tests for the `/auth/*` decision endpoints

mod common;

use std::sync::Arc;

use axum::http::StatusCode;
use serde_json::json;
use tower::ServiceExt;

use quadscale::create_app;
use quadscale_types::PolicyDecision;
use quadscale_zones::{ZoneDefinition, ZonePolicy};

use common::{body_json, post_json, test_app, test_state, ScriptedTransport, STUDENT_TOKEN};

#[derive(Debug, serde::Deserialize)]
struct ZoneDecisionBody {
    allowed: bool,
    reason: String,
}

#[tokio::test]
async fn test_evaluate_allows_student_service_access() {
    let app = test_app();

    let response = app
        .oneshot(post_json(
            "/auth/evaluate",
            &json!({
                "subject": "alice",
                "role": "student",
                "action": "service.access",
                "resource": "printing",
            }),
        ))
        .await
        .expect("request failed");
    assert_eq!(response.status(), StatusCode::OK);

    let decision: PolicyDecision = body_json(response).await;
    assert!(decision.allowed, "{}", decision.reason);
    assert_eq!(decision.role, "student");
}

#[tokio::test]
async fn test_evaluate_denies_guest_registration() {
    let app = test_app();

    let response = app
        .oneshot(post_json(
            "/auth/evaluate",
            &json!({
                "subject": "visitor",
                "role": "guest",
                "action": "service.register",
                "resource": "printing",
            }),
        ))
        .await
        .expect("request failed");

    let decision: PolicyDecision = body_json(response).await;
    assert!(!decision.allowed);
}

#[tokio::test]
async fn test_authorize_without_trust_is_denied_not_errored() {
    let app = test_app();

    let response = app
        .oneshot(post_json(
            "/auth/authorize",
            &json!({
                "source_realm": "realm-other",
                "remote_role": "teacher",
                "subject": "bob",
                "action": "access",
                "resource": "printing",
            }),
        ))
        .await
        .expect("request failed");
    assert_eq!(response.status(), StatusCode::OK);

    let decision: PolicyDecision = body_json(response).await;
    assert!(!decision.allowed);
    assert!(decision.reason.contains("no trust"));
}

#[tokio::test]
async fn test_zone_check_rejects_unknown_token() {
    let app = test_app();

    let response = app
        .oneshot(post_json(
            "/auth/zone-check",
            &json!({"token": "bogus", "zone": "lab"}),
        ))
        .await
        .expect("request failed");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_zone_check_allows_entitled_zone() {
    let state = test_state(Arc::new(ScriptedTransport::default()));
    state
        .zones
        .register_zone(ZoneDefinition {
            id: "lab".to_string(),
            name: "Lab".to_string(),
            subnet: None,
            access_level: 0,
            description: String::new(),
        })
        .expect("zone registration failed");
    let app = create_app(state);

    let response = app
        .oneshot(post_json(
            "/auth/zone-check",
            &json!({"token": STUDENT_TOKEN, "zone": "lab"}),
        ))
        .await
        .expect("request failed");
    assert_eq!(response.status(), StatusCode::OK);

    let decision: ZoneDecisionBody = body_json(response).await;
    assert!(decision.allowed, "{}", decision.reason);
}

#[tokio::test]
async fn test_zone_check_enforces_deny_list() {
    let state = test_state(Arc::new(ScriptedTransport::default()));
    state
        .zones
        .register_zone(ZoneDefinition {
            id: "lab".to_string(),
            name: "Lab".to_string(),
            subnet: None,
            access_level: 0,
            description: String::new(),
        })
        .expect("zone registration failed");
    state
        .zones
        .set_policy(ZonePolicy {
            zone_id: "lab".to_string(),
            allowed_roles: vec!["student".to_string()],
            allowed_users: vec![],
            denied_users: vec!["alice".to_string()],
            allowed_from: vec![],
            require_zone_auth: false,
            time_restrictions: vec![],
        })
        .expect("policy failed");
    let app = create_app(state);

    let response = app
        .oneshot(post_json(
            "/auth/zone-check",
            &json!({"token": STUDENT_TOKEN, "zone": "lab"}),
        ))
        .await
        .expect("request failed");

    let decision: ZoneDecisionBody = body_json(response).await;
    assert!(!decision.allowed);
}
