//! HTTP API tests over the in-memory store and mock gateway

use std::sync::Arc;

use axum_test::TestServer;
use serde_json::{json, Value};
use uuid::Uuid;

use domain_leads::LeadClaimCoordinator;
use infra_payments::MockPaymentGateway;
use infra_store::InMemoryLeadStore;
use interface_api::auth::{create_token, roles};
use interface_api::config::ApiConfig;
use interface_api::create_router;

struct TestApp {
    server: TestServer,
    gateway: Arc<MockPaymentGateway>,
    config: ApiConfig,
}

fn spawn_app() -> TestApp {
    let store = Arc::new(InMemoryLeadStore::new());
    let gateway = Arc::new(MockPaymentGateway::new());
    let config = ApiConfig {
        jwt_secret: "test-secret".to_string(),
        ..ApiConfig::default()
    };
    let coordinator = Arc::new(LeadClaimCoordinator::new(store, gateway.clone()));
    let server = TestServer::new(create_router(coordinator, config.clone())).unwrap();
    TestApp {
        server,
        gateway,
        config,
    }
}

impl TestApp {
    fn token(&self, user: Uuid, role: &str) -> String {
        create_token(
            &user.to_string(),
            vec![role.to_string()],
            &self.config.jwt_secret,
            300,
        )
        .unwrap()
    }

    async fn create_job(&self, owner: Uuid) -> Uuid {
        let response = self
            .server
            .post("/api/v1/jobs")
            .authorization_bearer(&self.token(owner, roles::HOMEOWNER))
            .json(&json!({
                "category": "electrical",
                "title": "Replace breaker panel",
                "description": "Old fuse box, frequent trips"
            }))
            .await;
        response.assert_status(axum::http::StatusCode::CREATED);
        let body: Value = response.json();
        body["id"].as_str().unwrap().parse().unwrap()
    }

    /// Opens a claim session for the pro and pays it; returns the session id
    async fn paid_session(&self, job: Uuid, pro: Uuid) -> String {
        let response = self
            .server
            .post("/api/v1/claims")
            .authorization_bearer(&self.token(pro, roles::PRO))
            .json(&json!({ "jobId": job }))
            .await;
        response.assert_status_ok();
        let body: Value = response.json();
        let session_id = body["sessionId"].as_str().unwrap().to_string();
        self.gateway.complete_session(&session_id.clone().into()).await;
        session_id
    }

    async fn webhook(&self, job: Uuid, pro: Uuid, session: &str, outcome: &str) -> Value {
        let response = self
            .server
            .post("/payments/webhook")
            .json(&json!({
                "jobId": job,
                "proId": pro,
                "sessionId": session,
                "outcome": outcome
            }))
            .await;
        response.assert_status_ok();
        response.json()
    }
}

#[tokio::test]
async fn test_health_is_public_and_api_is_not() {
    let app = spawn_app();

    app.server.get("/health").await.assert_status_ok();
    app.server.get("/health/ready").await.assert_status_ok();

    let response = app.server.get("/api/v1/jobs").await;
    response.assert_status(axum::http::StatusCode::UNAUTHORIZED);

    let response = app
        .server
        .get("/api/v1/jobs")
        .authorization_bearer("not-a-token")
        .await;
    response.assert_status(axum::http::StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_claim_flow_end_to_end() {
    let app = spawn_app();
    let (owner, pro) = (Uuid::new_v4(), Uuid::new_v4());
    let job = app.create_job(owner).await;

    let response = app
        .server
        .post("/api/v1/claims")
        .authorization_bearer(&app.token(pro, roles::PRO))
        .json(&json!({ "jobId": job }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert!(body["checkoutUrl"].as_str().unwrap().starts_with("https://"));
    let session = body["sessionId"].as_str().unwrap().to_string();

    app.gateway.complete_session(&session.clone().into()).await;
    let confirmation = app.webhook(job, pro, &session, "completed").await;
    assert_eq!(confirmation["result"], "finalized");
    assert_eq!(confirmation["claimCount"], 1);
    assert_eq!(confirmation["jobStatus"], "partially_claimed");
    assert_eq!(confirmation["alreadyFinalized"], false);

    let listing = app
        .server
        .get("/api/v1/jobs")
        .authorization_bearer(&app.token(pro, roles::PRO))
        .await;
    listing.assert_status_ok();
    let jobs: Value = listing.json();
    assert_eq!(jobs[0]["claimCount"], 1);
    assert_eq!(jobs[0]["status"], "partially_claimed");
}

#[tokio::test]
async fn test_webhook_is_idempotent() {
    let app = spawn_app();
    let (owner, pro) = (Uuid::new_v4(), Uuid::new_v4());
    let job = app.create_job(owner).await;
    let session = app.paid_session(job, pro).await;

    let first = app.webhook(job, pro, &session, "completed").await;
    let replay = app.webhook(job, pro, &session, "completed").await;

    assert_eq!(first["result"], "finalized");
    assert_eq!(replay["result"], "finalized");
    assert_eq!(replay["claimId"], first["claimId"]);
    assert_eq!(replay["claimCount"], 1);
    assert_eq!(replay["alreadyFinalized"], true);
}

#[tokio::test]
async fn test_webhook_ignores_unpaid_sessions() {
    let app = spawn_app();
    let (owner, pro) = (Uuid::new_v4(), Uuid::new_v4());
    let job = app.create_job(owner).await;

    // Provider says cancelled: no finalize attempt at all.
    let confirmation = app.webhook(job, pro, "cs_whatever", "cancelled").await;
    assert_eq!(confirmation["result"], "ignored");

    // Provider says completed but the gateway does not: ignored, no claim.
    let confirmation = app.webhook(job, pro, "cs_forged", "completed").await;
    assert_eq!(confirmation["result"], "ignored");

    let detail = app
        .server
        .get(&format!("/api/v1/jobs/{job}"))
        .authorization_bearer(&app.token(owner, roles::HOMEOWNER))
        .await;
    let body: Value = detail.json();
    assert_eq!(body["claimCount"], 0);
    assert_eq!(body["status"], "open");
}

#[tokio::test]
async fn test_third_paid_session_is_refused_and_refunded() {
    let app = spawn_app();
    let owner = Uuid::new_v4();
    let job = app.create_job(owner).await;
    let (pro_a, pro_b, pro_c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());

    let session_a = app.paid_session(job, pro_a).await;
    let session_b = app.paid_session(job, pro_b).await;
    let session_c = app.paid_session(job, pro_c).await;

    assert_eq!(app.webhook(job, pro_a, &session_a, "completed").await["result"], "finalized");
    let second = app.webhook(job, pro_b, &session_b, "completed").await;
    assert_eq!(second["jobStatus"], "full");

    let third = app.webhook(job, pro_c, &session_c, "completed").await;
    assert_eq!(third["result"], "capExceeded");
    assert_eq!(third["refundIssued"], true);
    assert_eq!(app.gateway.refund_calls(&session_c.into()).await, 1);

    // The job is full; new claim requests are turned away up front.
    let late = app
        .server
        .post("/api/v1/claims")
        .authorization_bearer(&app.token(Uuid::new_v4(), roles::PRO))
        .json(&json!({ "jobId": job }))
        .await;
    late.assert_status(axum::http::StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_return_redirect_confirms_too() {
    let app = spawn_app();
    let (owner, pro) = (Uuid::new_v4(), Uuid::new_v4());
    let job = app.create_job(owner).await;
    let session = app.paid_session(job, pro).await;

    let response = app
        .server
        .get("/payments/return")
        .add_query_param("jobId", job)
        .add_query_param("proId", pro)
        .add_query_param("sessionId", &session)
        .add_query_param("outcome", "completed")
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["result"], "finalized");
}

#[tokio::test]
async fn test_claimants_visible_only_to_owner() {
    let app = spawn_app();
    let (owner, pro) = (Uuid::new_v4(), Uuid::new_v4());
    let job = app.create_job(owner).await;
    let session = app.paid_session(job, pro).await;
    app.webhook(job, pro, &session, "completed").await;

    let as_owner = app
        .server
        .get(&format!("/api/v1/jobs/{job}"))
        .authorization_bearer(&app.token(owner, roles::HOMEOWNER))
        .await;
    let body: Value = as_owner.json();
    assert_eq!(body["claimedBy"], json!([pro]));

    let as_pro = app
        .server
        .get(&format!("/api/v1/jobs/{job}"))
        .authorization_bearer(&app.token(pro, roles::PRO))
        .await;
    let body: Value = as_pro.json();
    assert!(body.get("claimedBy").is_none());
    assert_eq!(body["claimCount"], 1);
}

#[tokio::test]
async fn test_role_enforcement() {
    let app = spawn_app();
    let user = Uuid::new_v4();

    let response = app
        .server
        .post("/api/v1/jobs")
        .authorization_bearer(&app.token(user, roles::PRO))
        .json(&json!({
            "category": "hvac",
            "title": "Fix furnace",
            "description": "No heat upstairs"
        }))
        .await;
    response.assert_status(axum::http::StatusCode::FORBIDDEN);

    let response = app
        .server
        .post("/api/v1/claims")
        .authorization_bearer(&app.token(user, roles::HOMEOWNER))
        .json(&json!({ "jobId": Uuid::new_v4() }))
        .await;
    response.assert_status(axum::http::StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_service_route_takes_identity_from_body() {
    let app = spawn_app();
    let owner = Uuid::new_v4();
    let job = app.create_job(owner).await;
    let pro = Uuid::new_v4();

    let response = app
        .server
        .post("/api/v1/payment-sessions")
        .authorization_bearer(&app.token(Uuid::new_v4(), roles::SERVICE))
        .json(&json!({ "jobId": job, "proId": pro }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert!(body["url"].as_str().unwrap().contains("checkout"));
}

#[tokio::test]
async fn test_job_events_drive_the_workflow() {
    let app = spawn_app();
    let owner = Uuid::new_v4();
    let job = app.create_job(owner).await;
    let owner_token = app.token(owner, roles::HOMEOWNER);

    let pro = Uuid::new_v4();
    let session = app.paid_session(job, pro).await;
    app.webhook(job, pro, &session, "completed").await;

    let response = app
        .server
        .post(&format!("/api/v1/jobs/{job}/events"))
        .authorization_bearer(&owner_token)
        .json(&json!({ "event": "negotiate" }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "negotiating");

    // A job only closes after a hire; from negotiating this is a conflict.
    let response = app
        .server
        .post(&format!("/api/v1/jobs/{job}/events"))
        .authorization_bearer(&owner_token)
        .json(&json!({ "event": "close" }))
        .await;
    response.assert_status(axum::http::StatusCode::CONFLICT);

    let response = app
        .server
        .post(&format!("/api/v1/jobs/{job}/events"))
        .authorization_bearer(&owner_token)
        .json(&json!({ "event": "renovate" }))
        .await;
    response.assert_status(axum::http::StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_job_validation() {
    let app = spawn_app();
    let response = app
        .server
        .post("/api/v1/jobs")
        .authorization_bearer(&app.token(Uuid::new_v4(), roles::HOMEOWNER))
        .json(&json!({
            "category": "roofing",
            "title": "",
            "description": "Missing shingles"
        }))
        .await;
    response.assert_status(axum::http::StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_unknown_job_is_404() {
    let app = spawn_app();
    let response = app
        .server
        .get(&format!("/api/v1/jobs/{}", Uuid::new_v4()))
        .authorization_bearer(&app.token(Uuid::new_v4(), roles::HOMEOWNER))
        .await;
    response.assert_status(axum::http::StatusCode::NOT_FOUND);
}
