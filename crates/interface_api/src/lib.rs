//! HTTP API Layer
//!
//! This crate provides the REST API for the lead marketplace using Axum.
//!
//! # Architecture
//!
//! - **Handlers**: jobs, claims, payment confirmations, health
//! - **Middleware**: Authentication, tracing, audit logging
//! - **DTOs**: Request/Response data transfer objects
//! - **Error Handling**: Consistent error responses
//!
//! Payment confirmation routes are public: the provider's webhook and the
//! browser return redirect cannot carry our bearer tokens. Everything under
//! `/api/v1` requires a JWT.
//!
//! # Example
//!
//! ```rust,ignore
//! use interface_api::create_router;
//!
//! let app = create_router(coordinator, config);
//! axum::serve(listener, app).await?;
//! ```

pub mod auth;
pub mod config;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;

use std::sync::Arc;

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use domain_leads::LeadClaimCoordinator;

use crate::config::ApiConfig;
use crate::handlers::{claims, health, jobs, payments};
use crate::middleware::{audit_middleware, auth_middleware};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub coordinator: Arc<LeadClaimCoordinator>,
    pub config: ApiConfig,
}

/// Creates the main API router
///
/// # Arguments
///
/// * `coordinator` - The lead claim coordinator wired to its store and gateway
/// * `config` - API configuration
///
/// # Returns
///
/// Configured Axum router with all routes and middleware
pub fn create_router(coordinator: Arc<LeadClaimCoordinator>, config: ApiConfig) -> Router {
    let state = AppState {
        coordinator,
        config,
    };

    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check))
        .route("/payments/webhook", post(payments::payment_webhook))
        .route("/payments/return", get(payments::payment_return));

    // Job routes
    let job_routes = Router::new()
        .route("/", post(jobs::create_job))
        .route("/", get(jobs::list_jobs))
        .route("/:id", get(jobs::get_job))
        .route("/:id/events", post(jobs::post_event));

    // Claim routes
    let claim_routes = Router::new().route("/", post(claims::claim_job));

    // Protected API routes
    let api_routes = Router::new()
        .nest("/jobs", job_routes)
        .nest("/claims", claim_routes)
        .route("/payment-sessions", post(claims::create_payment_session))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            audit_middleware,
        ))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    // Combine all routes
    Router::new()
        .merge(public_routes)
        .nest("/api/v1", api_routes)
        .layer(
            ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            ),
        )
        .with_state(state)
}
