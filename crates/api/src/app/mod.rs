//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: picks the balance store and builds the ledger engine
//! - `routes/`: HTTP routes + handlers
//! - `dto.rs`: request/response DTOs and input validation
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{routing::get, Extension, Router};
use tower::ServiceBuilder;

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router (public entrypoint used by `main.rs` and tests).
pub fn build_app(services: Arc<services::AppServices>) -> Router {
    Router::new()
        .route(
            "/health",
            get(routes::system::health).fallback(routes::method_not_allowed),
        )
        .nest("/v1", routes::router())
        .fallback(routes::not_found)
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn(middleware::trace_requests))
                .layer(Extension(services)),
        )
}
