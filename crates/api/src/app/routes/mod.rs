use axum::{
    routing::{get, post},
    Router,
};

use crate::app::errors;

pub mod balances;
pub mod system;
pub mod transactions;

/// Router for the versioned ledger endpoints.
pub fn router() -> Router {
    Router::new()
        .route(
            "/transactions",
            post(transactions::create_transaction).fallback(method_not_allowed),
        )
        .route(
            "/users/:id/balance",
            get(balances::get_balance).fallback(method_not_allowed),
        )
}

pub async fn method_not_allowed() -> axum::response::Response {
    errors::json_error(
        axum::http::StatusCode::METHOD_NOT_ALLOWED,
        "method_not_allowed",
        "the method is not supported for this resource",
    )
}

pub async fn not_found() -> axum::response::Response {
    errors::not_found()
}
