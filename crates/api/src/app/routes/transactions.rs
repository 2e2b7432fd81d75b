use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::app::{dto, errors, services::AppServices};

/// POST /v1/transactions
///
/// 201 when the deposit opened the account, 200 for every later transaction.
pub async fn create_transaction(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::TransactionRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(rejection) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "bad_request", rejection.body_text());
        }
    };

    let tx = match body.into_transaction() {
        Ok(tx) => tx,
        Err(e) => return errors::validation_error(&e),
    };

    match services.apply(tx).await {
        Ok(applied) => {
            let status = if applied.created {
                StatusCode::CREATED
            } else {
                StatusCode::OK
            };
            (status, Json(dto::BalanceResponse::from(applied.balance))).into_response()
        }
        Err(e) => errors::apply_error_to_response(e),
    }
}
