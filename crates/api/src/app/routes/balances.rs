use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use simpleledger_core::AccountId;

use crate::app::{dto, errors, services::AppServices};

/// GET /v1/users/:id/balance
pub async fn get_balance(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    // Unparsable and nil ids can never name an account.
    let account_id = match id.parse::<AccountId>() {
        Ok(id) if !id.is_nil() => id,
        _ => return errors::not_found(),
    };

    match services.balance(account_id).await {
        Ok(Some(balance)) => {
            (StatusCode::OK, Json(dto::BalanceResponse::from(balance))).into_response()
        }
        Ok(None) => errors::not_found(),
        Err(e) => errors::store_error_to_response(e),
    }
}
