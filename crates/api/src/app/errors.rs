use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde_json::json;

use simpleledger_core::{DomainError, ValidationErrors};
use simpleledger_infra::{ApplyError, BalanceStoreError};

pub fn apply_error_to_response(err: ApplyError) -> Response {
    match err {
        ApplyError::Rejected(e) => domain_error_to_response(e),
        ApplyError::Busy { .. } => {
            tracing::warn!(error = %err, "transaction gave up after repeated conflicts");
            let mut res = json_error(
                StatusCode::SERVICE_UNAVAILABLE,
                "busy",
                "account is busy, try again",
            );
            res.headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from_static("1"));
            res
        }
        ApplyError::Store(e) => store_error_to_response(e),
    }
}

pub fn domain_error_to_response(err: DomainError) -> Response {
    match err {
        DomainError::InsufficientFunds { .. } => json_error(
            StatusCode::BAD_REQUEST,
            "insufficient_funds",
            "insufficient funds",
        ),
        DomainError::InvariantViolation(msg) => {
            json_error(StatusCode::UNPROCESSABLE_ENTITY, "invariant_violation", msg)
        }
        DomainError::Validation(msg) | DomainError::InvalidId(msg) => {
            json_error(StatusCode::UNPROCESSABLE_ENTITY, "validation_error", msg)
        }
    }
}

pub fn store_error_to_response(err: BalanceStoreError) -> Response {
    match err {
        BalanceStoreError::Timeout { .. } => json_error(
            StatusCode::SERVICE_UNAVAILABLE,
            "timeout",
            "the request timed out, try again",
        ),
        other => {
            // Details stay in the log.
            tracing::error!(error = %other, "balance store failure");
            server_error()
        }
    }
}

pub fn validation_error(errors: &ValidationErrors) -> Response {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        axum::Json(json!({
            "error": "validation_error",
            "message": "request failed validation",
            "fields": errors.fields(),
        })),
    )
        .into_response()
}

pub fn not_found() -> Response {
    json_error(
        StatusCode::NOT_FOUND,
        "not_found",
        "the requested resource could not be found",
    )
}

pub fn server_error() -> Response {
    json_error(
        StatusCode::INTERNAL_SERVER_ERROR,
        "server_error",
        "the server encountered a problem and could not process the request",
    )
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use simpleledger_core::AccountId;

    use super::*;

    #[test]
    fn insufficient_funds_is_a_bad_request() {
        let res = apply_error_to_response(ApplyError::Rejected(DomainError::insufficient_funds(
            AccountId::new(),
            10,
            20,
        )));
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn busy_asks_the_client_to_retry() {
        let res = apply_error_to_response(ApplyError::Busy {
            account_id: AccountId::new(),
            attempts: 5,
        });
        assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(res.headers()[header::RETRY_AFTER], "1");
    }

    #[test]
    fn timeout_is_unavailable_and_backend_failure_is_internal() {
        let timeout = store_error_to_response(BalanceStoreError::Timeout {
            operation: "get",
            after: Duration::from_secs(3),
        });
        assert_eq!(timeout.status(), StatusCode::SERVICE_UNAVAILABLE);

        let backend = store_error_to_response(BalanceStoreError::Backend("boom".into()));
        assert_eq!(backend.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn overflow_is_a_client_error() {
        let res = domain_error_to_response(DomainError::invariant("balance overflow"));
        assert!(res.status().is_client_error());
    }
}
