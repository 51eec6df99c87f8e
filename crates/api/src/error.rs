//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::{DomainError, StoreError};

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Bad request from the client.
    BadRequest(String),
    /// Missing or malformed identity headers.
    Unauthorized(String),
    /// Domain logic error.
    Domain(DomainError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, error_body(msg)),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, error_body(msg)),
            ApiError::Domain(err) => domain_error_to_response(err),
        };

        (status, axum::Json(body)).into_response()
    }
}

fn error_body(message: String) -> serde_json::Value {
    serde_json::json!({ "error": message })
}

fn domain_error_to_response(err: DomainError) -> (StatusCode, serde_json::Value) {
    let message = err.to_string();
    match err {
        DomainError::Validation(_) | DomainError::InvalidCartState(_) => {
            (StatusCode::BAD_REQUEST, error_body(message))
        }
        DomainError::NotFound { .. } => (StatusCode::NOT_FOUND, error_body(message)),
        DomainError::AccessDenied(_) => (StatusCode::FORBIDDEN, error_body(message)),
        DomainError::DuplicateRequest { .. }
        | DomainError::InvalidStateTransition { .. }
        | DomainError::Store(StoreError::Conflict(_)) => {
            (StatusCode::CONFLICT, error_body(message))
        }
        DomainError::InsufficientStock {
            item_id,
            item_name,
            available,
            requested,
        } => (
            StatusCode::CONFLICT,
            serde_json::json!({
                "error": message,
                "item_id": item_id,
                "item_name": item_name,
                "available": available,
                "requested": requested,
            }),
        ),
        DomainError::InternalConsistency(_) | DomainError::Store(_) => {
            tracing::error!(error = %message, "internal server error");
            (StatusCode::INTERNAL_SERVER_ERROR, error_body(message))
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError::Domain(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{ItemId, OrderId};

    fn status_of(err: DomainError) -> StatusCode {
        ApiError::from(err).into_response().status()
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            status_of(DomainError::Validation("cart is empty".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(DomainError::InvalidCartState("SKU-404".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(DomainError::not_found("Order", OrderId::new())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(DomainError::AccessDenied("not yours".into())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            status_of(DomainError::DuplicateRequest {
                order_id: OrderId::new()
            }),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(DomainError::Store(StoreError::Conflict("dup".into()))),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(DomainError::InternalConsistency("negative stock".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_insufficient_stock_body_names_the_item() {
        let response = ApiError::from(DomainError::InsufficientStock {
            item_id: ItemId::new("SKU-001"),
            item_name: "Widget".to_string(),
            available: 2,
            requested: 5,
        })
        .into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["item_id"], "SKU-001");
        assert_eq!(json["item_name"], "Widget");
        assert_eq!(json["available"], 2);
        assert_eq!(json["requested"], 5);
    }
}
