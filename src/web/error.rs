use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use tracing::error;

use crate::core::StoreError;
use crate::service::ServiceError;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub code: String,
}

#[derive(Debug)]
pub enum WebError {
    Store(StoreError),
    Input(String),
    NotFound(String),
    Conflict(String),
}

impl From<StoreError> for WebError {
    fn from(err: StoreError) -> Self {
        WebError::Store(err)
    }
}

impl From<ServiceError> for WebError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Validation(message) => Self::Input(message),
            ServiceError::NotFound(message) => Self::NotFound(message),
            ServiceError::Conflict(message) => Self::Conflict(message),
            ServiceError::Store(err) => Self::Store(err),
        }
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let (status, message, code) = match self {
            WebError::Store(StoreError::DuplicateReference { kind, reference }) => (
                StatusCode::CONFLICT,
                format!("{kind} reference {reference} is already in use"),
                "conflict",
            ),
            WebError::Store(StoreError::DuplicateId { kind, id }) => (
                StatusCode::CONFLICT,
                format!("{kind} {id} already exists"),
                "conflict",
            ),
            WebError::Store(err) => {
                error!(error = %err, "store operation failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "database operation failed".to_string(),
                    "database_error",
                )
            }
            WebError::Input(msg) => (StatusCode::BAD_REQUEST, msg, "input_error"),
            WebError::NotFound(msg) => (StatusCode::NOT_FOUND, msg, "not_found"),
            WebError::Conflict(msg) => (StatusCode::CONFLICT, msg, "conflict"),
        };

        let body = Json(ErrorResponse {
            success: false,
            error: message,
            code: code.to_string(),
        });

        (status, body).into_response()
    }
}

pub type WebResult<T> = std::result::Result<T, WebError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EntityKind;

    #[test]
    fn service_errors_keep_their_category() {
        assert!(matches!(
            WebError::from(ServiceError::validation("nom must not be blank")),
            WebError::Input(_)
        ));
        assert!(matches!(
            WebError::from(ServiceError::not_found("client", 7)),
            WebError::NotFound(message) if message == "client not found: 7"
        ));
        assert!(matches!(
            WebError::from(ServiceError::conflict("taken")),
            WebError::Conflict(_)
        ));
    }

    #[test]
    fn duplicate_reference_maps_to_conflict() {
        let response = WebError::from(StoreError::DuplicateReference {
            kind: EntityKind::Mission,
            reference: "INT-2025-0001".to_string(),
        })
        .into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let response = WebError::from(StoreError::Serialization(
            serde_json::from_str::<u32>("nope").unwrap_err(),
        ))
        .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
