use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use shared::FieldErrors;

use crate::service::ServiceError;
use crate::store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("validation failed")]
    Validation(FieldErrors),
    #[error("{0}")]
    NotFound(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        Self::Validation(FieldErrors::from([(field.to_string(), message.into())]))
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

fn error_body(status: StatusCode, message: &str) -> serde_json::Value {
    json!({
        "ErrorMessage": message,
        "ErrorCode": status.to_string(),
    })
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            Self::Validation(errors) => (status, Json(errors)).into_response(),
            Self::NotFound(message) => (status, Json(error_body(status, &message))).into_response(),
            Self::Internal(detail) => {
                tracing::error!(%detail, "request failed");
                (status, Json(error_body(status, "An internal error occurred"))).into_response()
            }
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(error: StoreError) -> Self {
        Self::Internal(error.to_string())
    }
}

impl From<ServiceError> for ApiError {
    fn from(error: ServiceError) -> Self {
        match error {
            ServiceError::NotFound(_) => Self::NotFound(error.to_string()),
            ServiceError::Store(error) => error.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use rstest::rstest;

    async fn body_json(error: ApiError) -> (StatusCode, serde_json::Value) {
        let response = error.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn validation_maps_fields_to_messages() {
        let (status, body) = body_json(ApiError::field("title", "must not be blank")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "title": "must not be blank" }));
    }

    #[tokio::test]
    async fn not_found_reports_its_own_status() {
        let (status, body) = body_json(ServiceError::NotFound(7).into()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["ErrorMessage"], "Task not found with id 7");
        assert_eq!(body["ErrorCode"], "404 Not Found");
    }

    #[tokio::test]
    async fn internal_errors_hide_details() {
        let error: ApiError = StoreError::from(rusqlite::Error::InvalidQuery).into();
        let (status, body) = body_json(error).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["ErrorMessage"], "An internal error occurred");
    }

    #[rstest]
    #[case(ApiError::field("body", "x"), StatusCode::BAD_REQUEST)]
    #[case(ApiError::NotFound("x".into()), StatusCode::NOT_FOUND)]
    #[case(ApiError::Internal("x".into()), StatusCode::INTERNAL_SERVER_ERROR)]
    fn status_per_variant(#[case] error: ApiError, #[case] expected: StatusCode) {
        assert_eq!(error.status(), expected);
    }
}
