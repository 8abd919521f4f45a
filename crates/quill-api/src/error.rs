use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::error;
use uuid::Uuid;

/// Request-level failure taxonomy. Validation and authorization failures are
/// advisory and leak nothing; store failures surface as a generic 500.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    /// Covers both "not yours" and "does not exist" for ownership-gated
    /// mutations; the two collapse into one denial on purpose.
    #[error("not permitted")]
    Denied,
    #[error("resource not found")]
    NotFound,
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

impl ApiError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Denied => (StatusCode::FORBIDDEN, "not permitted".to_string()),
            ApiError::NotFound => (StatusCode::NOT_FOUND, "resource not found".to_string()),
            ApiError::Store(err) => {
                error!("store failure: {err:#}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "operation failed".to_string(),
                )
            }
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

/// An ill-formed identity is indistinguishable from a missing record.
pub fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
    raw.parse().map_err(|_| ApiError::NotFound)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_ids_read_as_not_found() {
        assert!(matches!(parse_id("not-a-uuid"), Err(ApiError::NotFound)));
        assert!(parse_id("550e8400-e29b-41d4-a716-446655440000").is_ok());
    }
}
