/// Error types for thought-service
///
/// Every failure a handler can return is an [`AppError`]; actix renders it as
/// `{ "error": <message>, "status": <code> }`.
use crate::db::StoreError;
use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use resilience::RetryError;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AppError {
    /// Request failed validation; the store was not touched
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    /// Store still failing after the retry budget was spent
    #[error("{0}")]
    StoreUnavailable(String),

    #[error("{0}")]
    Internal(String),
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();

        HttpResponse::build(status).json(serde_json::json!({
            "error": self.to_string(),
            "status": status.as_u16(),
        }))
    }
}

impl From<RetryError<StoreError>> for AppError {
    fn from(err: RetryError<StoreError>) -> Self {
        match err {
            RetryError::Exhausted {
                attempts,
                last_error,
            } => {
                tracing::error!(
                    attempts,
                    error = %last_error,
                    "Store operation failed after retries"
                );
                AppError::StoreUnavailable(
                    "Database connection error. Please try again later.".to_string(),
                )
            }
            RetryError::Aborted(err) => {
                tracing::error!(error = %err, "Store rejected operation");
                AppError::Internal("Request failed. Please try again.".to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[test]
    fn status_codes() {
        assert_eq!(
            AppError::Validation("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::NotFound("x".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::StoreUnavailable("x".into()).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            AppError::Internal("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn retry_outcomes_map_to_distinct_errors() {
        let exhausted = RetryError::Exhausted {
            attempts: 3,
            last_error: StoreError::Unavailable("connection refused".into()),
        };
        assert!(matches!(
            AppError::from(exhausted),
            AppError::StoreUnavailable(_)
        ));

        let aborted = RetryError::Aborted(StoreError::Rejected("check violation".into()));
        assert!(matches!(AppError::from(aborted), AppError::Internal(_)));
    }

    #[actix_web::test]
    async fn error_body_carries_message_and_status() {
        let resp = AppError::Validation("Content is required".into()).error_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body = to_bytes(resp.into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "Content is required");
        assert_eq!(json["status"], 400);
    }
}
