use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::db::collections::StoreError;
use crate::services::loyalty::LoyaltyError;
use crate::services::ratings::RatingError;
use crate::services::scheduling::{Rejection, SchedulingError};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("storage error: {0}")]
    Storage(#[from] StoreError),

    #[error("{0}")]
    Rejected(Rejection),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Invalid(String),

    #[error("unauthorized")]
    Unauthorized,
}

impl From<SchedulingError> for AppError {
    fn from(e: SchedulingError) -> Self {
        match e {
            SchedulingError::Rejected(r) => AppError::Rejected(r),
            SchedulingError::NotFound => AppError::NotFound("booking".to_string()),
            SchedulingError::Storage(e) => AppError::Storage(e),
        }
    }
}

impl From<LoyaltyError> for AppError {
    fn from(e: LoyaltyError) -> Self {
        match e {
            LoyaltyError::NotEligible => AppError::Conflict(e.to_string()),
            LoyaltyError::PrizeNotFound => AppError::NotFound("prize".to_string()),
            LoyaltyError::Storage(e) => AppError::Storage(e),
        }
    }
}

impl From<RatingError> for AppError {
    fn from(e: RatingError) -> Self {
        match e {
            RatingError::NotFound => AppError::NotFound("booking".to_string()),
            RatingError::NotRateable | RatingError::InvalidScore => AppError::Invalid(e.to_string()),
            RatingError::Storage(e) => AppError::Storage(e),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Rejected(Rejection::SlotTaken) => StatusCode::CONFLICT,
            AppError::Rejected(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Invalid(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
        };

        if let AppError::Storage(e) = &self {
            tracing::error!(error = %e, "storage failure");
        }

        let body = match &self {
            AppError::Rejected(r) => serde_json::json!({ "error": self.to_string(), "code": r.code() }),
            _ => serde_json::json!({ "error": self.to_string() }),
        };
        (status, axum::Json(body)).into_response()
    }
}
