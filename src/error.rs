//! Service-level error type and its HTTP mapping.
//!
//! Every handler returns `Result<_, AppError>`; the `IntoResponse` impl
//! produces the `{ "success": false, "message": ... }` body the
//! storefront expects. Database and internal errors are logged and
//! collapsed to a generic message so SQL detail never reaches a client.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use sqlx::error::{DatabaseError, ErrorKind};
use thiserror::Error;
use tracing::error;

use crate::checkout::payload::PayloadError;
use crate::checkout::receipt::ReceiptError;
use crate::domain::aggregates::checkout::CheckoutError;
use crate::domain::aggregates::order::OrderError;
use crate::domain::value_objects::PhoneError;
use crate::storage::StorageError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("unauthorized")]
    Unauthorized,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Protected(String),

    #[error("object storage is not configured")]
    StorageUnavailable,

    #[error("storage error: {0}")]
    Storage(StorageError),

    #[error("database error: {0}")]
    Sql(sqlx::Error),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Protected(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::StorageUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            Self::Storage(_) | Self::Sql(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!(error = %self, "request failed");
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        (status, Json(json!({ "success": false, "message": message }))).into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(error: sqlx::Error) -> Self {
        if matches!(error, sqlx::Error::RowNotFound) {
            return Self::NotFound("record");
        }

        match error.as_database_error().map(DatabaseError::kind) {
            Some(ErrorKind::UniqueViolation) => Self::Conflict("resource already exists".into()),
            Some(ErrorKind::ForeignKeyViolation) => {
                Self::Validation("referenced resource does not exist".into())
            }
            Some(ErrorKind::NotNullViolation) => Self::Validation("missing required data".into()),
            Some(ErrorKind::CheckViolation) => Self::Validation("invalid data".into()),
            _ => Self::Sql(error),
        }
    }
}

impl From<StorageError> for AppError {
    fn from(error: StorageError) -> Self {
        match error {
            StorageError::Disabled => Self::StorageUnavailable,
            other => Self::Storage(other),
        }
    }
}

impl From<PayloadError> for AppError {
    fn from(error: PayloadError) -> Self {
        Self::Validation(error.to_string())
    }
}

impl From<ReceiptError> for AppError {
    fn from(error: ReceiptError) -> Self {
        Self::Validation(error.to_string())
    }
}

impl From<PhoneError> for AppError {
    fn from(error: PhoneError) -> Self {
        Self::Validation(error.to_string())
    }
}

impl From<CheckoutError> for AppError {
    fn from(error: CheckoutError) -> Self {
        Self::Validation(error.to_string())
    }
}

impl From<OrderError> for AppError {
    fn from(error: OrderError) -> Self {
        match error {
            OrderError::CannotCancel | OrderError::CancelledIsFinal => {
                Self::Conflict(error.to_string())
            }
            other => Self::Validation(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(AppError::Validation("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::NotFound("order").status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::Conflict("x".into()).status(), StatusCode::CONFLICT);
        assert_eq!(AppError::Protected("x".into()).status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(AppError::StorageUnavailable.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_row_not_found_maps_to_404() {
        let err = AppError::from(sqlx::Error::RowNotFound);
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn test_order_status_rules_map_to_conflict() {
        assert!(matches!(AppError::from(OrderError::CancelledIsFinal), AppError::Conflict(_)));
        assert!(matches!(AppError::from(OrderError::NoItems), AppError::Validation(_)));
    }

    #[test]
    fn test_not_found_message_names_the_resource() {
        assert_eq!(AppError::NotFound("order").to_string(), "order not found");
    }
}
