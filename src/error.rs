//! Error types for the car rental server

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

use crate::models::rental::RentalStatus;

/// Partial unique index guarding "one active rental per vehicle"
pub const ACTIVE_RENTAL_INDEX: &str = "rentals_one_active_per_vehicle";

pub const VEHICLE_RENTED_OUT: &str = "Vehicle is currently rented out";

/// Numeric error codes returned alongside the message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ErrorCode {
    Failure = 1,
    NotAuthorized = 2,
    DbFailure = 3,
    NotFound = 4,
    BadValue = 5,
    Duplicate = 6,
    VehicleUnavailable = 7,
    InsufficientFunds = 8,
    InvalidTransition = 9,
    InvalidStatus = 10,
}

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Authorization failed: {0}")]
    Authorization(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Duplicate unique field (plate number, id card, username...)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Rule blocking the request in the current state (vehicle rented out,
    /// customer with an overdue rental...)
    #[error("Business rule violation: {0}")]
    BusinessRule(String),

    #[error("Insufficient funds: balance {balance}, required {required}")]
    InsufficientFunds { balance: Decimal, required: Decimal },

    #[error("Cannot change rental status from {from} to {to}")]
    InvalidTransition { from: RentalStatus, to: RentalStatus },

    #[error("Invalid rental status: {0}")]
    InvalidStatus(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Error response body
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub code: u32,
    pub error: String,
}

impl AppError {
    /// HTTP status, error code and client-facing message
    fn parts(&self) -> (StatusCode, ErrorCode, String) {
        match self {
            AppError::Authentication(msg) => {
                (StatusCode::UNAUTHORIZED, ErrorCode::NotAuthorized, msg.clone())
            }
            AppError::Authorization(msg) => {
                (StatusCode::FORBIDDEN, ErrorCode::NotAuthorized, msg.clone())
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, ErrorCode::NotFound, msg.clone()),
            AppError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, ErrorCode::BadValue, msg.clone())
            }
            AppError::Database(e) => match unique_violation(e) {
                Some(ACTIVE_RENTAL_INDEX) => (
                    StatusCode::BAD_REQUEST,
                    ErrorCode::VehicleUnavailable,
                    VEHICLE_RENTED_OUT.to_string(),
                ),
                Some(constraint) => (
                    StatusCode::CONFLICT,
                    ErrorCode::Duplicate,
                    format!("Duplicate value violates {}", constraint),
                ),
                None => {
                    tracing::error!("Database error: {:?}", e);
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        ErrorCode::DbFailure,
                        "Database error".to_string(),
                    )
                }
            },
            AppError::Conflict(msg) => (StatusCode::CONFLICT, ErrorCode::Duplicate, msg.clone()),
            AppError::BusinessRule(msg) => {
                (StatusCode::BAD_REQUEST, ErrorCode::VehicleUnavailable, msg.clone())
            }
            AppError::InsufficientFunds { .. } => (
                StatusCode::BAD_REQUEST,
                ErrorCode::InsufficientFunds,
                self.to_string(),
            ),
            AppError::InvalidTransition { .. } => (
                StatusCode::BAD_REQUEST,
                ErrorCode::InvalidTransition,
                self.to_string(),
            ),
            AppError::InvalidStatus(_) => {
                (StatusCode::BAD_REQUEST, ErrorCode::InvalidStatus, self.to_string())
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::Failure,
                    "Internal server error".to_string(),
                )
            }
        }
    }
}

/// Name of the violated unique constraint, if the error is one
fn unique_violation(e: &sqlx::Error) -> Option<&str> {
    let db_err = e.as_database_error()?;
    if db_err.code().as_deref() == Some("23505") {
        Some(db_err.constraint().unwrap_or("unique constraint"))
    } else {
        None
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();

        let body = Json(ErrorResponse {
            code: code as u32,
            error: message,
        });

        (status, body).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_maps_to_bad_request() {
        let err = AppError::Validation("Duration days must be positive".to_string());
        let (status, code, message) = err.parts();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(code, ErrorCode::BadValue);
        assert_eq!(message, "Duration days must be positive");
    }

    #[test]
    fn test_business_rule_keeps_message() {
        let err = AppError::BusinessRule(VEHICLE_RENTED_OUT.to_string());
        let (status, _, message) = err.parts();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(message, VEHICLE_RENTED_OUT);
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(AppError::NotFound("x".into()).parts().0, StatusCode::NOT_FOUND);
        assert_eq!(AppError::Conflict("x".into()).parts().0, StatusCode::CONFLICT);
        assert_eq!(AppError::Authentication("x".into()).parts().0, StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::Authorization("x".into()).parts().0, StatusCode::FORBIDDEN);
        assert_eq!(
            AppError::Internal("boom".into()).parts(),
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorCode::Failure,
                "Internal server error".to_string()
            )
        );
    }

    #[test]
    fn test_invalid_transition_message() {
        let err = AppError::InvalidTransition {
            from: RentalStatus::Completed,
            to: RentalStatus::Ongoing,
        };
        let (status, code, message) = err.parts();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(code, ErrorCode::InvalidTransition);
        assert_eq!(message, "Cannot change rental status from completed to ongoing");
    }

    #[test]
    fn test_insufficient_funds_is_bad_request() {
        let err = AppError::InsufficientFunds {
            balance: Decimal::new(10000, 2),
            required: Decimal::new(50000, 2),
        };
        let (status, code, message) = err.parts();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(code, ErrorCode::InsufficientFunds);
        assert_eq!(message, "Insufficient funds: balance 100.00, required 500.00");
    }
}
