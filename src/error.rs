//! Error handling for the booking core

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::vehicles::models::VehicleId;

/// Application error type
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AppError {
    #[error("Invalid date range: {end} is before {start}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    #[error("Invalid daily rate: {0}")]
    InvalidRate(Decimal),

    #[error("Insufficient funds: tendered {tendered}, owed {owed}")]
    InsufficientFunds { tendered: Decimal, owed: Decimal },

    #[error("Duration mismatch: expected {expected} day(s), got {actual}")]
    DurationMismatch { expected: i64, actual: i64 },

    #[error("Cannot {operation} a booking that is {status}")]
    InvalidState {
        operation: &'static str,
        status: String,
    },

    #[error("Vehicle {0} is not available for booking")]
    VehicleUnavailable(VehicleId),

    #[error("Sync failed: {0}")]
    SyncFailed(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

impl AppError {
    /// Errors detected locally, before any request is sent.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            AppError::InvalidRange { .. }
                | AppError::InvalidRate(_)
                | AppError::InsufficientFunds { .. }
                | AppError::DurationMismatch { .. }
        )
    }

    /// Human-readable message for the end user.
    pub fn user_message(&self) -> String {
        match self {
            AppError::InvalidRange { .. } => {
                "End date must be on or after the start date.".to_string()
            }
            AppError::InvalidRate(_) => "This vehicle has no valid daily rate.".to_string(),
            AppError::InsufficientFunds { tendered, owed } => format!(
                "You need {} but entered {}.",
                crate::pricing::format_peso(*owed),
                crate::pricing::format_peso(*tendered)
            ),
            AppError::DurationMismatch { expected, .. } => format!(
                "The rescheduled booking must be exactly {} day(s).",
                expected
            ),
            AppError::InvalidState { operation, status } => {
                format!("This booking is {} and cannot be {}.", status, past_tense(operation))
            }
            AppError::VehicleUnavailable(_) => {
                "This car is currently unavailable for booking.".to_string()
            }
            AppError::SyncFailed(msg) => {
                tracing::error!("Sync failed: {}", msg);
                "Could not reach the booking service. Please try again.".to_string()
            }
            AppError::Unauthorized => "Please log in first.".to_string(),
            AppError::NotFound(what) => format!("{} was not found.", what),
            AppError::MalformedResponse(msg) => {
                tracing::error!("Malformed response: {}", msg);
                "The booking service sent an unexpected response.".to_string()
            }
        }
    }
}

fn past_tense(operation: &str) -> String {
    match operation {
        "cancel" => "cancelled".to_string(),
        "remove" => "removed".to_string(),
        "reschedule" => "rescheduled".to_string(),
        "check out" => "checked out".to_string(),
        other => format!("{}d", other),
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            AppError::MalformedResponse(err.to_string())
        } else {
            AppError::SyncFailed(err.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
