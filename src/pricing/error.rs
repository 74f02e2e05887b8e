// Error types for checkout pricing
// Validation failures are surfaced to the caller; collaborator failures are
// recovered inside the strategies and only surface from the stores themselves.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::Serialize;
use thiserror::Error;

/// Main error type for the pricing system
#[derive(Debug, Error)]
pub enum PricingError {
    /// Malformed pricing input (negative subtotal, empty item id, zero quantity)
    #[error("Validation failed: {0}")]
    Validation(String),

    /// A stored rule could not be interpreted
    #[error("Invalid discount rule {rule_id}: {reason}")]
    InvalidRule {
        rule_id: i64,
        reason: String,
    },

    /// Database operation errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Any other collaborator (catalog, customer store) failed
    #[error("Collaborator failure: {0}")]
    Collaborator(String),
}

/// Result type alias for pricing operations
pub type PricingResult<T> = Result<T, PricingError>;

impl From<validator::ValidationErrors> for PricingError {
    fn from(err: validator::ValidationErrors) -> Self {
        PricingError::Validation(err.to_string())
    }
}

/// JSON body returned for every failed pricing request
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Machine-readable error code (e.g., "VALIDATION_ERROR")
    pub error_code: String,

    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,

    /// RFC 3339 timestamp of when the error occurred
    pub timestamp: String,
}

impl PricingError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            PricingError::Validation(_) => StatusCode::BAD_REQUEST,
            PricingError::InvalidRule { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            PricingError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            PricingError::Collaborator(_) => StatusCode::BAD_GATEWAY,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            PricingError::Validation(_) => "VALIDATION_ERROR",
            PricingError::InvalidRule { .. } => "INVALID_RULE",
            PricingError::Database(_) => "DATABASE_ERROR",
            PricingError::Collaborator(_) => "COLLABORATOR_ERROR",
        }
    }

    /// Database and collaborator details stay in the logs, never in the response
    fn to_error_response(&self) -> ErrorResponse {
        let (message, details) = match self {
            PricingError::Validation(msg) => {
                tracing::debug!("Pricing validation error: {}", msg);
                ("Request validation failed".to_string(), Some(msg.clone()))
            }
            PricingError::InvalidRule { rule_id, reason } => {
                tracing::error!("Invalid discount rule {}: {}", rule_id, reason);
                ("A discount rule is misconfigured".to_string(), None)
            }
            PricingError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                ("A database error occurred".to_string(), None)
            }
            PricingError::Collaborator(msg) => {
                tracing::error!("Collaborator failure: {}", msg);
                ("An upstream service failed".to_string(), None)
            }
        };

        ErrorResponse {
            error_code: self.error_code().to_string(),
            message,
            details,
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

impl IntoResponse for PricingError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        (status, Json(self.to_error_response())).into_response()
    }
}
