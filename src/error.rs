//! Ledger error types with HTTP status code mapping.
//!
//! [`LedgerError`] is the central error type for the service. Each variant
//! maps to a specific HTTP status code and structured JSON error response.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::{LeadId, ProposalId, UserId, WithdrawalId};

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 4001,
///     "message": "insufficient credits: required 1, available 0",
///     "details": null
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code.
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Server-side error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category          | HTTP Status                    |
/// |-----------|-------------------|--------------------------------|
/// | 1000–1999 | Validation / auth | 400 / 401 / 403                |
/// | 2000–2999 | Not found / state | 404 Not Found / 409 Conflict   |
/// | 3000–3999 | Server            | 500 Internal Server Error      |
/// | 4000–4999 | Ledger rules      | 422 Unprocessable Entity       |
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// Request validation failed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Missing or wrong shared secret / admin key.
    #[error("unauthorized")]
    Unauthorized,

    /// The caller lacks a permission flag required by the operation.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// User record with the given ID was not found.
    #[error("user not found: {0}")]
    UserNotFound(UserId),

    /// Lead with the given ID was not found.
    #[error("lead not found: {0}")]
    LeadNotFound(LeadId),

    /// Withdrawal request with the given ID was not found.
    #[error("withdrawal not found: {0}")]
    WithdrawalNotFound(WithdrawalId),

    /// Proposal with the given ID was not found.
    #[error("proposal not found: {0}")]
    ProposalNotFound(ProposalId),

    /// A status change that the state table does not allow.
    #[error("invalid status transition: {from} -> {to}")]
    InvalidTransition {
        /// Current status.
        from: String,
        /// Requested status.
        to: String,
    },

    /// Not enough credits to unlock a lead.
    #[error("insufficient credits: required {required}, available {available}")]
    InsufficientCredits {
        /// Credits the operation costs.
        required: u64,
        /// Credits on the account.
        available: u64,
    },

    /// Not enough money in the selected balance.
    #[error("insufficient balance: requested {requested} cents, available {available} cents")]
    InsufficientBalance {
        /// Amount the operation needs, in cents.
        requested: i64,
        /// Amount on the balance, in cents.
        available: i64,
    },

    /// Persistence layer failure.
    #[error("persistence error: {0}")]
    PersistenceError(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl LedgerError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidRequest(_) => 1001,
            Self::Unauthorized => 1002,
            Self::PermissionDenied(_) => 1003,
            Self::UserNotFound(_) => 2001,
            Self::LeadNotFound(_) => 2002,
            Self::WithdrawalNotFound(_) => 2003,
            Self::ProposalNotFound(_) => 2004,
            Self::InvalidTransition { .. } => 2005,
            Self::Internal(_) => 3000,
            Self::PersistenceError(_) => 3001,
            Self::InsufficientCredits { .. } => 4001,
            Self::InsufficientBalance { .. } => 4002,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::PermissionDenied(_) => StatusCode::FORBIDDEN,
            Self::UserNotFound(_)
            | Self::LeadNotFound(_)
            | Self::WithdrawalNotFound(_)
            | Self::ProposalNotFound(_) => StatusCode::NOT_FOUND,
            Self::InvalidTransition { .. } => StatusCode::CONFLICT,
            Self::InsufficientCredits { .. } | Self::InsufficientBalance { .. } => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            Self::PersistenceError(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for LedgerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: None,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}

impl From<sqlx::Error> for LedgerError {
    fn from(err: sqlx::Error) -> Self {
        Self::PersistenceError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_variants_map_to_404() {
        let err = LedgerError::UserNotFound(UserId::new());
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.error_code(), 2001);
    }

    #[test]
    fn ledger_rule_violations_map_to_422() {
        let err = LedgerError::InsufficientCredits {
            required: 3,
            available: 1,
        };
        assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            err.to_string(),
            "insufficient credits: required 3, available 1"
        );
    }

    #[test]
    fn transition_conflict_is_409() {
        let err = LedgerError::InvalidTransition {
            from: "done".to_string(),
            to: "pending".to_string(),
        };
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
    }
}
