//! Application-wide error types.

use thiserror::Error;

/// Result type alias using `AppError`.
pub type AppResult<T> = Result<T, AppError>;

/// Application error taxonomy.
///
/// Every error surfaced to an API caller maps onto one of these
/// variants. Lower layers use their own typed errors and convert at
/// the boundary.
#[derive(Debug, Error)]
pub enum AppError {
    /// Entity does not exist (or is hidden from the caller).
    #[error("Not found: {0}")]
    NotFound(String),

    /// Tenant scope violation.
    #[error("Access denied: {0}")]
    AccessDenied(String),

    /// Illegal lifecycle transition.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Bad quantities, percentages, or missing cross-references.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Concurrent transition race (e.g., duplicate PO number).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Unclassified failure. Logged with full context; the caller only
    /// ever sees a generic message.
    #[error("Internal error: {0}")]
    Unexpected(String),
}

impl AppError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            Self::AccessDenied(_) => 403,
            Self::InvalidState(_) | Self::InvalidInput(_) => 422,
            Self::Conflict(_) => 409,
            Self::Unexpected(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::AccessDenied(_) => "ACCESS_DENIED",
            Self::InvalidState(_) => "INVALID_STATE",
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::Conflict(_) => "CONFLICT",
            Self::Unexpected(_) => "UNEXPECTED",
        }
    }

    /// Returns true if the cause should be hidden from the caller.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Unexpected(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_codes() {
        assert_eq!(AppError::NotFound(String::new()).status_code(), 404);
        assert_eq!(AppError::AccessDenied(String::new()).status_code(), 403);
        assert_eq!(AppError::InvalidState(String::new()).status_code(), 422);
        assert_eq!(AppError::InvalidInput(String::new()).status_code(), 422);
        assert_eq!(AppError::Conflict(String::new()).status_code(), 409);
        assert_eq!(AppError::Unexpected(String::new()).status_code(), 500);
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(AppError::NotFound(String::new()).error_code(), "NOT_FOUND");
        assert_eq!(
            AppError::AccessDenied(String::new()).error_code(),
            "ACCESS_DENIED"
        );
        assert_eq!(
            AppError::InvalidState(String::new()).error_code(),
            "INVALID_STATE"
        );
        assert_eq!(
            AppError::InvalidInput(String::new()).error_code(),
            "INVALID_INPUT"
        );
        assert_eq!(AppError::Conflict(String::new()).error_code(), "CONFLICT");
        assert_eq!(
            AppError::Unexpected(String::new()).error_code(),
            "UNEXPECTED"
        );
    }

    #[test]
    fn test_only_unexpected_is_internal() {
        assert!(AppError::Unexpected("db".into()).is_internal());
        assert!(!AppError::NotFound("po".into()).is_internal());
        assert!(!AppError::Conflict("po_number".into()).is_internal());
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            AppError::NotFound("purchase order".into()).to_string(),
            "Not found: purchase order"
        );
        assert_eq!(
            AppError::InvalidState("only draft can be submitted".into()).to_string(),
            "Invalid state: only draft can be submitted"
        );
    }
}
