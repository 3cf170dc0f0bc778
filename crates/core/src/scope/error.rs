//! Tenant scope error types.

use thiserror::Error;
use uuid::Uuid;

use kasira_shared::AppError;

/// Errors produced by scope resolution.
#[derive(Debug, Error)]
pub enum ScopeError {
    /// The target lies outside the actor's tenant boundary.
    #[error("user {user_id} may not access this resource")]
    AccessDenied {
        /// The acting user.
        user_id: Uuid,
    },
}

impl From<ScopeError> for AppError {
    fn from(err: ScopeError) -> Self {
        match err {
            ScopeError::AccessDenied { .. } => {
                Self::AccessDenied("resource is outside your organization or branch".to_string())
            }
        }
    }
}
