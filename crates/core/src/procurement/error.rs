//! Purchase order domain error types.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::procurement::types::PurchaseOrderStatus;
use kasira_shared::AppError;

/// Errors from the lifecycle state machine.
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// Attempted an invalid status transition.
    #[error("invalid status transition from {from} to {to}")]
    InvalidTransition {
        /// The current status.
        from: PurchaseOrderStatus,
        /// The attempted target status.
        to: PurchaseOrderStatus,
    },

    /// Items or fields may only change while the order is a draft.
    #[error("only draft purchase orders can be updated (status is {status})")]
    OnlyDraftEditable {
        /// The current status.
        status: PurchaseOrderStatus,
    },

    /// Deletion is only permitted for drafts.
    #[error("only draft purchase orders can be deleted (status is {status})")]
    OnlyDraftDeletable {
        /// The current status.
        status: PurchaseOrderStatus,
    },

    /// Restore attempted on an order that is not soft-deleted.
    #[error("purchase order is not deleted")]
    NotDeleted,

    /// Receive quantity must be strictly positive.
    #[error("receive quantity must be positive, got {quantity}")]
    ReceiveQuantityNotPositive {
        /// The requested quantity.
        quantity: i32,
    },

    /// Receive quantity exceeds what is still pending on the item.
    #[error("cannot receive {requested}, only {pending} pending")]
    ReceiveExceedsPending {
        /// The requested quantity.
        requested: i32,
        /// The quantity still pending.
        pending: i32,
    },
}

impl From<LifecycleError> for AppError {
    fn from(err: LifecycleError) -> Self {
        match err {
            LifecycleError::InvalidTransition { .. }
            | LifecycleError::OnlyDraftEditable { .. }
            | LifecycleError::OnlyDraftDeletable { .. }
            | LifecycleError::NotDeleted => Self::InvalidState(err.to_string()),
            LifecycleError::ReceiveQuantityNotPositive { .. }
            | LifecycleError::ReceiveExceedsPending { .. } => Self::InvalidInput(err.to_string()),
        }
    }
}

/// Errors from line-item and order total computation.
#[derive(Debug, Error)]
pub enum PricingError {
    /// A purchase order must contain at least one item.
    #[error("purchase order must have at least one item")]
    EmptyItems,

    /// Ordered quantity must be strictly positive.
    #[error("quantity ordered must be positive, got {quantity}")]
    QuantityNotPositive {
        /// The offending quantity.
        quantity: i32,
    },

    /// Unit cost must be non-negative.
    #[error("unit cost must not be negative, got {cost}")]
    NegativeUnitCost {
        /// The offending cost.
        cost: Decimal,
    },

    /// Tax rate or discount percentage outside 0..=100.
    #[error("{field} must be between 0 and 100, got {value}")]
    PercentageOutOfRange {
        /// Which field was out of range.
        field: &'static str,
        /// The offending value.
        value: Decimal,
    },

    /// Order-level charge (tax, discount, shipping, paid) is negative.
    #[error("{field} must not be negative, got {value}")]
    NegativeCharge {
        /// Which charge was negative.
        field: &'static str,
        /// The offending value.
        value: Decimal,
    },

    /// The order discount pushed the total below zero.
    #[error("discount exceeds order total ({total})")]
    DiscountExceedsTotal {
        /// The resulting (negative) total.
        total: Decimal,
    },

    /// More was paid than the order is worth.
    #[error("amount paid {paid} exceeds order total {total}")]
    PaidExceedsTotal {
        /// The amount paid.
        paid: Decimal,
        /// The order total.
        total: Decimal,
    },
}

impl From<PricingError> for AppError {
    fn from(err: PricingError) -> Self {
        Self::InvalidInput(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_invalid_transition_names_both_states() {
        let err = LifecycleError::InvalidTransition {
            from: PurchaseOrderStatus::Draft,
            to: PurchaseOrderStatus::Approved,
        };
        let msg = err.to_string();
        assert!(msg.contains("draft"));
        assert!(msg.contains("approved"));
    }

    #[test]
    fn test_lifecycle_errors_map_to_invalid_state() {
        let err: AppError = LifecycleError::OnlyDraftEditable {
            status: PurchaseOrderStatus::Pending,
        }
        .into();
        assert!(matches!(err, AppError::InvalidState(_)));
        assert_eq!(err.status_code(), 422);
    }

    #[test]
    fn test_receive_errors_map_to_invalid_input() {
        let err: AppError = LifecycleError::ReceiveExceedsPending {
            requested: 12,
            pending: 4,
        }
        .into();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[test]
    fn test_pricing_errors_map_to_invalid_input() {
        let err: AppError = PricingError::PercentageOutOfRange {
            field: "discount_percentage",
            value: dec!(120),
        }
        .into();
        assert!(matches!(err, AppError::InvalidInput(_)));
        assert_eq!(err.status_code(), 422);
    }
}
