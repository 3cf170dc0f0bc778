//! Purchase order lifecycle state machine.
//!
//! Stateless transition logic: each method validates the current
//! status and returns a [`LifecycleAction`] carrying the new status
//! and audit stamps. Persistence happens elsewhere, inside the same
//! database transaction that re-read the status under a row lock.

use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use crate::procurement::error::LifecycleError;
use crate::procurement::types::{LifecycleAction, PurchaseOrderStatus};

/// Result of applying a receipt to one item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Receipt {
    /// Cumulative quantity received after this receipt.
    pub quantity_received: i32,
    /// Quantity still outstanding (ordered minus received).
    pub quantity_pending: i32,
}

/// Stateless service for purchase order state transitions.
pub struct LifecycleService;

impl LifecycleService {
    /// Submit a draft order for approval.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` unless the order is a draft.
    pub fn submit(current: PurchaseOrderStatus) -> Result<LifecycleAction, LifecycleError> {
        match current {
            PurchaseOrderStatus::Draft => Ok(LifecycleAction::Submit {
                new_status: PurchaseOrderStatus::Pending,
            }),
            _ => Err(LifecycleError::InvalidTransition {
                from: current,
                to: PurchaseOrderStatus::Pending,
            }),
        }
    }

    /// Approve a pending order, stamping approver and time.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` unless the order is pending.
    pub fn approve(
        current: PurchaseOrderStatus,
        approved_by: Uuid,
    ) -> Result<LifecycleAction, LifecycleError> {
        match current {
            PurchaseOrderStatus::Pending => Ok(LifecycleAction::Approve {
                new_status: PurchaseOrderStatus::Approved,
                approved_by,
                approved_at: Utc::now(),
            }),
            _ => Err(LifecycleError::InvalidTransition {
                from: current,
                to: PurchaseOrderStatus::Approved,
            }),
        }
    }

    /// Cancel an order. Allowed from any state except the terminals.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` when the order is already received
    /// or cancelled.
    pub fn cancel(current: PurchaseOrderStatus) -> Result<LifecycleAction, LifecycleError> {
        if current.is_terminal() {
            return Err(LifecycleError::InvalidTransition {
                from: current,
                to: PurchaseOrderStatus::Cancelled,
            });
        }
        Ok(LifecycleAction::Cancel {
            new_status: PurchaseOrderStatus::Cancelled,
        })
    }

    /// Decide the order status after receiving stock.
    ///
    /// `all_received` must reflect the live item set after the receipt
    /// was applied. The delivery date is stamped only once every item
    /// is complete.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` unless the order is approved or
    /// partially received.
    pub fn receive(
        current: PurchaseOrderStatus,
        all_received: bool,
        delivery_date: NaiveDate,
    ) -> Result<LifecycleAction, LifecycleError> {
        if !current.is_receivable() {
            return Err(LifecycleError::InvalidTransition {
                from: current,
                to: PurchaseOrderStatus::PartiallyReceived,
            });
        }
        if all_received {
            Ok(LifecycleAction::Receive {
                new_status: PurchaseOrderStatus::Received,
                actual_delivery_date: Some(delivery_date),
            })
        } else {
            Ok(LifecycleAction::Receive {
                new_status: PurchaseOrderStatus::PartiallyReceived,
                actual_delivery_date: None,
            })
        }
    }

    /// Apply a receipt quantity to one item's counters.
    ///
    /// # Errors
    ///
    /// Returns `ReceiveQuantityNotPositive` for qty ≤ 0 and
    /// `ReceiveExceedsPending` when the item cannot absorb it.
    pub fn apply_receipt(
        quantity_ordered: i32,
        quantity_received: i32,
        quantity: i32,
    ) -> Result<Receipt, LifecycleError> {
        if quantity <= 0 {
            return Err(LifecycleError::ReceiveQuantityNotPositive { quantity });
        }
        let pending = quantity_ordered - quantity_received;
        if quantity > pending {
            return Err(LifecycleError::ReceiveExceedsPending {
                requested: quantity,
                pending,
            });
        }
        let quantity_received = quantity_received + quantity;
        Ok(Receipt {
            quantity_received,
            quantity_pending: quantity_ordered - quantity_received,
        })
    }

    /// Ensure items/fields may still be replaced.
    ///
    /// # Errors
    ///
    /// Returns `OnlyDraftEditable` for any non-draft status.
    pub fn ensure_editable(current: PurchaseOrderStatus) -> Result<(), LifecycleError> {
        if current.is_editable() {
            Ok(())
        } else {
            Err(LifecycleError::OnlyDraftEditable { status: current })
        }
    }

    /// Ensure the order may be deleted (soft or hard).
    ///
    /// # Errors
    ///
    /// Returns `OnlyDraftDeletable` for any non-draft status.
    pub fn ensure_deletable(current: PurchaseOrderStatus) -> Result<(), LifecycleError> {
        match current {
            PurchaseOrderStatus::Draft => Ok(()),
            _ => Err(LifecycleError::OnlyDraftDeletable { status: current }),
        }
    }

    /// Check if a status transition is valid.
    ///
    /// Valid transitions:
    /// - Draft → Pending (submit)
    /// - Pending → Approved (approve)
    /// - Approved → PartiallyReceived | Received (receive)
    /// - PartiallyReceived → PartiallyReceived | Received (receive)
    /// - Draft/Pending/Approved/PartiallyReceived → Cancelled (cancel)
    #[must_use]
    pub fn is_valid_transition(from: PurchaseOrderStatus, to: PurchaseOrderStatus) -> bool {
        use PurchaseOrderStatus::{
            Approved, Cancelled, Draft, PartiallyReceived, Pending, Received,
        };
        matches!(
            (from, to),
            (Draft, Pending)
                | (Pending, Approved)
                | (Approved | PartiallyReceived, PartiallyReceived | Received)
                | (Draft | Pending | Approved | PartiallyReceived, Cancelled)
        )
    }
}
