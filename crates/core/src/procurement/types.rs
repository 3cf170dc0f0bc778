//! Purchase order domain types.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Purchase order status in the procurement lifecycle.
///
/// The valid transitions are:
/// - Draft → Pending (submit)
/// - Pending → Approved (approve)
/// - Approved → PartiallyReceived | Received (receive)
/// - PartiallyReceived → PartiallyReceived | Received (receive)
/// - any non-terminal except Received → Cancelled (cancel)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PurchaseOrderStatus {
    /// Order is being drafted; items and fields can still change.
    Draft,
    /// Order has been submitted and awaits approval.
    Pending,
    /// Order has been approved and may receive stock.
    Approved,
    /// Some, but not all, ordered quantities have arrived.
    PartiallyReceived,
    /// Every item is fully received (terminal).
    Received,
    /// Order was cancelled (terminal).
    Cancelled,
}

impl PurchaseOrderStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::PartiallyReceived => "partially_received",
            Self::Received => "received",
            Self::Cancelled => "cancelled",
        }
    }

    /// Parses a status from a string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "draft" => Some(Self::Draft),
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "partially_received" => Some(Self::PartiallyReceived),
            "received" => Some(Self::Received),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// Returns true if items and order fields may still be replaced.
    #[must_use]
    pub const fn is_editable(&self) -> bool {
        matches!(self, Self::Draft)
    }

    /// Returns true if no further transition is possible.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Received | Self::Cancelled)
    }

    /// Returns true if stock may be received against the order.
    #[must_use]
    pub const fn is_receivable(&self) -> bool {
        matches!(self, Self::Approved | Self::PartiallyReceived)
    }
}

impl fmt::Display for PurchaseOrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A validated state transition with its audit stamps.
///
/// Produced by [`crate::procurement::LifecycleService`]; the repository
/// applies it to the stored row inside the same transaction that
/// re-checked the current status.
#[derive(Debug, Clone)]
pub enum LifecycleAction {
    /// Submit a draft order for approval.
    Submit {
        /// The new status (Pending).
        new_status: PurchaseOrderStatus,
    },
    /// Approve a pending order.
    Approve {
        /// The new status (Approved).
        new_status: PurchaseOrderStatus,
        /// The user who approved the order.
        approved_by: Uuid,
        /// When the order was approved.
        approved_at: DateTime<Utc>,
    },
    /// Record received quantities against an approved order.
    Receive {
        /// PartiallyReceived, or Received once every item is complete.
        new_status: PurchaseOrderStatus,
        /// Delivery date, stamped only when the order completes.
        actual_delivery_date: Option<NaiveDate>,
    },
    /// Cancel a non-terminal order.
    Cancel {
        /// The new status (Cancelled).
        new_status: PurchaseOrderStatus,
    },
}

impl LifecycleAction {
    /// Returns the new status resulting from this action.
    #[must_use]
    pub const fn new_status(&self) -> PurchaseOrderStatus {
        match self {
            Self::Submit { new_status }
            | Self::Approve { new_status, .. }
            | Self::Receive { new_status, .. }
            | Self::Cancel { new_status } => *new_status,
        }
    }

    /// Returns the audit action name for this transition.
    #[must_use]
    pub const fn action_name(&self) -> &'static str {
        match self {
            Self::Submit { .. } => "purchase_order.submitted",
            Self::Approve { .. } => "purchase_order.approved",
            Self::Receive { .. } => "purchase_order.received",
            Self::Cancel { .. } => "purchase_order.cancelled",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_as_str() {
        assert_eq!(PurchaseOrderStatus::Draft.as_str(), "draft");
        assert_eq!(PurchaseOrderStatus::Pending.as_str(), "pending");
        assert_eq!(PurchaseOrderStatus::Approved.as_str(), "approved");
        assert_eq!(
            PurchaseOrderStatus::PartiallyReceived.as_str(),
            "partially_received"
        );
        assert_eq!(PurchaseOrderStatus::Received.as_str(), "received");
        assert_eq!(PurchaseOrderStatus::Cancelled.as_str(), "cancelled");
    }

    #[test]
    fn test_status_parse() {
        assert_eq!(
            PurchaseOrderStatus::parse("draft"),
            Some(PurchaseOrderStatus::Draft)
        );
        assert_eq!(
            PurchaseOrderStatus::parse("PENDING"),
            Some(PurchaseOrderStatus::Pending)
        );
        assert_eq!(
            PurchaseOrderStatus::parse("partially_received"),
            Some(PurchaseOrderStatus::PartiallyReceived)
        );
        assert_eq!(PurchaseOrderStatus::parse("unknown"), None);
    }

    #[test]
    fn test_status_parse_roundtrip() {
        for status in [
            PurchaseOrderStatus::Draft,
            PurchaseOrderStatus::Pending,
            PurchaseOrderStatus::Approved,
            PurchaseOrderStatus::PartiallyReceived,
            PurchaseOrderStatus::Received,
            PurchaseOrderStatus::Cancelled,
        ] {
            assert_eq!(PurchaseOrderStatus::parse(status.as_str()), Some(status));
        }
    }

    #[test]
    fn test_status_predicates() {
        assert!(PurchaseOrderStatus::Draft.is_editable());
        assert!(!PurchaseOrderStatus::Pending.is_editable());

        assert!(PurchaseOrderStatus::Received.is_terminal());
        assert!(PurchaseOrderStatus::Cancelled.is_terminal());
        assert!(!PurchaseOrderStatus::PartiallyReceived.is_terminal());

        assert!(PurchaseOrderStatus::Approved.is_receivable());
        assert!(PurchaseOrderStatus::PartiallyReceived.is_receivable());
        assert!(!PurchaseOrderStatus::Draft.is_receivable());
        assert!(!PurchaseOrderStatus::Received.is_receivable());
    }
}
