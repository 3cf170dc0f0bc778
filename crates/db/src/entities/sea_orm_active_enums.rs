//! `SeaORM` active enums backed by Postgres enum types.

use kasira_core::procurement::PurchaseOrderStatus as DomainStatus;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Database representation of the purchase order status.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(
    rs_type = "String",
    db_type = "Enum",
    enum_name = "purchase_order_status"
)]
#[serde(rename_all = "snake_case")]
pub enum PurchaseOrderStatus {
    /// Order is being drafted.
    #[sea_orm(string_value = "draft")]
    Draft,
    /// Order awaits approval.
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Order is approved.
    #[sea_orm(string_value = "approved")]
    Approved,
    /// Some quantities have arrived.
    #[sea_orm(string_value = "partially_received")]
    PartiallyReceived,
    /// All quantities have arrived.
    #[sea_orm(string_value = "received")]
    Received,
    /// Order was cancelled.
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

impl From<DomainStatus> for PurchaseOrderStatus {
    fn from(status: DomainStatus) -> Self {
        match status {
            DomainStatus::Draft => Self::Draft,
            DomainStatus::Pending => Self::Pending,
            DomainStatus::Approved => Self::Approved,
            DomainStatus::PartiallyReceived => Self::PartiallyReceived,
            DomainStatus::Received => Self::Received,
            DomainStatus::Cancelled => Self::Cancelled,
        }
    }
}

impl From<PurchaseOrderStatus> for DomainStatus {
    fn from(status: PurchaseOrderStatus) -> Self {
        match status {
            PurchaseOrderStatus::Draft => Self::Draft,
            PurchaseOrderStatus::Pending => Self::Pending,
            PurchaseOrderStatus::Approved => Self::Approved,
            PurchaseOrderStatus::PartiallyReceived => Self::PartiallyReceived,
            PurchaseOrderStatus::Received => Self::Received,
            PurchaseOrderStatus::Cancelled => Self::Cancelled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_roundtrips_through_domain() {
        for status in [
            PurchaseOrderStatus::Draft,
            PurchaseOrderStatus::Pending,
            PurchaseOrderStatus::Approved,
            PurchaseOrderStatus::PartiallyReceived,
            PurchaseOrderStatus::Received,
            PurchaseOrderStatus::Cancelled,
        ] {
            let domain: DomainStatus = status.clone().into();
            let back: PurchaseOrderStatus = domain.into();
            assert_eq!(back, status);
        }
    }
}
