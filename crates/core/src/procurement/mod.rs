//! Purchase order domain logic.
//!
//! This module owns everything about a purchase order that does not
//! touch a database: the status state machine, per-line and order
//! financial computation, and PO number formatting.

pub mod error;
pub mod lifecycle;
pub mod po_number;
pub mod pricing;
pub mod types;

#[cfg(test)]
mod pricing_props;

pub use error::{LifecycleError, PricingError};
pub use lifecycle::{LifecycleService, Receipt};
pub use po_number::format_po_number;
pub use pricing::{LineItemInput, OrderCharges, OrderTotals, PricedLineItem};
pub use types::{LifecycleAction, PurchaseOrderStatus};
