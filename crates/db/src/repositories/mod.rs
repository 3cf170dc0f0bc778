//! Repository abstractions for data access.

pub mod purchase_order;

pub use purchase_order::PurchaseOrderRepository;
