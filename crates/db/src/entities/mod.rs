//! `SeaORM` entity definitions.

pub mod branches;
pub mod po_number_sequences;
pub mod purchase_order_items;
pub mod purchase_orders;
pub mod sea_orm_active_enums;
