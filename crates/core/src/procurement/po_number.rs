//! Purchase order number formatting.

use chrono::NaiveDate;

/// Format a purchase order number as `PO-YYYYMMDD-NNNN`.
///
/// The sequence resets daily and is zero-padded to four digits; a
/// day with more than 9999 orders simply widens the suffix.
#[must_use]
pub fn format_po_number(order_date: NaiveDate, sequence: i64) -> String {
    format!("PO-{}-{sequence:04}", order_date.format("%Y%m%d"))
}
