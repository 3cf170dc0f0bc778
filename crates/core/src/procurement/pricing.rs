//! Line-item and order total computation.
//!
//! All money flows through [`Decimal`]; intermediate products keep
//! full precision and only the final figure of each formula is
//! rounded to two decimal places, half away from zero.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::procurement::error::PricingError;

const SCALE: u32 = 2;
const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// One requested line of a purchase order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineItemInput {
    /// The product variant being ordered.
    pub product_variant_id: Uuid,
    /// Units ordered. Must be positive.
    pub quantity_ordered: i32,
    /// Cost per unit. Must be non-negative.
    pub unit_cost: Decimal,
    /// Per-line tax rate in percent, 0 to 100.
    #[serde(default)]
    pub tax_rate: Decimal,
    /// Per-line discount in percent, 0 to 100.
    #[serde(default)]
    pub discount_percentage: Decimal,
    /// Free-form note for the line.
    #[serde(default)]
    pub notes: Option<String>,
}

/// A validated line with its computed total.
#[derive(Debug, Clone)]
pub struct PricedLineItem {
    /// The requested line.
    pub input: LineItemInput,
    /// quantity x unit cost, discounted then taxed, rounded to 2dp.
    pub line_total: Decimal,
}

/// Order-level charges applied on top of the line subtotal.
#[derive(Debug, Clone, Default)]
pub struct OrderCharges {
    /// Flat tax amount added to the subtotal.
    pub tax_amount: Decimal,
    /// Flat discount amount subtracted from the subtotal.
    pub discount_amount: Decimal,
    /// Shipping cost added to the subtotal.
    pub shipping_cost: Decimal,
    /// Amount already paid against the order.
    pub amount_paid: Decimal,
}

/// Computed order-level figures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderTotals {
    /// Sum of all line totals.
    pub subtotal: Decimal,
    /// subtotal + tax + shipping - discount.
    pub total_amount: Decimal,
    /// total minus what has already been paid.
    pub amount_due: Decimal,
}

/// Compute the total for one line.
///
/// `quantity * unit_cost * (1 - discount/100) * (1 + tax/100)`,
/// rounded to two decimal places as the last step.
///
/// # Errors
///
/// Rejects non-positive quantities, negative unit costs, and
/// percentages outside `0..=100`.
pub fn line_total(
    quantity_ordered: i32,
    unit_cost: Decimal,
    tax_rate: Decimal,
    discount_percentage: Decimal,
) -> Result<Decimal, PricingError> {
    if quantity_ordered <= 0 {
        return Err(PricingError::QuantityNotPositive {
            quantity: quantity_ordered,
        });
    }
    if unit_cost.is_sign_negative() {
        return Err(PricingError::NegativeUnitCost { cost: unit_cost });
    }
    check_percentage("tax_rate", tax_rate)?;
    check_percentage("discount_percentage", discount_percentage)?;

    let quantity = Decimal::from(quantity_ordered);
    let discount_factor = Decimal::ONE - discount_percentage / HUNDRED;
    let tax_factor = Decimal::ONE + tax_rate / HUNDRED;
    Ok(round2(quantity * unit_cost * discount_factor * tax_factor))
}

/// Validate and price every line of an order.
///
/// # Errors
///
/// Returns `EmptyItems` for an empty slice, otherwise the first
/// per-line validation failure.
pub fn price_items(items: &[LineItemInput]) -> Result<Vec<PricedLineItem>, PricingError> {
    if items.is_empty() {
        return Err(PricingError::EmptyItems);
    }
    items
        .iter()
        .map(|item| {
            let total = line_total(
                item.quantity_ordered,
                item.unit_cost,
                item.tax_rate,
                item.discount_percentage,
            )?;
            Ok(PricedLineItem {
                input: item.clone(),
                line_total: total,
            })
        })
        .collect()
}

/// Roll priced lines and order-level charges into the final figures.
///
/// # Errors
///
/// Rejects negative charges, a discount that pushes the total below
/// zero, and payments exceeding the total.
pub fn order_totals(
    items: &[PricedLineItem],
    charges: &OrderCharges,
) -> Result<OrderTotals, PricingError> {
    check_charge("tax_amount", charges.tax_amount)?;
    check_charge("discount_amount", charges.discount_amount)?;
    check_charge("shipping_cost", charges.shipping_cost)?;
    check_charge("amount_paid", charges.amount_paid)?;

    let subtotal: Decimal = items.iter().map(|item| item.line_total).sum();
    let total_amount = round2(
        subtotal + charges.tax_amount + charges.shipping_cost - charges.discount_amount,
    );
    if total_amount.is_sign_negative() && !total_amount.is_zero() {
        return Err(PricingError::DiscountExceedsTotal {
            total: total_amount,
        });
    }
    if charges.amount_paid > total_amount {
        return Err(PricingError::PaidExceedsTotal {
            paid: charges.amount_paid,
            total: total_amount,
        });
    }
    Ok(OrderTotals {
        subtotal,
        total_amount,
        amount_due: total_amount - charges.amount_paid,
    })
}

fn check_percentage(field: &'static str, value: Decimal) -> Result<(), PricingError> {
    if value.is_sign_negative() || value > HUNDRED {
        return Err(PricingError::PercentageOutOfRange { field, value });
    }
    Ok(())
}

fn check_charge(field: &'static str, value: Decimal) -> Result<(), PricingError> {
    if value.is_sign_negative() {
        return Err(PricingError::NegativeCharge { field, value });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    fn item(quantity: i32, cost: Decimal, tax: Decimal, discount: Decimal) -> LineItemInput {
        LineItemInput {
            product_variant_id: Uuid::new_v4(),
            quantity_ordered: quantity,
            unit_cost: cost,
            tax_rate: tax,
            discount_percentage: discount,
            notes: None,
        }
    }

    #[test]
    fn test_line_total_plain() {
        let total = line_total(10, dec!(100.00), Decimal::ZERO, Decimal::ZERO).unwrap();
        assert_eq!(total, dec!(1000.00));
    }

    #[test]
    fn test_line_total_with_tax() {
        let total = line_total(10, dec!(100.00), dec!(10), Decimal::ZERO).unwrap();
        assert_eq!(total, dec!(1100.00));
    }

    #[test]
    fn test_line_total_discount_before_tax() {
        // 5 * 40.00 = 200, -25% = 150, +10% tax = 165
        let total = line_total(5, dec!(40.00), dec!(10), dec!(25)).unwrap();
        assert_eq!(total, dec!(165.00));
    }

    #[test]
    fn test_line_total_rounds_half_away_from_zero() {
        // 3 * 3.335 = 10.005 rounds to 10.01, not 10.00
        let total = line_total(3, dec!(3.335), Decimal::ZERO, Decimal::ZERO).unwrap();
        assert_eq!(total, dec!(10.01));
    }

    #[test]
    fn test_line_total_rounds_once_at_the_end() {
        // 7 * 9.99 * 0.85 * 1.11 = 65.98...; intermediate rounding
        // would give a different cent.
        let total = line_total(7, dec!(9.99), dec!(11), dec!(15)).unwrap();
        assert_eq!(total, dec!(65.98));
    }

    #[rstest]
    #[case(0)]
    #[case(-1)]
    fn test_line_total_rejects_non_positive_quantity(#[case] quantity: i32) {
        let err = line_total(quantity, dec!(1), Decimal::ZERO, Decimal::ZERO).unwrap_err();
        assert!(matches!(err, PricingError::QuantityNotPositive { .. }));
    }

    #[test]
    fn test_line_total_rejects_negative_cost() {
        let err = line_total(1, dec!(-0.01), Decimal::ZERO, Decimal::ZERO).unwrap_err();
        assert!(matches!(err, PricingError::NegativeUnitCost { .. }));
    }

    #[rstest]
    #[case(dec!(-1), Decimal::ZERO)]
    #[case(dec!(100.01), Decimal::ZERO)]
    #[case(Decimal::ZERO, dec!(-5))]
    #[case(Decimal::ZERO, dec!(101))]
    fn test_line_total_rejects_bad_percentages(#[case] tax: Decimal, #[case] discount: Decimal) {
        let err = line_total(1, dec!(10), tax, discount).unwrap_err();
        assert!(matches!(err, PricingError::PercentageOutOfRange { .. }));
    }

    #[test]
    fn test_price_items_rejects_empty() {
        let err = price_items(&[]).unwrap_err();
        assert!(matches!(err, PricingError::EmptyItems));
    }

    #[test]
    fn test_price_items_prices_each_line() {
        let priced = price_items(&[
            item(10, dec!(100.00), dec!(10), Decimal::ZERO),
            item(2, dec!(5.50), Decimal::ZERO, dec!(50)),
        ])
        .unwrap();
        assert_eq!(priced.len(), 2);
        assert_eq!(priced[0].line_total, dec!(1100.00));
        assert_eq!(priced[1].line_total, dec!(5.50));
    }

    #[test]
    fn test_order_totals_combines_charges() {
        let priced = price_items(&[item(10, dec!(100.00), dec!(10), Decimal::ZERO)]).unwrap();
        let charges = OrderCharges {
            tax_amount: dec!(25.00),
            discount_amount: dec!(50.00),
            shipping_cost: dec!(15.00),
            amount_paid: dec!(500.00),
        };
        let totals = order_totals(&priced, &charges).unwrap();
        assert_eq!(totals.subtotal, dec!(1100.00));
        assert_eq!(totals.total_amount, dec!(1090.00));
        assert_eq!(totals.amount_due, dec!(590.00));
    }

    #[test]
    fn test_order_totals_zero_charges() {
        let priced = price_items(&[item(1, dec!(9.99), Decimal::ZERO, Decimal::ZERO)]).unwrap();
        let totals = order_totals(&priced, &OrderCharges::default()).unwrap();
        assert_eq!(totals.subtotal, dec!(9.99));
        assert_eq!(totals.total_amount, dec!(9.99));
        assert_eq!(totals.amount_due, dec!(9.99));
    }

    #[test]
    fn test_order_totals_rejects_negative_charge() {
        let priced = price_items(&[item(1, dec!(10), Decimal::ZERO, Decimal::ZERO)]).unwrap();
        let charges = OrderCharges {
            shipping_cost: dec!(-1),
            ..OrderCharges::default()
        };
        let err = order_totals(&priced, &charges).unwrap_err();
        assert!(matches!(
            err,
            PricingError::NegativeCharge {
                field: "shipping_cost",
                ..
            }
        ));
    }

    #[test]
    fn test_order_totals_rejects_excess_discount() {
        let priced = price_items(&[item(1, dec!(10), Decimal::ZERO, Decimal::ZERO)]).unwrap();
        let charges = OrderCharges {
            discount_amount: dec!(15),
            ..OrderCharges::default()
        };
        let err = order_totals(&priced, &charges).unwrap_err();
        assert!(matches!(err, PricingError::DiscountExceedsTotal { .. }));
    }

    #[test]
    fn test_order_totals_rejects_overpayment() {
        let priced = price_items(&[item(1, dec!(10), Decimal::ZERO, Decimal::ZERO)]).unwrap();
        let charges = OrderCharges {
            amount_paid: dec!(10.01),
            ..OrderCharges::default()
        };
        let err = order_totals(&priced, &charges).unwrap_err();
        assert!(matches!(err, PricingError::PaidExceedsTotal { .. }));
    }

    #[test]
    fn test_order_totals_fully_paid_leaves_zero_due() {
        let priced = price_items(&[item(4, dec!(2.50), Decimal::ZERO, Decimal::ZERO)]).unwrap();
        let charges = OrderCharges {
            amount_paid: dec!(10.00),
            ..OrderCharges::default()
        };
        let totals = order_totals(&priced, &charges).unwrap();
        assert_eq!(totals.amount_due, Decimal::ZERO);
    }
}
