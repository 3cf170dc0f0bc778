//! Property tests for pricing arithmetic.

use proptest::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::procurement::pricing::{self, LineItemInput, OrderCharges};

fn money() -> impl Strategy<Value = Decimal> {
    // up to 1_000_000.00 in cents
    (0i64..=100_000_000).prop_map(|cents| Decimal::new(cents, 2))
}

fn percentage() -> impl Strategy<Value = Decimal> {
    // 0.00 to 100.00 in hundredths of a percent
    (0i64..=10_000).prop_map(|hundredths| Decimal::new(hundredths, 2))
}

fn line() -> impl Strategy<Value = LineItemInput> {
    (1i32..=10_000, money(), percentage(), percentage()).prop_map(
        |(quantity, cost, tax, discount)| LineItemInput {
            product_variant_id: Uuid::new_v4(),
            quantity_ordered: quantity,
            unit_cost: cost,
            tax_rate: tax,
            discount_percentage: discount,
            notes: None,
        },
    )
}

proptest! {
    #[test]
    fn line_total_is_never_negative(item in line()) {
        let total = pricing::line_total(
            item.quantity_ordered,
            item.unit_cost,
            item.tax_rate,
            item.discount_percentage,
        ).unwrap();
        prop_assert!(total >= Decimal::ZERO);
    }

    #[test]
    fn line_total_has_at_most_two_decimals(item in line()) {
        let total = pricing::line_total(
            item.quantity_ordered,
            item.unit_cost,
            item.tax_rate,
            item.discount_percentage,
        ).unwrap();
        prop_assert_eq!(total, total.round_dp(2));
    }

    #[test]
    fn full_discount_zeroes_the_line(quantity in 1i32..=10_000, cost in money(), tax in percentage()) {
        let total = pricing::line_total(quantity, cost, tax, Decimal::ONE_HUNDRED).unwrap();
        prop_assert_eq!(total, Decimal::ZERO);
    }

    #[test]
    fn tax_never_shrinks_a_line(item in line()) {
        let untaxed = pricing::line_total(
            item.quantity_ordered,
            item.unit_cost,
            Decimal::ZERO,
            item.discount_percentage,
        ).unwrap();
        let taxed = pricing::line_total(
            item.quantity_ordered,
            item.unit_cost,
            item.tax_rate,
            item.discount_percentage,
        ).unwrap();
        prop_assert!(taxed >= untaxed);
    }

    #[test]
    fn subtotal_is_sum_of_line_totals(items in prop::collection::vec(line(), 1..8)) {
        let priced = pricing::price_items(&items).unwrap();
        let expected: Decimal = priced.iter().map(|p| p.line_total).sum();
        let totals = pricing::order_totals(&priced, &OrderCharges::default()).unwrap();
        prop_assert_eq!(totals.subtotal, expected);
    }

    #[test]
    fn amount_due_plus_paid_equals_total(
        items in prop::collection::vec(line(), 1..8),
        tax in money(),
        shipping in money(),
    ) {
        let priced = pricing::price_items(&items).unwrap();
        let charges = OrderCharges {
            tax_amount: tax,
            discount_amount: Decimal::ZERO,
            shipping_cost: shipping,
            amount_paid: Decimal::ZERO,
        };
        let totals = pricing::order_totals(&priced, &charges).unwrap();
        prop_assert_eq!(totals.amount_due, totals.total_amount);
        prop_assert_eq!(
            totals.total_amount,
            (totals.subtotal + tax + shipping).round_dp(2)
        );
    }
}
