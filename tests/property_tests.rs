//! Property-based tests for the document total invariant:
//! total = Σ(quantity × unit_price) + freight − discount.

use matreq_api::services::material_requests::{compute_total, line_total};
use proptest::prelude::*;
use rust_decimal::Decimal;

/// Money values in cents, kept small enough that sums never overflow.
fn money() -> impl Strategy<Value = Decimal> {
    (0i64..=10_000_000).prop_map(|cents| Decimal::new(cents, 2))
}

fn quantity() -> impl Strategy<Value = Decimal> {
    (1i64..=100_000).prop_map(|thousandths| Decimal::new(thousandths, 3))
}

proptest! {
    #[test]
    fn total_matches_the_invariant(
        lines in prop::collection::vec((quantity(), money()), 0..12),
        freight in money(),
        discount in money(),
    ) {
        let line_totals: Vec<Decimal> = lines
            .iter()
            .map(|(qty, price)| line_total(*qty, *price))
            .collect();

        let expected: Decimal =
            line_totals.iter().copied().sum::<Decimal>() + freight - discount;
        prop_assert_eq!(compute_total(&line_totals, freight, discount), expected);
    }

    #[test]
    fn total_is_order_independent(
        lines in prop::collection::vec(money(), 1..12),
        freight in money(),
        discount in money(),
    ) {
        let mut reversed = lines.clone();
        reversed.reverse();
        prop_assert_eq!(
            compute_total(&lines, freight, discount),
            compute_total(&reversed, freight, discount)
        );
    }

    #[test]
    fn adding_a_line_moves_the_total_by_exactly_its_amount(
        lines in prop::collection::vec(money(), 0..12),
        extra in money(),
        freight in money(),
        discount in money(),
    ) {
        let base = compute_total(&lines, freight, discount);
        let mut extended = lines.clone();
        extended.push(extra);
        prop_assert_eq!(compute_total(&extended, freight, discount), base + extra);
    }

    #[test]
    fn line_total_scales_linearly_in_quantity(
        qty in quantity(),
        price in money(),
    ) {
        let doubled = qty + qty;
        prop_assert_eq!(
            line_total(doubled, price),
            line_total(qty, price) + line_total(qty, price)
        );
    }
}
