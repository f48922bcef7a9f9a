//! Line and order totals in integer minor currency units.
//!
//! Both functions use checked arithmetic and return `None` on overflow so the
//! caller can reject the request before anything is written.

/// `unit_price * quantity`.
pub fn line_total(unit_price: i64, quantity: i32) -> Option<i64> {
    debug_assert!(unit_price >= 0, "unit price must be non-negative");
    debug_assert!(quantity >= 1, "quantity must be at least 1");
    unit_price.checked_mul(i64::from(quantity))
}

/// Sum of line totals; an empty sequence totals zero.
pub fn order_total<I>(line_totals: I) -> Option<i64>
where
    I: IntoIterator<Item = i64>,
{
    line_totals
        .into_iter()
        .try_fold(0i64, |acc, total| acc.checked_add(total))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_total_multiplies_price_by_quantity() {
        assert_eq!(line_total(1_000, 3), Some(3_000));
        assert_eq!(line_total(0, 5), Some(0));
    }

    #[test]
    fn line_total_detects_overflow() {
        assert_eq!(line_total(i64::MAX, 2), None);
    }

    #[test]
    fn order_total_of_nothing_is_zero() {
        assert_eq!(order_total(Vec::new()), Some(0));
    }

    #[test]
    fn order_total_sums_lines() {
        assert_eq!(order_total([3_000, 500, 700]), Some(4_200));
    }

    #[test]
    fn order_total_detects_overflow() {
        assert_eq!(order_total([i64::MAX, 1]), None);
    }
}
