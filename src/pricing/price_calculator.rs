use crate::pricing::error::{PricingError, PricingResult};
use rust_decimal::{Decimal, RoundingStrategy};

/// Subtotal and currency arithmetic for checkout pricing
pub struct PriceCalculator;

impl PriceCalculator {
    /// Calculate the total for one cart line
    ///
    /// # Arguments
    /// * `quantity` - Number of copies ordered
    /// * `unit_price` - Price per copy
    ///
    /// # Returns
    /// quantity * unit_price, or a validation error when it does not fit a Decimal
    pub fn line_total(quantity: u32, unit_price: Decimal) -> PricingResult<Decimal> {
        Decimal::from(quantity)
            .checked_mul(unit_price)
            .ok_or_else(|| {
                PricingError::Validation(format!(
                    "Line total of {} x {} is out of range",
                    quantity, unit_price
                ))
            })
    }

    /// Sum of line totals
    pub fn subtotal(line_totals: &[Decimal]) -> PricingResult<Decimal> {
        line_totals
            .iter()
            .try_fold(Decimal::ZERO, |acc, total| acc.checked_add(*total))
            .ok_or_else(|| PricingError::Validation("Subtotal is out of range".to_string()))
    }

    /// Round a monetary amount to cents, midpoint away from zero
    pub fn round_currency(amount: Decimal) -> Decimal {
        amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    }

    /// Final price after subtracting a non-negative discount, floored at zero
    pub fn final_price(subtotal: Decimal, discount: Decimal) -> Decimal {
        subtotal
            .checked_sub(discount)
            .unwrap_or(Decimal::ZERO)
            .max(Decimal::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_line_total_basic() {
        assert_eq!(PriceCalculator::line_total(2, dec!(24.50)).unwrap(), dec!(49.00));
    }

    #[test]
    fn test_line_total_precision() {
        assert_eq!(PriceCalculator::line_total(3, dec!(4.33)).unwrap(), dec!(12.99));
    }

    #[test]
    fn test_subtotal_multiple_lines() {
        let totals = vec![dec!(10.00), dec!(5.50), dec!(3.25)];
        assert_eq!(PriceCalculator::subtotal(&totals).unwrap(), dec!(18.75));
    }

    #[test]
    fn test_subtotal_empty() {
        assert_eq!(PriceCalculator::subtotal(&[]).unwrap(), dec!(0));
    }

    #[test]
    fn test_line_total_overflow_is_rejected() {
        let err = PriceCalculator::line_total(2, Decimal::MAX).unwrap_err();
        assert!(matches!(err, PricingError::Validation(_)));
        assert_eq!(PriceCalculator::line_total(1, Decimal::MAX).unwrap(), Decimal::MAX);
    }

    #[test]
    fn test_subtotal_overflow_is_rejected() {
        let totals = vec![Decimal::MAX, dec!(1)];
        assert!(matches!(
            PriceCalculator::subtotal(&totals),
            Err(PricingError::Validation(_))
        ));
    }

    #[test]
    fn test_round_currency() {
        assert_eq!(PriceCalculator::round_currency(dec!(3.335)), dec!(3.34));
        assert_eq!(PriceCalculator::round_currency(dec!(3.334)), dec!(3.33));
        assert_eq!(PriceCalculator::round_currency(dec!(15)), dec!(15));
    }

    #[test]
    fn test_final_price_floor() {
        assert_eq!(PriceCalculator::final_price(dec!(100), dec!(15)), dec!(85));
        assert_eq!(PriceCalculator::final_price(dec!(10), dec!(20)), dec!(0));
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    /// Subtotal equals the sum of quantity * unit price over all lines
    #[test]
    fn prop_subtotal_is_sum_of_line_totals() {
        proptest!(|(
            lines in prop::collection::vec((1u32..=50, 1u32..=20000u32), 0..=15)
        )| {
            let totals: Vec<Decimal> = lines
                .iter()
                .map(|&(qty, cents)| PriceCalculator::line_total(qty, Decimal::new(cents as i64, 2)).unwrap())
                .collect();

            let expected: Decimal = lines
                .iter()
                .map(|&(qty, cents)| Decimal::from(qty) * Decimal::new(cents as i64, 2))
                .sum();

            prop_assert_eq!(PriceCalculator::subtotal(&totals).unwrap(), expected);
        });
    }

    /// Final price stays within [0, subtotal] for any non-negative discount
    #[test]
    fn prop_final_price_bounded() {
        proptest!(|(
            subtotal_cents in 0u32..=1_000_000u32,
            discount_cents in 0u32..=2_000_000u32
        )| {
            let subtotal = Decimal::new(subtotal_cents as i64, 2);
            let discount = Decimal::new(discount_cents as i64, 2);
            let final_price = PriceCalculator::final_price(subtotal, discount);

            prop_assert!(final_price >= Decimal::ZERO);
            prop_assert!(final_price <= subtotal);
        });
    }
}
