// Order Context
//
// Immutable snapshot of one checkout attempt. Built once per pricing request;
// enrichment (genres, age) produces a new context instead of mutating this one.

use crate::pricing::{
    error::{PricingError, PricingResult},
    types::MembershipTier,
};
use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Quantity and optional genre of one cart line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLine {
    pub quantity: u32,
    pub genre: Option<String>,
}

/// Snapshot of a checkout attempt
#[derive(Debug, Clone, PartialEq)]
pub struct OrderContext {
    subtotal: Decimal,
    tier: MembershipTier,
    age: Option<u32>,
    customer_id: Option<i64>,
    lines: BTreeMap<String, CartLine>,
}

impl OrderContext {
    /// Start building a context for the given subtotal
    pub fn builder(subtotal: Decimal) -> OrderContextBuilder {
        OrderContextBuilder {
            subtotal,
            tier: MembershipTier::None,
            age: None,
            customer_id: None,
            lines: BTreeMap::new(),
        }
    }

    pub fn subtotal(&self) -> Decimal {
        self.subtotal
    }

    pub fn tier(&self) -> MembershipTier {
        self.tier
    }

    pub fn age(&self) -> Option<u32> {
        self.age
    }

    pub fn customer_id(&self) -> Option<i64> {
        self.customer_id
    }

    /// Cart lines keyed by item identifier (ISBN)
    pub fn lines(&self) -> &BTreeMap<String, CartLine> {
        &self.lines
    }

    /// Sum of quantities across every cart line
    pub fn total_quantity(&self) -> u64 {
        self.lines.values().map(|line| u64::from(line.quantity)).sum()
    }

    /// Distinct genres present in the cart, in sorted order
    pub fn distinct_genres(&self) -> BTreeSet<&str> {
        self.lines
            .values()
            .filter_map(|line| line.genre.as_deref())
            .collect()
    }

    /// Item identifiers whose genre still has to be resolved
    pub fn items_missing_genre(&self) -> Vec<&str> {
        self.lines
            .iter()
            .filter(|(_, line)| line.genre.is_none())
            .map(|(item_id, _)| item_id.as_str())
            .collect()
    }

    /// Check the preconditions of a pricing call
    ///
    /// A negative subtotal is rejected rather than clamped.
    pub fn validate(&self) -> PricingResult<()> {
        if self.subtotal < Decimal::ZERO {
            return Err(PricingError::Validation(format!(
                "Subtotal must be non-negative, got {}",
                self.subtotal
            )));
        }

        for (item_id, line) in &self.lines {
            if item_id.trim().is_empty() {
                return Err(PricingError::Validation(
                    "Cart line item id must not be empty".to_string(),
                ));
            }
            if line.quantity == 0 {
                return Err(PricingError::Validation(format!(
                    "Quantity for item {} must be positive",
                    item_id
                )));
            }
        }

        Ok(())
    }

    /// Return a copy with resolved genres filled in and, if known, the derived age
    ///
    /// Genres already present on a line are kept. An age already present is kept.
    pub fn enriched(&self, genres: &HashMap<String, String>, age: Option<u32>) -> OrderContext {
        let lines = self
            .lines
            .iter()
            .map(|(item_id, line)| {
                let genre = line
                    .genre
                    .clone()
                    .or_else(|| genres.get(item_id).cloned());
                (
                    item_id.clone(),
                    CartLine {
                        quantity: line.quantity,
                        genre,
                    },
                )
            })
            .collect();

        OrderContext {
            subtotal: self.subtotal,
            tier: self.tier,
            age: self.age.or(age),
            customer_id: self.customer_id,
            lines,
        }
    }
}

/// Builder for [`OrderContext`]
#[derive(Debug, Clone)]
pub struct OrderContextBuilder {
    subtotal: Decimal,
    tier: MembershipTier,
    age: Option<u32>,
    customer_id: Option<i64>,
    lines: BTreeMap<String, CartLine>,
}

impl OrderContextBuilder {
    pub fn tier(mut self, tier: MembershipTier) -> Self {
        self.tier = tier;
        self
    }

    pub fn age(mut self, age: Option<u32>) -> Self {
        self.age = age;
        self
    }

    pub fn customer_id(mut self, customer_id: Option<i64>) -> Self {
        self.customer_id = customer_id;
        self
    }

    /// Add a cart line; repeated item ids accumulate their quantity
    pub fn line(mut self, item_id: impl Into<String>, quantity: u32, genre: Option<String>) -> Self {
        let entry = self.lines.entry(item_id.into()).or_insert(CartLine {
            quantity: 0,
            genre: None,
        });
        entry.quantity = entry.quantity.saturating_add(quantity);
        if entry.genre.is_none() {
            entry.genre = genre;
        }
        self
    }

    pub fn build(self) -> OrderContext {
        OrderContext {
            subtotal: self.subtotal,
            tier: self.tier,
            age: self.age,
            customer_id: self.customer_id,
            lines: self.lines,
        }
    }
}

/// Age in whole years on `today` for someone born on `birth_date`
///
/// Returns `None` for birth dates in the future.
pub fn age_on(birth_date: NaiveDate, today: NaiveDate) -> Option<u32> {
    if birth_date > today {
        return None;
    }

    let mut years = today.year() - birth_date.year();
    if (today.month(), today.day()) < (birth_date.month(), birth_date.day()) {
        years -= 1;
    }

    u32::try_from(years).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_builder_accumulates_repeated_items() {
        let ctx = OrderContext::builder(dec!(30.00))
            .line("978-0", 1, Some("Programming".to_string()))
            .line("978-0", 2, None)
            .line("978-1", 1, None)
            .build();

        assert_eq!(ctx.lines().len(), 2);
        assert_eq!(ctx.lines()["978-0"].quantity, 3);
        assert_eq!(ctx.lines()["978-0"].genre.as_deref(), Some("Programming"));
        assert_eq!(ctx.total_quantity(), 4);
    }

    #[test]
    fn test_distinct_genres() {
        let ctx = OrderContext::builder(dec!(10))
            .line("a", 1, Some("Fantasy".to_string()))
            .line("b", 1, Some("Fantasy".to_string()))
            .line("c", 1, Some("History".to_string()))
            .line("d", 1, None)
            .build();

        let genres: Vec<&str> = ctx.distinct_genres().into_iter().collect();
        assert_eq!(genres, vec!["Fantasy", "History"]);
        assert_eq!(ctx.items_missing_genre(), vec!["d"]);
    }

    #[test]
    fn test_validate_rejects_negative_subtotal() {
        let ctx = OrderContext::builder(dec!(-0.01)).build();
        assert!(matches!(ctx.validate(), Err(PricingError::Validation(_))));
    }

    #[test]
    fn test_validate_rejects_zero_quantity_and_blank_item() {
        let ctx = OrderContext::builder(dec!(10)).line("isbn", 0, None).build();
        assert!(ctx.validate().is_err());

        let ctx = OrderContext::builder(dec!(10)).line("  ", 1, None).build();
        assert!(ctx.validate().is_err());
    }

    #[test]
    fn test_validate_accepts_zero_subtotal_and_empty_cart() {
        let ctx = OrderContext::builder(Decimal::ZERO).build();
        assert!(ctx.validate().is_ok());
    }

    #[test]
    fn test_enriched_keeps_existing_values() {
        let ctx = OrderContext::builder(dec!(10))
            .age(Some(30))
            .line("a", 1, Some("Poetry".to_string()))
            .line("b", 1, None)
            .build();

        let mut genres = HashMap::new();
        genres.insert("a".to_string(), "Drama".to_string());
        genres.insert("b".to_string(), "Science".to_string());

        let enriched = ctx.enriched(&genres, Some(12));
        assert_eq!(enriched.lines()["a"].genre.as_deref(), Some("Poetry"));
        assert_eq!(enriched.lines()["b"].genre.as_deref(), Some("Science"));
        assert_eq!(enriched.age(), Some(30));

        // original untouched
        assert_eq!(ctx.lines()["b"].genre, None);
    }

    #[test]
    fn test_age_on_birthday_boundaries() {
        let birth = date(2000, 6, 15);
        assert_eq!(age_on(birth, date(2024, 6, 14)), Some(23));
        assert_eq!(age_on(birth, date(2024, 6, 15)), Some(24));
        assert_eq!(age_on(birth, date(2025, 6, 15)), Some(25));
        assert_eq!(age_on(birth, date(2000, 6, 15)), Some(0));
        assert_eq!(age_on(birth, date(1999, 1, 1)), None);
    }

    #[test]
    fn test_age_on_leap_day() {
        let birth = date(2004, 2, 29);
        assert_eq!(age_on(birth, date(2023, 2, 28)), Some(18));
        assert_eq!(age_on(birth, date(2023, 3, 1)), Some(19));
    }
}
