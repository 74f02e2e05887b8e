// Rule Repository
//
// Collaborator interfaces consumed by the pricing core: discount rules, the book
// catalog (genre per ISBN) and the customer directory (birth dates). The core only
// reads through these traits; concrete stores live in `pg_store` and below.

use crate::pricing::{
    error::{PricingError, PricingResult},
    price_calculator::PriceCalculator,
    types::{DiscountKind, RuleType},
};
use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use utoipa::ToSchema;

/// Discount rule as stored by the admin tooling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DiscountRule {
    pub rule_id: i64,
    pub rule_type: RuleType,
    /// Narrows the rule to one dimension value (e.g., a genre); `None` applies to any
    pub target_value: Option<String>,
    pub kind: DiscountKind,
    pub value: Decimal,
    pub is_active: bool,
}

impl DiscountRule {
    /// Whether this rule answers a lookup for `rule_type` and `target`
    ///
    /// A rule without a target matches every lookup of its type. A rule with a
    /// target only matches a lookup for that exact value.
    pub fn matches(&self, rule_type: RuleType, target: Option<&str>) -> bool {
        if !self.is_active || self.rule_type != rule_type {
            return false;
        }

        match (self.target_value.as_deref(), target) {
            (None, _) => true,
            (Some(own), Some(wanted)) => own == wanted,
            (Some(_), None) => false,
        }
    }

    /// Reject values that cannot produce a sane discount
    pub fn validate(&self) -> PricingResult<()> {
        if self.value < Decimal::ZERO {
            return Err(PricingError::InvalidRule {
                rule_id: self.rule_id,
                reason: "discount value must be non-negative".to_string(),
            });
        }

        if self.kind == DiscountKind::Percentage && self.value > Decimal::ONE_HUNDRED {
            return Err(PricingError::InvalidRule {
                rule_id: self.rule_id,
                reason: "percentage discount cannot exceed 100%".to_string(),
            });
        }

        Ok(())
    }

    /// Discount this rule grants on `subtotal`, always within [0, subtotal]
    pub fn discount_for(&self, subtotal: Decimal) -> Decimal {
        if subtotal <= Decimal::ZERO {
            return Decimal::ZERO;
        }

        let raw = match self.kind {
            DiscountKind::Percentage => match self.percentage_of(subtotal) {
                Some(amount) => PriceCalculator::round_currency(amount),
                None => {
                    tracing::warn!(
                        "Discount rule {} overflows on subtotal {}, ignoring it",
                        self.rule_id,
                        subtotal
                    );
                    Decimal::ZERO
                }
            },
            DiscountKind::FlatAmount => self.value,
        };

        raw.max(Decimal::ZERO).min(subtotal)
    }

    /// `subtotal * value / 100`; rescales first when the product would overflow
    fn percentage_of(&self, subtotal: Decimal) -> Option<Decimal> {
        subtotal
            .checked_mul(self.value)
            .and_then(|product| product.checked_div(Decimal::ONE_HUNDRED))
            .or_else(|| {
                subtotal
                    .checked_div(Decimal::ONE_HUNDRED)
                    .and_then(|scaled| scaled.checked_mul(self.value))
            })
    }
}

/// Pick the rule granting the highest discount on `subtotal`
///
/// Invalid rules are skipped. Equal amounts resolve to the lowest rule id so
/// duplicate configuration always yields the same winner.
pub fn best_rule(rules: Vec<DiscountRule>, subtotal: Decimal) -> Option<(DiscountRule, Decimal)> {
    let mut best: Option<(DiscountRule, Decimal)> = None;

    for rule in rules {
        if let Err(e) = rule.validate() {
            tracing::warn!("Skipping discount rule: {}", e);
            continue;
        }

        let amount = rule.discount_for(subtotal);
        let replace = match &best {
            None => true,
            Some((current, current_amount)) => {
                amount > *current_amount
                    || (amount == *current_amount && rule.rule_id < current.rule_id)
            }
        };

        if replace {
            best = Some((rule, amount));
        }
    }

    best
}

/// Read access to discount rule definitions
#[async_trait]
pub trait RuleRepository: Send + Sync {
    /// All active rules of `rule_type` matching `target`
    async fn find_active_rules(
        &self,
        rule_type: RuleType,
        target: Option<&str>,
    ) -> PricingResult<Vec<DiscountRule>>;

    /// Every active rule, ordered by rule id
    async fn list_active_rules(&self) -> PricingResult<Vec<DiscountRule>>;

    /// The single best active rule for `subtotal`, with the discount it grants
    ///
    /// `Ok(None)` is a lookup miss, not an error.
    async fn find_active_rule(
        &self,
        rule_type: RuleType,
        target: Option<&str>,
        subtotal: Decimal,
    ) -> PricingResult<Option<(DiscountRule, Decimal)>> {
        let rules = self.find_active_rules(rule_type, target).await?;
        if rules.len() > 1 {
            tracing::debug!(
                "{} active {} rules match target {:?}; picking the highest",
                rules.len(),
                rule_type,
                target
            );
        }
        Ok(best_rule(rules, subtotal))
    }
}

/// Resolves the genre of a catalog item
#[async_trait]
pub trait BookCatalog: Send + Sync {
    /// `Ok(None)` when the item is unknown or has no genre
    async fn genre_of(&self, item_id: &str) -> PricingResult<Option<String>>;
}

/// Resolves customer attributes needed for eligibility checks
#[async_trait]
pub trait CustomerDirectory: Send + Sync {
    async fn birth_date_of(&self, customer_id: i64) -> PricingResult<Option<NaiveDate>>;
}

/// In-memory store backed by plain collections
///
/// Used for statically configured deployments and throughout the tests.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPricingStore {
    rules: Vec<DiscountRule>,
    genres: HashMap<String, String>,
    birth_dates: HashMap<i64, NaiveDate>,
}

impl InMemoryPricingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rule(mut self, rule: DiscountRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Add an active percentage rule with the next free id
    pub fn with_percentage(self, rule_type: RuleType, target: Option<&str>, percentage: Decimal) -> Self {
        self.with_value(rule_type, target, DiscountKind::Percentage, percentage)
    }

    /// Add an active flat-amount rule with the next free id
    pub fn with_flat_amount(self, rule_type: RuleType, target: Option<&str>, amount: Decimal) -> Self {
        self.with_value(rule_type, target, DiscountKind::FlatAmount, amount)
    }

    fn with_value(
        self,
        rule_type: RuleType,
        target: Option<&str>,
        kind: DiscountKind,
        value: Decimal,
    ) -> Self {
        let rule_id = self.rules.iter().map(|r| r.rule_id).max().unwrap_or(0) + 1;
        self.with_rule(DiscountRule {
            rule_id,
            rule_type,
            target_value: target.map(str::to_string),
            kind,
            value,
            is_active: true,
        })
    }

    pub fn with_genre(mut self, item_id: &str, genre: &str) -> Self {
        self.genres.insert(item_id.to_string(), genre.to_string());
        self
    }

    pub fn with_birth_date(mut self, customer_id: i64, birth_date: NaiveDate) -> Self {
        self.birth_dates.insert(customer_id, birth_date);
        self
    }
}

#[async_trait]
impl RuleRepository for InMemoryPricingStore {
    async fn find_active_rules(
        &self,
        rule_type: RuleType,
        target: Option<&str>,
    ) -> PricingResult<Vec<DiscountRule>> {
        Ok(self
            .rules
            .iter()
            .filter(|rule| rule.matches(rule_type, target))
            .cloned()
            .collect())
    }

    async fn list_active_rules(&self) -> PricingResult<Vec<DiscountRule>> {
        let mut rules: Vec<DiscountRule> =
            self.rules.iter().filter(|rule| rule.is_active).cloned().collect();
        rules.sort_by_key(|rule| rule.rule_id);
        Ok(rules)
    }
}

#[async_trait]
impl BookCatalog for InMemoryPricingStore {
    async fn genre_of(&self, item_id: &str) -> PricingResult<Option<String>> {
        Ok(self.genres.get(item_id).cloned())
    }
}

#[async_trait]
impl CustomerDirectory for InMemoryPricingStore {
    async fn birth_date_of(&self, customer_id: i64) -> PricingResult<Option<NaiveDate>> {
        Ok(self.birth_dates.get(&customer_id).copied())
    }
}
