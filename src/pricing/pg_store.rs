// PostgreSQL Pricing Store
//
// sqlx-backed implementation of the pricing collaborators. Reads from tables that
// are provisioned and maintained outside this service:
//
//   discounts (discount_id BIGINT, discount_type VARCHAR, target_value VARCHAR NULL,
//              amount_kind VARCHAR, amount NUMERIC, active BOOLEAN)
//   books     (isbn VARCHAR, genre VARCHAR NULL)
//   users     (user_id BIGINT, birth_date DATE NULL)

use crate::pricing::{
    error::{PricingError, PricingResult},
    repository::{BookCatalog, CustomerDirectory, DiscountRule, RuleRepository},
    types::{DiscountKind, RuleType},
};
use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};

/// Raw row of the discounts table
#[derive(Debug, Clone, FromRow)]
struct DiscountRuleRow {
    discount_id: i64,
    discount_type: String,
    target_value: Option<String>,
    amount_kind: String,
    amount: Decimal,
    active: bool,
}

impl TryFrom<DiscountRuleRow> for DiscountRule {
    type Error = PricingError;

    fn try_from(row: DiscountRuleRow) -> Result<Self, Self::Error> {
        let rule_type: RuleType = row.discount_type.parse().map_err(|reason| {
            PricingError::InvalidRule {
                rule_id: row.discount_id,
                reason,
            }
        })?;
        let kind: DiscountKind = row.amount_kind.parse().map_err(|reason| {
            PricingError::InvalidRule {
                rule_id: row.discount_id,
                reason,
            }
        })?;

        Ok(DiscountRule {
            rule_id: row.discount_id,
            rule_type,
            target_value: row.target_value,
            kind,
            value: row.amount,
            is_active: row.active,
        })
    }
}

/// Pricing collaborators backed by PostgreSQL
#[derive(Clone)]
pub struct PgPricingStore {
    pool: PgPool,
}

impl PgPricingStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RuleRepository for PgPricingStore {
    async fn find_active_rules(
        &self,
        rule_type: RuleType,
        target: Option<&str>,
    ) -> PricingResult<Vec<DiscountRule>> {
        let rows = sqlx::query_as::<_, DiscountRuleRow>(
            r#"
            SELECT discount_id, discount_type, target_value, amount_kind, amount, active
            FROM discounts
            WHERE discount_type = $1
              AND active = TRUE
              AND (target_value IS NULL OR target_value = $2)
            ORDER BY discount_id
            "#,
        )
        .bind(rule_type.as_str())
        .bind(target)
        .fetch_all(&self.pool)
        .await?;

        Ok(readable_rules(rows))
    }

    async fn list_active_rules(&self) -> PricingResult<Vec<DiscountRule>> {
        let rows = sqlx::query_as::<_, DiscountRuleRow>(
            r#"
            SELECT discount_id, discount_type, target_value, amount_kind, amount, active
            FROM discounts
            WHERE active = TRUE
            ORDER BY discount_id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(readable_rules(rows))
    }
}

/// Rows with an unknown type or kind are logged and skipped
fn readable_rules(rows: Vec<DiscountRuleRow>) -> Vec<DiscountRule> {
    rows.into_iter()
        .filter_map(|row| match DiscountRule::try_from(row) {
            Ok(rule) => Some(rule),
            Err(e) => {
                tracing::warn!("Ignoring unreadable discount row: {}", e);
                None
            }
        })
        .collect()
}

#[async_trait]
impl BookCatalog for PgPricingStore {
    async fn genre_of(&self, item_id: &str) -> PricingResult<Option<String>> {
        let genre: Option<Option<String>> =
            sqlx::query_scalar("SELECT genre FROM books WHERE isbn = $1")
                .bind(item_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(genre.flatten())
    }
}

#[async_trait]
impl CustomerDirectory for PgPricingStore {
    async fn birth_date_of(&self, customer_id: i64) -> PricingResult<Option<NaiveDate>> {
        let birth_date: Option<Option<NaiveDate>> =
            sqlx::query_scalar("SELECT birth_date FROM users WHERE user_id = $1")
                .bind(customer_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(birth_date.flatten())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn row(discount_type: &str, amount_kind: &str) -> DiscountRuleRow {
        DiscountRuleRow {
            discount_id: 3,
            discount_type: discount_type.to_string(),
            target_value: Some("Programming".to_string()),
            amount_kind: amount_kind.to_string(),
            amount: dec!(5),
            active: true,
        }
    }

    #[test]
    fn test_row_conversion() {
        let rule = DiscountRule::try_from(row("BOOK_GENRE", "PERCENTAGE")).unwrap();
        assert_eq!(rule.rule_id, 3);
        assert_eq!(rule.rule_type, RuleType::BookGenre);
        assert_eq!(rule.kind, DiscountKind::Percentage);
        assert_eq!(rule.target_value.as_deref(), Some("Programming"));
        assert_eq!(rule.value, dec!(5));
        assert!(rule.is_active);
    }

    #[test]
    fn test_row_conversion_rejects_unknown_type() {
        let err = DiscountRule::try_from(row("LOYALTY", "PERCENTAGE")).unwrap_err();
        assert!(matches!(err, PricingError::InvalidRule { rule_id: 3, .. }));

        let err = DiscountRule::try_from(row("BUNDLE", "BOGO")).unwrap_err();
        assert!(matches!(err, PricingError::InvalidRule { .. }));
    }

    #[test]
    fn test_unreadable_rows_are_skipped() {
        let rules = readable_rules(vec![
            row("LOYALTY", "PERCENTAGE"),
            row("BOOK_GENRE", "FLAT_AMOUNT"),
        ]);
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].kind, DiscountKind::FlatAmount);
    }
}
