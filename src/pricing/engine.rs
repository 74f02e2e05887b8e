// Discount Selection Engine
//
// Evaluates every strategy once, in priority order, and keeps the single largest
// discount. Discounts never stack. On equal amounts the strategy evaluated first
// wins, so the outcome is deterministic for identical inputs and rules.

use crate::pricing::{
    context::OrderContext,
    metrics::PerformanceMetrics,
    repository::RuleRepository,
    strategy::DiscountResult,
    types::StrategyKind,
};
use rust_decimal::Decimal;
use std::sync::Arc;

/// Winning discount plus every candidate that was considered
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedDiscount {
    pub winner: DiscountResult,
    /// One entry per strategy, in priority order
    pub candidates: Vec<DiscountResult>,
}

/// Picks the best discount for an order
#[derive(Clone)]
pub struct SelectionEngine {
    rules: Arc<dyn RuleRepository>,
    metrics: PerformanceMetrics,
}

impl SelectionEngine {
    pub fn new(rules: Arc<dyn RuleRepository>, metrics: PerformanceMetrics) -> Self {
        Self { rules, metrics }
    }

    pub fn rules(&self) -> &dyn RuleRepository {
        self.rules.as_ref()
    }

    /// Evaluate all strategies against `ctx` and select the largest discount
    ///
    /// Never fails: a strategy whose rule lookup fails contributes zero. When every
    /// strategy yields zero the winner is the no-discount sentinel.
    pub async fn select(&self, ctx: &OrderContext) -> SelectedDiscount {
        let mut candidates = Vec::with_capacity(StrategyKind::ALL.len());
        for strategy in StrategyKind::ALL {
            let result = strategy
                .evaluate(ctx, self.rules.as_ref(), &self.metrics)
                .await;
            tracing::debug!(
                "Strategy {} offered {} (rule {:?})",
                result.code,
                result.amount,
                result.rule_id
            );
            candidates.push(result);
        }

        let winner = pick_winner(&candidates);
        SelectedDiscount { winner, candidates }
    }
}

/// Largest amount wins; the first of equal amounts wins
fn pick_winner(candidates: &[DiscountResult]) -> DiscountResult {
    let mut best: Option<&DiscountResult> = None;
    for candidate in candidates {
        if candidate.amount <= Decimal::ZERO {
            continue;
        }
        match best {
            Some(current) if candidate.amount <= current.amount => {}
            _ => best = Some(candidate),
        }
    }

    best.cloned().unwrap_or_else(DiscountResult::none)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricing::repository::InMemoryPricingStore;
    use crate::pricing::types::{MembershipTier, RuleType, StrategyKind};
    use rust_decimal_macros::dec;

    fn catalog_rules() -> InMemoryPricingStore {
        InMemoryPricingStore::new()
            .with_percentage(RuleType::PremiumMember, None, dec!(15))
            .with_percentage(RuleType::Student, None, dec!(10))
            .with_percentage(RuleType::BookGenre, Some("Programming"), dec!(10))
            .with_percentage(RuleType::Bundle, None, dec!(5))
    }

    fn engine(store: InMemoryPricingStore) -> SelectionEngine {
        SelectionEngine::new(Arc::new(store), PerformanceMetrics::new())
    }

    fn candidate(kind: StrategyKind, amount: Decimal) -> DiscountResult {
        DiscountResult {
            amount,
            ..DiscountResult::not_applicable(kind)
        }
    }

    #[test]
    fn test_pick_winner_strictly_greater() {
        let candidates = vec![
            candidate(StrategyKind::PremiumMember, dec!(5)),
            candidate(StrategyKind::Student, dec!(8)),
            candidate(StrategyKind::BookGenre, dec!(8)),
            candidate(StrategyKind::Bundle, dec!(3)),
            DiscountResult::none(),
        ];
        assert_eq!(pick_winner(&candidates).kind, StrategyKind::Student);
    }

    #[test]
    fn test_pick_winner_all_zero() {
        let candidates: Vec<DiscountResult> = StrategyKind::ALL
            .iter()
            .map(|kind| DiscountResult::not_applicable(*kind))
            .collect();
        assert_eq!(pick_winner(&candidates), DiscountResult::none());
        assert_eq!(pick_winner(&[]), DiscountResult::none());
    }

    #[tokio::test]
    async fn test_premium_beats_student() {
        let ctx = OrderContext::builder(dec!(100.00))
            .tier(MembershipTier::Premium)
            .age(Some(20))
            .line("isbn-1", 1, None)
            .build();

        let selected = engine(catalog_rules()).select(&ctx).await;
        assert_eq!(selected.winner.kind, StrategyKind::PremiumMember);
        assert_eq!(selected.winner.amount, dec!(15.00));
        assert_eq!(selected.candidates.len(), 5);
        assert_eq!(selected.candidates[1].amount, dec!(10.00));
    }

    #[tokio::test]
    async fn test_genre_wins_over_bundle() {
        let ctx = OrderContext::builder(dec!(50.00))
            .line("isbn-1", 1, Some("Programming".to_string()))
            .line("isbn-2", 1, Some("Programming".to_string()))
            .line("isbn-3", 1, Some("Programming".to_string()))
            .build();

        let selected = engine(catalog_rules()).select(&ctx).await;
        assert_eq!(selected.winner.kind, StrategyKind::BookGenre);
        assert_eq!(selected.winner.amount, dec!(5.00));
        assert_eq!(selected.candidates[3].amount, dec!(2.50));
    }

    #[tokio::test]
    async fn test_tie_goes_to_higher_priority() {
        let store = InMemoryPricingStore::new()
            .with_percentage(RuleType::Student, None, dec!(10))
            .with_percentage(RuleType::Bundle, None, dec!(10));
        let ctx = OrderContext::builder(dec!(80.00))
            .age(Some(19))
            .line("isbn-1", 3, None)
            .build();

        let selected = engine(store).select(&ctx).await;
        assert_eq!(selected.winner.kind, StrategyKind::Student);
        assert_eq!(selected.winner.amount, dec!(8.00));
    }

    #[tokio::test]
    async fn test_premium_wins_tie_with_student() {
        let store = InMemoryPricingStore::new()
            .with_percentage(RuleType::PremiumMember, None, dec!(10))
            .with_percentage(RuleType::Student, None, dec!(10));
        let ctx = OrderContext::builder(dec!(60.00))
            .tier(MembershipTier::Premium)
            .age(Some(20))
            .line("isbn-1", 1, None)
            .build();

        let selected = engine(store).select(&ctx).await;
        assert_eq!(selected.candidates[0].amount, dec!(6.00));
        assert_eq!(selected.candidates[1].amount, dec!(6.00));
        assert_eq!(selected.winner.kind, StrategyKind::PremiumMember);
        assert_eq!(selected.winner.code, "PREMIUM");
    }

    #[tokio::test]
    async fn test_nothing_applies() {
        let ctx = OrderContext::builder(dec!(40.00))
            .tier(MembershipTier::Standard)
            .age(Some(40))
            .line("isbn-1", 1, None)
            .build();

        let selected = engine(catalog_rules()).select(&ctx).await;
        assert_eq!(selected.winner, DiscountResult::none());
        assert_eq!(selected.winner.code, "NONE");
    }

    #[tokio::test]
    async fn test_zero_subtotal_selects_no_discount() {
        let ctx = OrderContext::builder(Decimal::ZERO)
            .tier(MembershipTier::Premium)
            .build();

        let selected = engine(catalog_rules()).select(&ctx).await;
        assert_eq!(selected.winner.kind, StrategyKind::NoDiscount);
    }

    #[tokio::test]
    async fn test_flat_amount_can_beat_percentage() {
        let store = catalog_rules().with_flat_amount(RuleType::Bundle, None, dec!(20));
        let ctx = OrderContext::builder(dec!(100.00))
            .tier(MembershipTier::Premium)
            .line("isbn-1", 4, None)
            .build();

        let selected = engine(store).select(&ctx).await;
        assert_eq!(selected.winner.kind, StrategyKind::Bundle);
        assert_eq!(selected.winner.amount, dec!(20));
    }
}
