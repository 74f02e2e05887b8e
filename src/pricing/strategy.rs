// Discount Strategies
//
// Closed set of discount strategies. Each computes one candidate discount for an
// order from the active rule configuration. A strategy never fails: lookup misses
// and store failures both make it contribute zero.

use crate::pricing::{
    context::OrderContext,
    metrics::PerformanceMetrics,
    repository::{DiscountRule, RuleRepository},
    types::{MembershipTier, RuleType, StrategyKind},
};
use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;

/// Youngest age eligible for the student discount
pub const STUDENT_MIN_AGE: u32 = 7;

/// Oldest age eligible for the student discount
pub const STUDENT_MAX_AGE: u32 = 24;

/// Minimum number of copies in the cart for the bundle discount
pub const BUNDLE_MIN_QUANTITY: u64 = 3;

/// Outcome of evaluating one strategy
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct DiscountResult {
    pub kind: StrategyKind,
    /// Never negative; zero means not applicable
    pub amount: Decimal,
    pub label: String,
    pub code: String,
    /// Rule that produced the amount, if any
    pub rule_id: Option<i64>,
}

impl DiscountResult {
    /// The "no discount" sentinel
    pub fn none() -> Self {
        Self::not_applicable(StrategyKind::NoDiscount)
    }

    pub fn not_applicable(kind: StrategyKind) -> Self {
        Self {
            kind,
            amount: Decimal::ZERO,
            label: kind.label().to_string(),
            code: kind.code().to_string(),
            rule_id: None,
        }
    }

    fn from_rule(kind: StrategyKind, label: String, rule: &DiscountRule, amount: Decimal) -> Self {
        Self {
            kind,
            amount,
            label,
            code: kind.code().to_string(),
            rule_id: Some(rule.rule_id),
        }
    }

    pub fn is_applicable(&self) -> bool {
        self.amount > Decimal::ZERO
    }
}

impl StrategyKind {
    /// Whether the order is eligible at all, before any rule lookup
    pub fn is_eligible(&self, ctx: &OrderContext) -> bool {
        match self {
            StrategyKind::PremiumMember => ctx.tier() == MembershipTier::Premium,
            StrategyKind::Student => ctx
                .age()
                .map(|age| (STUDENT_MIN_AGE..=STUDENT_MAX_AGE).contains(&age))
                .unwrap_or(false),
            StrategyKind::BookGenre => !ctx.distinct_genres().is_empty(),
            StrategyKind::Bundle => ctx.total_quantity() >= BUNDLE_MIN_QUANTITY,
            StrategyKind::NoDiscount => true,
        }
    }

    /// Compute this strategy's candidate discount for `ctx`
    pub async fn evaluate(
        &self,
        ctx: &OrderContext,
        rules: &dyn RuleRepository,
        metrics: &PerformanceMetrics,
    ) -> DiscountResult {
        let kind = *self;
        if !kind.is_eligible(ctx) {
            return DiscountResult::not_applicable(kind);
        }

        match kind {
            StrategyKind::PremiumMember => {
                untargeted(kind, RuleType::PremiumMember, ctx, rules, metrics).await
            }
            StrategyKind::Student => untargeted(kind, RuleType::Student, ctx, rules, metrics).await,
            StrategyKind::Bundle => untargeted(kind, RuleType::Bundle, ctx, rules, metrics).await,
            StrategyKind::BookGenre => {
                let mut best = DiscountResult::not_applicable(kind);
                for genre in ctx.distinct_genres() {
                    let found =
                        lookup(rules, metrics, RuleType::BookGenre, Some(genre), ctx.subtotal()).await;
                    if let Some((rule, amount)) = found {
                        if amount > best.amount {
                            let label = format!("{} ({})", kind.label(), genre);
                            best = DiscountResult::from_rule(kind, label, &rule, amount);
                        }
                    }
                }
                best
            }
            StrategyKind::NoDiscount => DiscountResult::none(),
        }
    }
}

/// Strategies backed by a single rule with no target
async fn untargeted(
    kind: StrategyKind,
    rule_type: RuleType,
    ctx: &OrderContext,
    rules: &dyn RuleRepository,
    metrics: &PerformanceMetrics,
) -> DiscountResult {
    match lookup(rules, metrics, rule_type, None, ctx.subtotal()).await {
        Some((rule, amount)) => DiscountResult::from_rule(kind, kind.label().to_string(), &rule, amount),
        None => DiscountResult::not_applicable(kind),
    }
}

/// Rule lookup that folds misses and failures into `None`
async fn lookup(
    rules: &dyn RuleRepository,
    metrics: &PerformanceMetrics,
    rule_type: RuleType,
    target: Option<&str>,
    subtotal: Decimal,
) -> Option<(DiscountRule, Decimal)> {
    metrics.record_rule_lookup();

    match rules.find_active_rule(rule_type, target, subtotal).await {
        Ok(Some(found)) => Some(found),
        Ok(None) => {
            tracing::debug!("No active {} rule for target {:?}", rule_type, target);
            None
        }
        Err(e) => {
            metrics.record_lookup_failure();
            tracing::warn!(
                "Rule lookup for {} / {:?} failed, treating as inactive: {}",
                rule_type,
                target,
                e
            );
            None
        }
    }
}
