// Domain type definitions for checkout pricing
// Shared enums used by the strategies, the rule stores and the HTTP layer

use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

/// Membership tier of the customer placing the order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MembershipTier {
    /// Guest checkout or customer without a membership
    None,

    /// Regular member
    Standard,

    /// Paying member, eligible for the premium discount
    Premium,
}

impl MembershipTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            MembershipTier::None => "NONE",
            MembershipTier::Standard => "STANDARD",
            MembershipTier::Premium => "PREMIUM",
        }
    }
}

impl Default for MembershipTier {
    fn default() -> Self {
        MembershipTier::None
    }
}

impl fmt::Display for MembershipTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Category of a stored discount rule
///
/// Matches the `discount_type` column of the `discounts` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuleType {
    PremiumMember,
    Student,
    Bundle,
    BookGenre,
}

impl RuleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleType::PremiumMember => "PREMIUM_MEMBER",
            RuleType::Student => "STUDENT",
            RuleType::Bundle => "BUNDLE",
            RuleType::BookGenre => "BOOK_GENRE",
        }
    }
}

impl fmt::Display for RuleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for RuleType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PREMIUM_MEMBER" => Ok(RuleType::PremiumMember),
            "STUDENT" => Ok(RuleType::Student),
            "BUNDLE" => Ok(RuleType::Bundle),
            "BOOK_GENRE" => Ok(RuleType::BookGenre),
            _ => Err(format!("Invalid rule type: {}", s)),
        }
    }
}

/// How the value of a discount rule is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiscountKind {
    /// Value is a percentage of the subtotal (e.g., 15 = 15% off)
    Percentage,

    /// Value is a fixed amount subtracted from the subtotal, capped at the subtotal
    FlatAmount,
}

impl DiscountKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiscountKind::Percentage => "PERCENTAGE",
            DiscountKind::FlatAmount => "FLAT_AMOUNT",
        }
    }
}

impl Default for DiscountKind {
    fn default() -> Self {
        DiscountKind::Percentage
    }
}

impl fmt::Display for DiscountKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for DiscountKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PERCENTAGE" => Ok(DiscountKind::Percentage),
            "FLAT_AMOUNT" => Ok(DiscountKind::FlatAmount),
            _ => Err(format!("Invalid discount kind: {}", s)),
        }
    }
}

/// Identifies which strategy produced a discount result
///
/// The declaration order is the tie-break priority: earlier variants win ties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StrategyKind {
    PremiumMember,
    Student,
    BookGenre,
    Bundle,
    NoDiscount,
}

impl StrategyKind {
    /// All strategy kinds in priority order
    pub const ALL: [StrategyKind; 5] = [
        StrategyKind::PremiumMember,
        StrategyKind::Student,
        StrategyKind::BookGenre,
        StrategyKind::Bundle,
        StrategyKind::NoDiscount,
    ];

    /// Stable code reported to callers and written to logs
    pub fn code(&self) -> &'static str {
        match self {
            StrategyKind::PremiumMember => "PREMIUM",
            StrategyKind::Student => "STUDENT",
            StrategyKind::BookGenre => "GENRE",
            StrategyKind::Bundle => "BUNDLE",
            StrategyKind::NoDiscount => "NONE",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            StrategyKind::PremiumMember => "Premium Member",
            StrategyKind::Student => "Student",
            StrategyKind::BookGenre => "Book Genre",
            StrategyKind::Bundle => "Bundle Discount",
            StrategyKind::NoDiscount => "No Discount",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
