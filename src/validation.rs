// Validation utilities module
// Custom validator functions for checkout request fields

use rust_decimal::Decimal;
use validator::ValidationError;

/// Validates that a monetary amount is zero or positive
pub fn validate_non_negative_amount(amount: &Decimal) -> Result<(), ValidationError> {
    if amount.is_sign_negative() && !amount.is_zero() {
        Err(ValidationError::new("amount_must_be_non_negative"))
    } else {
        Ok(())
    }
}

/// Validates that an item identifier has at least one non-whitespace character
pub fn validate_item_id(item_id: &str) -> Result<(), ValidationError> {
    if item_id.trim().is_empty() {
        Err(ValidationError::new("item_id_must_not_be_blank"))
    } else {
        Ok(())
    }
}
