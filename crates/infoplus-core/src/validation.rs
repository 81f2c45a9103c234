//! Natural key validation.
//!
//! Natural keys end up inside InfoPlus filter expressions
//! (`sku eq 'ABC123'`), so they must be non-empty, bounded and free of
//! quotes.

use crate::error::ValidationError;

/// Maximum SKU length accepted by InfoPlus.
pub const MAX_SKU_LENGTH: usize = 50;

/// Maximum customer/order number length.
pub const MAX_NUMBER_LENGTH: usize = 50;

fn validate_key(field: &str, value: &str, max: usize) -> Result<(), ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }
    if trimmed.len() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }
    if trimmed.contains('\'') || trimmed.contains('"') {
        return Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "must not contain quotes".to_string(),
        });
    }
    Ok(())
}

/// Validates a product SKU.
pub fn validate_sku(sku: &str) -> Result<(), ValidationError> {
    validate_key("sku", sku, MAX_SKU_LENGTH)
}

/// Validates a customer number.
pub fn validate_customer_number(number: &str) -> Result<(), ValidationError> {
    validate_key("customer number", number, MAX_NUMBER_LENGTH)
}

/// Validates an order number.
pub fn validate_order_number(number: &str) -> Result<(), ValidationError> {
    validate_key("order number", number, MAX_NUMBER_LENGTH)
}

/// Validates a line item quantity.
pub fn validate_quantity(quantity: i64) -> Result<(), ValidationError> {
    if quantity <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }
    Ok(())
}
