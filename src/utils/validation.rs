//! Validation utilities

use crate::types::*;
use bigdecimal::BigDecimal;

/// Validate that an operation amount is strictly positive
pub fn validate_positive_amount(amount: &BigDecimal) -> LedgerResult<()> {
    if *amount <= BigDecimal::from(0) {
        Err(LedgerError::InvalidAmount(amount.clone()))
    } else {
        Ok(())
    }
}

/// Validate that an account display name is usable
pub fn validate_account_name(name: &str) -> LedgerResult<()> {
    if name.trim().is_empty() {
        return Err(LedgerError::Validation(
            "account name cannot be empty".to_string(),
        ));
    }

    if name.len() > 100 {
        return Err(LedgerError::Validation(
            "account name cannot exceed 100 characters".to_string(),
        ));
    }

    Ok(())
}

/// Validate the shape of an externally visible account number (10 digits)
pub fn validate_account_number(number: &str) -> LedgerResult<()> {
    if number.len() != 10 || !number.chars().all(|c| c.is_ascii_digit()) {
        return Err(LedgerError::Validation(format!(
            "account number must be exactly 10 digits: {number}"
        )));
    }

    Ok(())
}
