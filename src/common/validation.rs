// src/common/validation.rs
//
// Validações customizadas usadas pelos payloads (`#[validate(custom(...))]`).

use rust_decimal::Decimal;
use validator::ValidationError;

use crate::common::fiscal;

fn error(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(message.into());
    err
}

pub fn validate_not_negative(val: &Decimal) -> Result<(), ValidationError> {
    if val.is_sign_negative() && !val.is_zero() {
        let mut err = error("range", "must_not_be_negative");
        err.add_param("min".into(), &0.0);
        return Err(err);
    }
    Ok(())
}

pub fn validate_positive(val: &Decimal) -> Result<(), ValidationError> {
    if *val <= Decimal::ZERO {
        return Err(error("range", "must_be_positive"));
    }
    Ok(())
}

pub fn validate_tax_id(val: &str) -> Result<(), ValidationError> {
    if !fiscal::is_valid_tax_id(val) {
        return Err(error("tax_id", "invalid_tax_id"));
    }
    Ok(())
}

pub fn validate_not_blank(val: &str) -> Result<(), ValidationError> {
    if val.trim().is_empty() {
        return Err(error("required", "required"));
    }
    Ok(())
}

pub fn date_range_error() -> ValidationError {
    error("date_range", "invalid_date_range")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decimal_rules() {
        assert!(validate_not_negative(&Decimal::ZERO).is_ok());
        assert!(validate_not_negative(&Decimal::new(-1, 2)).is_err());
        assert!(validate_positive(&Decimal::ZERO).is_err());
        assert!(validate_positive(&Decimal::new(1, 2)).is_ok());
    }

    #[test]
    fn blank_strings_are_rejected() {
        assert!(validate_not_blank("   ").is_err());
        assert!(validate_not_blank("Parafuso").is_ok());
    }
}
