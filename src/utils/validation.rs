//! Request field validators. All failures surface as `VALIDATION_ERROR`
//! before any chain or A2A call runs.

use std::sync::OnceLock;

use alloy_primitives::U256;
use regex::Regex;

use crate::error::AppError;

fn address_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^0x[0-9a-fA-F]{40}$").expect("static regex"))
}

/// Validate a 0x-prefixed 40-hex-char address.
pub fn validate_address(value: Option<&str>, field: &str) -> Result<String, AppError> {
    match value {
        Some(v) if address_regex().is_match(v) => Ok(v.to_string()),
        _ => Err(AppError::Validation(format!(
            "Invalid {field}: must be a 0x-prefixed 40-hex-char address"
        ))),
    }
}

/// Presence check; empty strings count as missing.
pub fn validate_required(value: Option<&str>, field: &str) -> Result<String, AppError> {
    match value {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(AppError::Validation(format!(
            "Missing required field: {field}"
        ))),
    }
}

/// Positive decimal integer in 18-decimal wei units.
pub fn validate_positive_amount(value: Option<&str>, field: &str) -> Result<U256, AppError> {
    let raw = validate_required(value, field)?;
    let amount = U256::from_str_radix(&raw, 10)
        .map_err(|_| AppError::Validation(format!("{field} is not a valid integer")))?;
    if amount.is_zero() {
        return Err(AppError::Validation(format!("{field} must be positive")));
    }
    Ok(amount)
}

/// Branch index must be 0 (wCTC) or 1 (lstCTC).
pub fn validate_branch_index(value: Option<i64>) -> Result<u8, AppError> {
    match value {
        Some(0) => Ok(0),
        Some(1) => Ok(1),
        _ => Err(AppError::Validation(
            "branchIndex must be 0 (wCTC) or 1 (lstCTC)".to_string(),
        )),
    }
}

/// Trove ids arrive as either a JSON string or number; normalize to a string.
pub fn validate_trove_id(value: Option<&serde_json::Value>) -> Result<String, AppError> {
    match value {
        Some(serde_json::Value::String(s)) if !s.is_empty() => Ok(s.clone()),
        Some(serde_json::Value::Number(n)) => Ok(n.to_string()),
        _ => Err(AppError::Validation(
            "Missing required field: troveId".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_well_formed_addresses() {
        let addr = format!("0x{}", "f".repeat(40));
        assert_eq!(validate_address(Some(&addr), "userAddress").unwrap(), addr);
    }

    #[test]
    fn rejects_malformed_addresses() {
        for bad in ["bad-addr", "0x1234", "", "0xZZ"] {
            let err = validate_address(Some(bad), "userAddress").unwrap_err();
            assert_eq!(err.code(), "VALIDATION_ERROR");
        }
        assert!(validate_address(None, "userAddress").is_err());
    }

    #[test]
    fn amount_must_be_a_positive_integer() {
        assert_eq!(
            validate_positive_amount(Some("1000"), "amount").unwrap(),
            U256::from(1000u64)
        );
        assert!(validate_positive_amount(Some("0"), "amount").is_err());
        assert!(validate_positive_amount(Some("-5"), "amount").is_err());
        assert!(validate_positive_amount(Some("1.5"), "amount").is_err());
        assert!(validate_positive_amount(None, "amount").is_err());
    }

    #[test]
    fn branch_index_whitelist() {
        assert_eq!(validate_branch_index(Some(0)).unwrap(), 0);
        assert_eq!(validate_branch_index(Some(1)).unwrap(), 1);
        assert!(validate_branch_index(Some(5)).is_err());
        assert!(validate_branch_index(None).is_err());
    }

    #[test]
    fn trove_id_accepts_string_or_number() {
        assert_eq!(
            validate_trove_id(Some(&serde_json::json!("42"))).unwrap(),
            "42"
        );
        assert_eq!(validate_trove_id(Some(&serde_json::json!(7))).unwrap(), "7");
        assert!(validate_trove_id(Some(&serde_json::json!(""))).is_err());
        assert!(validate_trove_id(None).is_err());
    }
}
