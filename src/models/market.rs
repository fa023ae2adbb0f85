use alloy_primitives::U256;
use serde::{Deserialize, Serialize};

use crate::constants;
use crate::error::AppError;

/// Collateral-type-specific partition of the lending protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Branch {
    WCtc,
    LstCtc,
}

impl Branch {
    pub fn index(self) -> u8 {
        match self {
            Branch::WCtc => 0,
            Branch::LstCtc => 1,
        }
    }

    pub fn from_index(index: i64) -> Result<Self, AppError> {
        match index {
            0 => Ok(Branch::WCtc),
            1 => Ok(Branch::LstCtc),
            _ => Err(AppError::Validation(
                "branchIndex must be 0 (wCTC) or 1 (lstCTC)".to_string(),
            )),
        }
    }

    /// Branch for a collateral symbol; anything other than lstCTC falls back
    /// to the wCTC branch.
    pub fn from_collateral_symbol(symbol: &str) -> Self {
        if symbol == "lstCTC" {
            Branch::LstCtc
        } else {
            Branch::WCtc
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Branch::WCtc => "wCTC",
            Branch::LstCtc => "lstCTC",
        }
    }

    pub fn mcr_pct(self) -> f64 {
        match self {
            Branch::WCtc => constants::WCTC_MCR_PCT,
            Branch::LstCtc => constants::LSTCTC_MCR_PCT,
        }
    }

    pub fn ccr_pct(self) -> f64 {
        match self {
            Branch::WCtc => constants::WCTC_CCR_PCT,
            Branch::LstCtc => constants::LSTCTC_CCR_PCT,
        }
    }
}

/// Per-branch market statistics read from deployed contract state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketData {
    pub branch: u8,
    pub collateral_symbol: String,
    pub collateral_address: String,
    pub total_collateral: String,
    #[serde(rename = "totalCollateralUSD")]
    pub total_collateral_usd: String,
    #[serde(rename = "currentCR")]
    pub current_cr: String,
    pub mcr: String,
    pub ccr: String,
    pub ltv: String,
    pub total_borrow: String,
    /// Debt-weighted average annual interest rate, formatted percent.
    pub avg_interest_rate: String,
    pub sp_deposits: String,
    #[serde(rename = "spAPY")]
    pub sp_apy: String,
}

impl MarketData {
    pub fn avg_interest_rate_pct(&self) -> Option<f64> {
        self.avg_interest_rate.parse().ok()
    }
}

/// One trove belonging to a monitored user.
#[derive(Debug, Clone)]
pub struct TrovePosition {
    pub trove_id: u64,
    pub branch: u8,
    pub collateral_symbol: String,
    pub collateral_wei: U256,
    pub debt_wei: U256,
    /// Current collateral ratio, percent.
    pub cr_pct: f64,
    /// Current annual interest rate, percent.
    pub interest_rate_pct: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn branch_index_round_trip() {
        assert_eq!(Branch::from_index(0).unwrap(), Branch::WCtc);
        assert_eq!(Branch::from_index(1).unwrap(), Branch::LstCtc);
        assert!(Branch::from_index(5).is_err());
        assert!(Branch::from_index(-1).is_err());
    }

    #[test]
    fn collateral_symbol_defaults_to_wctc() {
        assert_eq!(Branch::from_collateral_symbol("lstCTC"), Branch::LstCtc);
        assert_eq!(Branch::from_collateral_symbol("wCTC"), Branch::WCtc);
        assert_eq!(Branch::from_collateral_symbol("anything"), Branch::WCtc);
    }
}
