//! Strategy table and interest-rate policy.
//!
//! The policy is fixed, not configurable at runtime: conservative prices one
//! percentage point above the market average for a wide redemption buffer,
//! moderate matches the market, aggressive prices one point below and accepts
//! slower trove processing priority.

use alloy_primitives::U256;

use crate::constants::{MAX_ANNUAL_INTEREST_RATE_PCT, MIN_ANNUAL_INTEREST_RATE_PCT};
use crate::models::RiskLevel;

#[derive(Debug, Clone, Copy)]
pub struct Strategy {
    pub name: &'static str,
    /// Target collateral ratio, percent.
    pub min_cr: u32,
    pub description: &'static str,
}

const CONSERVATIVE: Strategy = Strategy {
    name: "Conservative",
    min_cr: 200,
    description: "Very safe position with a wide liquidation buffer.",
};

const MODERATE: Strategy = Strategy {
    name: "Moderate",
    min_cr: 160,
    description: "Balanced position between safety and capital efficiency.",
};

const AGGRESSIVE: Strategy = Strategy {
    name: "Aggressive",
    min_cr: 130,
    description: "Higher yield with a thin liquidation buffer; watch closely.",
};

pub fn strategy_for(level: RiskLevel) -> &'static Strategy {
    match level {
        RiskLevel::Conservative => &CONSERVATIVE,
        RiskLevel::Moderate => &MODERATE,
        RiskLevel::Aggressive => &AGGRESSIVE,
    }
}

/// Clamp an annual interest rate (percent) to the bounds enforced on-chain.
pub fn clamp_rate_pct(rate_pct: f64) -> f64 {
    rate_pct.clamp(MIN_ANNUAL_INTEREST_RATE_PCT, MAX_ANNUAL_INTEREST_RATE_PCT)
}

/// The rate recommendation calculator: pure function of the risk level and
/// the branch's current market average rate (percent in, percent out).
pub fn recommended_rate_pct(level: RiskLevel, market_avg_pct: f64) -> f64 {
    let raw = match level {
        RiskLevel::Conservative => market_avg_pct + 1.0,
        RiskLevel::Moderate => market_avg_pct,
        RiskLevel::Aggressive => market_avg_pct - 1.0,
    };
    clamp_rate_pct(raw)
}

/// Percent to 18-decimal fixed point: 1% = 1e16.
pub fn pct_to_rate_wei(pct: f64) -> U256 {
    let scaled = (pct * 1e16).round();
    if scaled <= 0.0 {
        return U256::ZERO;
    }
    U256::from(scaled as u128)
}
