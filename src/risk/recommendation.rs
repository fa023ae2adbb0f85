//! Full recommendation derivation for the recommend endpoint.
//!
//! Everything here is a pure function of already-fetched market data; the
//! handler resolves the chain/A2A reads first and the math stays testable.

use alloy_primitives::U256;

use crate::constants::{LST_STAKING_YIELD_PCT, MIN_DEBT_USD};
use crate::models::{AgentRecommendation, Branch, RiskLevel};
use crate::risk::strategy::{pct_to_rate_wei, recommended_rate_pct, strategy_for};

#[derive(Debug, Clone)]
pub struct RecommendationInputs {
    pub risk_level: RiskLevel,
    pub branch: Branch,
    pub collateral_amount_wei: U256,
    /// Current branch collateral price, USD.
    pub price_usd: f64,
    /// Debt-weighted market average annual interest rate, percent.
    pub market_avg_rate_pct: f64,
}

pub fn build_recommendation(inputs: &RecommendationInputs) -> AgentRecommendation {
    let strategy = strategy_for(inputs.risk_level);

    let coll_amount = wei_to_unit(inputs.collateral_amount_wei);
    let coll_value_usd = coll_amount * inputs.price_usd;

    let target_cr = f64::from(strategy.min_cr) / 100.0;
    let recommended_debt_usd = coll_value_usd / target_cr;

    // Protocol enforces a 200 sbUSD debt floor.
    let final_debt_usd = recommended_debt_usd.max(MIN_DEBT_USD);
    let recommended_debt_wei = unit_to_wei(final_debt_usd);

    let mcr = inputs.branch.mcr_pct() / 100.0;
    let liquidation_price = if coll_amount > 0.0 {
        final_debt_usd * mcr / coll_amount
    } else {
        0.0
    };

    let rate_pct = recommended_rate_pct(inputs.risk_level, inputs.market_avg_rate_pct);
    let rate_wei = pct_to_rate_wei(rate_pct);

    let min_cr = f64::from(strategy.min_cr);
    let leverage = min_cr / (min_cr - 100.0);
    let staking_yield = match inputs.branch {
        Branch::LstCtc => LST_STAKING_YIELD_PCT,
        Branch::WCtc => 0.0,
    };
    let net_apy = staking_yield * leverage - rate_pct;

    let drop_needed_pct = if inputs.price_usd > 0.0 {
        (1.0 - liquidation_price / inputs.price_usd) * 100.0
    } else {
        0.0
    };

    let mut reasoning = format!(
        "Current {} price: ${:.4}. Market avg interest rate: {:.2}%. \
         With {} strategy (CR > {}%, leverage {:.1}x), recommended debt is \
         {:.2} sbUSD at {:.2}% interest. Liquidation occurs at ${:.4} \
         ({:.1}% drop needed). Net APY: {:.1}%. {}",
        inputs.branch.symbol(),
        inputs.price_usd,
        inputs.market_avg_rate_pct,
        strategy.name,
        strategy.min_cr,
        leverage,
        final_debt_usd,
        rate_pct,
        liquidation_price,
        drop_needed_pct,
        net_apy,
        strategy.description,
    );

    if rate_pct < inputs.market_avg_rate_pct * 0.7 {
        reasoning.push_str(&format!(
            " WARNING: Recommended rate is below 70% of market average ({:.2}%), high redemption risk.",
            inputs.market_avg_rate_pct
        ));
    }

    AgentRecommendation {
        strategy: inputs.risk_level.to_string(),
        recommended_cr: strategy.min_cr,
        recommended_debt: recommended_debt_wei.to_string(),
        recommended_interest_rate: rate_wei.to_string(),
        estimated_apy: format!("{:.1}", net_apy),
        liquidation_price: format!("{:.4}", liquidation_price),
        reasoning,
    }
}

/// 18-decimal wei to whole units, with f64 precision. Fine for the
/// presentational figures this module produces; never used for on-chain
/// amounts.
fn wei_to_unit(wei: U256) -> f64 {
    wei.to_string().parse::<f64>().unwrap_or(0.0) / 1e18
}

fn unit_to_wei(unit: f64) -> U256 {
    if unit <= 0.0 {
        return U256::ZERO;
    }
    U256::from((unit * 1e18).floor() as u128)
}
