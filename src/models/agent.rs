use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Risk appetite selected by the user. Drives the strategy table in
/// `risk::strategy`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Conservative,
    Moderate,
    Aggressive,
}

impl FromStr for RiskLevel {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "conservative" => Ok(RiskLevel::Conservative),
            "moderate" => Ok(RiskLevel::Moderate),
            "aggressive" => Ok(RiskLevel::Aggressive),
            other => Err(AppError::Validation(format!(
                "Unknown riskLevel: {other}"
            ))),
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RiskLevel::Conservative => "conservative",
            RiskLevel::Moderate => "moderate",
            RiskLevel::Aggressive => "aggressive",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendRequest {
    pub user_address: Option<String>,
    pub collateral_type: Option<String>,
    pub amount: Option<String>,
    pub risk_level: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentRecommendation {
    pub strategy: String,
    #[serde(rename = "recommendedCR")]
    pub recommended_cr: u32,
    pub recommended_debt: String,
    pub recommended_interest_rate: String,
    #[serde(rename = "estimatedAPY")]
    pub estimated_apy: String,
    pub liquidation_price: String,
    pub reasoning: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteRequest {
    pub user_address: Option<String>,
    pub action: Option<String>,
    #[serde(default)]
    pub params: ExecuteParams,
}

/// Per-action parameters for the execute endpoint. Everything optional at the
/// wire; per-action validation happens in the handler.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteParams {
    pub branch: Option<i64>,
    pub collateral_amount: Option<String>,
    pub debt_amount: Option<String>,
    pub interest_rate: Option<String>,
    pub trove_id: Option<serde_json::Value>,
    pub coll_change: Option<String>,
    pub is_coll_increase: Option<bool>,
    pub debt_change: Option<String>,
    pub is_debt_increase: Option<bool>,
    pub max_upfront_fee: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdjustRateRequest {
    pub user_address: Option<String>,
    #[serde(default)]
    pub params: AdjustRateParams,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdjustRateParams {
    pub branch: Option<i64>,
    pub trove_id: Option<serde_json::Value>,
    pub new_interest_rate: Option<String>,
    pub max_upfront_fee: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentSettingsRequest {
    pub user_address: Option<String>,
    pub agent_address: Option<String>,
    pub strategy: Option<String>,
    #[serde(rename = "minCR")]
    pub min_cr: Option<u32>,
    pub auto_rebalance: Option<bool>,
    pub auto_rate_adjust: Option<bool>,
    pub branch: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutomationRequest {
    pub user_address: Option<String>,
    pub strategy: Option<String>,
    #[serde(rename = "minCR")]
    pub min_cr: Option<u32>,
    pub auto_rebalance: Option<bool>,
    pub auto_rate_adjust: Option<bool>,
}

/// Transaction payload prepared for a client wallet to sign and broadcast.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnsignedTx {
    pub to: String,
    pub data: String,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_limit: Option<String>,
    pub chain_id: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteResponse {
    pub tx_hash: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trove_id: Option<String>,
    pub status: String,
    pub unsigned_tx: UnsignedTx,
}

impl ExecuteResponse {
    /// Placeholder hash used while the transaction is still unsigned.
    pub fn pending(trove_id: Option<String>, unsigned_tx: UnsignedTx) -> Self {
        Self {
            tx_hash: format!("0x{}", "0".repeat(64)),
            trove_id,
            status: "pending".to_string(),
            unsigned_tx,
        }
    }
}
