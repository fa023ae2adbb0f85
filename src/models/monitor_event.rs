use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::agent::UnsignedTx;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HealthLevel {
    Ok,
    Warning,
    Danger,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RedemptionRisk {
    Low,
    Medium,
    High,
}

/// One observation of a monitored trove, produced by the position monitor and
/// fanned out to SSE subscribers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitorEvent {
    pub timestamp: DateTime<Utc>,
    pub address: String,
    pub agent_id: String,
    pub level: HealthLevel,
    pub cr: String,
    pub branch: u8,
    pub collateral_symbol: String,
    pub trove_id: u64,
    pub details: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    /// Ready-to-sign transaction for the dispatched action, so a stream
    /// consumer can act on it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unsigned_tx: Option<UnsignedTx>,
    pub redemption_risk: RedemptionRisk,
}
