//! In-memory agent registry keyed by lowercase user address. Stands in for
//! persistent storage until a database lands.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;

use crate::models::RiskLevel;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentRecord {
    pub user_address: String,
    pub strategy: RiskLevel,
    #[serde(rename = "minCR")]
    pub min_cr: u32,
    pub auto_rebalance: bool,
    pub auto_rate_adjust: bool,
    pub agent_id: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Default)]
pub struct AgentRegistry {
    agents: RwLock<HashMap<String, AgentRecord>>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace the agent for an address. Returns the stored record.
    pub async fn register(
        &self,
        user_address: &str,
        strategy: RiskLevel,
        min_cr: u32,
        auto_rebalance: bool,
        auto_rate_adjust: bool,
    ) -> AgentRecord {
        let key = user_address.to_lowercase();
        let record = AgentRecord {
            user_address: key.clone(),
            strategy,
            min_cr,
            auto_rebalance,
            auto_rate_adjust,
            agent_id: format!("agent-{}", Utc::now().timestamp_millis()),
            active: true,
            created_at: Utc::now(),
        };
        self.agents.write().await.insert(key, record.clone());
        tracing::info!(
            address = %record.user_address,
            agent_id = %record.agent_id,
            strategy = %record.strategy,
            "agent registered"
        );
        record
    }

    pub async fn get(&self, user_address: &str) -> Option<AgentRecord> {
        self.agents
            .read()
            .await
            .get(&user_address.to_lowercase())
            .cloned()
    }

    /// Marks the agent inactive without removing its history. Returns false if
    /// no agent exists for the address.
    pub async fn deactivate(&self, user_address: &str) -> bool {
        let mut agents = self.agents.write().await;
        match agents.get_mut(&user_address.to_lowercase()) {
            Some(record) => {
                record.active = false;
                tracing::info!(address = %record.user_address, "agent deactivated");
                true
            }
            None => false,
        }
    }

    /// Snapshot of every active agent, for the monitor's poll loop.
    pub async fn snapshot(&self) -> Vec<AgentRecord> {
        self.agents
            .read()
            .await
            .values()
            .filter(|r| r.active)
            .cloned()
            .collect()
    }
}
