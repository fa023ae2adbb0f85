//! Background position monitor. Polls troves for every active agent,
//! classifies their health, emits events, and dispatches automated
//! rebalance / rate-adjust transactions when the agent opted in.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio::task::JoinHandle;

use crate::config::settings::MonitorSettings;
use crate::models::{Branch, HealthLevel, MonitorEvent, RedemptionRisk, TrovePosition, UnsignedTx};
use crate::risk::strategy::pct_to_rate_wei;
use crate::services::{AgentRecord, AgentRegistry, CdpProvider, ChainReader, EventHub};

// Health bands relative to the branch minimum collateral ratio.
const DANGER_FACTOR: f64 = 1.1;
const WARNING_FACTOR: f64 = 1.2;
// Rebalancing aims above the agent's floor so one dip does not retrigger.
const REBALANCE_TARGET_FACTOR: f64 = 1.3;
// A rate well under the market average puts the trove first in the
// redemption queue.
const REDEMPTION_HIGH_FACTOR: f64 = 0.7;
const REDEMPTION_MEDIUM_FACTOR: f64 = 0.9;

pub fn classify_cr(cr_pct: f64, min_cr_pct: f64) -> HealthLevel {
    if cr_pct < min_cr_pct * DANGER_FACTOR {
        HealthLevel::Danger
    } else if cr_pct < min_cr_pct * WARNING_FACTOR {
        HealthLevel::Warning
    } else {
        HealthLevel::Ok
    }
}

pub fn redemption_risk(rate_pct: f64, market_avg_pct: f64) -> RedemptionRisk {
    if market_avg_pct <= 0.0 {
        return RedemptionRisk::Low;
    }
    if rate_pct < market_avg_pct * REDEMPTION_HIGH_FACTOR {
        RedemptionRisk::High
    } else if rate_pct < market_avg_pct * REDEMPTION_MEDIUM_FACTOR {
        RedemptionRisk::Medium
    } else {
        RedemptionRisk::Low
    }
}

pub struct PositionMonitor {
    chain: Arc<dyn ChainReader>,
    provider: Arc<dyn CdpProvider>,
    registry: Arc<AgentRegistry>,
    events: Arc<EventHub>,
    settings: MonitorSettings,
}

impl PositionMonitor {
    pub fn new(
        chain: Arc<dyn ChainReader>,
        provider: Arc<dyn CdpProvider>,
        registry: Arc<AgentRegistry>,
        events: Arc<EventHub>,
        settings: MonitorSettings,
    ) -> Self {
        Self {
            chain,
            provider,
            registry,
            events,
            settings,
        }
    }

    pub fn spawn(self: Arc<Self>) -> JoinHandle<()> {
        let interval = Duration::from_secs(self.settings.poll_interval_seconds.max(1));
        tokio::spawn(async move {
            tracing::info!(interval_seconds = interval.as_secs(), "position monitor started");
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                if let Err(e) = self.poll_once().await {
                    tracing::warn!(error = %e, "monitor poll failed");
                }
            }
        })
    }

    async fn poll_once(&self) -> Result<(), crate::error::AppError> {
        let agents = self.registry.snapshot().await;
        if agents.is_empty() {
            return Ok(());
        }

        // One market read covers every agent in this sweep.
        let markets = self.chain.get_markets().await?;
        let avg_rate_for = |branch: u8| -> f64 {
            markets
                .iter()
                .find(|m| m.branch == branch)
                .and_then(|m| m.avg_interest_rate_pct())
                .unwrap_or(0.0)
        };

        for agent in agents {
            let positions = match self.chain.get_user_positions(&agent.user_address).await {
                Ok(positions) => positions,
                Err(e) => {
                    tracing::warn!(address = %agent.user_address, error = %e, "position read failed");
                    continue;
                }
            };

            for position in positions {
                let avg_rate = avg_rate_for(position.branch);
                self.check_position(&agent, &position, avg_rate).await;
            }
        }
        Ok(())
    }

    async fn check_position(&self, agent: &AgentRecord, position: &TrovePosition, avg_rate: f64) {
        let min_cr = match Branch::from_index(i64::from(position.branch)) {
            Ok(branch) => branch.mcr_pct(),
            Err(_) => return,
        };
        let level = classify_cr(position.cr_pct, min_cr);
        let risk = redemption_risk(position.interest_rate_pct, avg_rate);

        let mut action = None;
        let mut unsigned_tx = None;
        if level == HealthLevel::Danger && self.settings.auto_rebalance && agent.auto_rebalance {
            if let Some((name, tx)) = self.dispatch_rebalance(agent, position).await {
                action = Some(name);
                unsigned_tx = Some(tx);
            }
        } else if risk == RedemptionRisk::High && agent.auto_rate_adjust {
            if let Some((name, tx)) = self.dispatch_rate_adjust(agent, position, avg_rate).await {
                action = Some(name);
                unsigned_tx = Some(tx);
            }
        }

        let details = match level {
            HealthLevel::Danger => format!(
                "CR {:.2}% is below the danger threshold {:.2}%",
                position.cr_pct,
                min_cr * DANGER_FACTOR
            ),
            HealthLevel::Warning => format!(
                "CR {:.2}% is approaching the minimum {:.2}%",
                position.cr_pct, min_cr
            ),
            HealthLevel::Ok => format!("CR {:.2}% is healthy", position.cr_pct),
        };

        if level != HealthLevel::Ok {
            tracing::warn!(
                address = %agent.user_address,
                trove_id = position.trove_id,
                cr = position.cr_pct,
                ?level,
                "unhealthy position"
            );
        }

        self.events.publish(MonitorEvent {
            timestamp: chrono::Utc::now(),
            address: agent.user_address.clone(),
            agent_id: agent.agent_id.clone(),
            level,
            cr: format!("{:.2}", position.cr_pct),
            branch: position.branch,
            collateral_symbol: position.collateral_symbol.clone(),
            trove_id: position.trove_id,
            details,
            action,
            unsigned_tx,
            redemption_risk: risk,
        });
    }

    /// Top up collateral so the trove lands at the agent's rebalance target.
    /// Scaling the existing collateral by target/current avoids needing the
    /// spot price here.
    async fn dispatch_rebalance(
        &self,
        agent: &AgentRecord,
        position: &TrovePosition,
    ) -> Option<(String, UnsignedTx)> {
        if position.cr_pct <= 0.0 {
            return None;
        }
        let target_cr = f64::from(agent.min_cr) * REBALANCE_TARGET_FACTOR;
        let scale = target_cr / position.cr_pct - 1.0;
        if scale <= 0.0 {
            return None;
        }
        let coll_wei: f64 = position.collateral_wei.to_string().parse().unwrap_or(0.0);
        let coll_change_wei = alloy_primitives::U256::from((coll_wei * scale) as u128);

        let params = json!({
            "branchIndex": position.branch,
            "troveId": position.trove_id.to_string(),
            "collChange": coll_change_wei.to_string(),
            "isCollIncrease": true,
            "debtChange": "0",
            "isDebtIncrease": false,
            "maxUpfrontFee": "0",
        });
        match self.provider.call("cdp.adjustTrove", params).await {
            Ok(tx) => {
                tracing::info!(
                    address = %agent.user_address,
                    trove_id = position.trove_id,
                    target_cr,
                    "auto-rebalance dispatched"
                );
                parse_dispatched_tx(tx).map(|tx| ("rebalance".to_string(), tx))
            }
            Err(e) => {
                tracing::error!(trove_id = position.trove_id, error = %e, "auto-rebalance failed");
                None
            }
        }
    }

    async fn dispatch_rate_adjust(
        &self,
        agent: &AgentRecord,
        position: &TrovePosition,
        avg_rate: f64,
    ) -> Option<(String, UnsignedTx)> {
        let params = json!({
            "branchIndex": position.branch,
            "troveId": position.trove_id.to_string(),
            "newAnnualInterestRate": pct_to_rate_wei(avg_rate).to_string(),
            "maxUpfrontFee": "0",
        });
        match self.provider.call("cdp.adjustTroveInterestRate", params).await {
            Ok(tx) => {
                tracing::info!(
                    address = %agent.user_address,
                    trove_id = position.trove_id,
                    new_rate = avg_rate,
                    "auto rate adjust dispatched"
                );
                parse_dispatched_tx(tx).map(|tx| ("rate-adjust".to_string(), tx))
            }
            Err(e) => {
                tracing::error!(trove_id = position.trove_id, error = %e, "auto rate adjust failed");
                None
            }
        }
    }
}

fn parse_dispatched_tx(tx: serde_json::Value) -> Option<UnsignedTx> {
    match serde_json::from_value(tx) {
        Ok(tx) => Some(tx),
        Err(e) => {
            tracing::error!(error = %e, "malformed unsigned tx from provider");
            None
        }
    }
}
