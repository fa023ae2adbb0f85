pub mod agent;
pub mod market;
pub mod monitor_event;

pub use agent::{
    AdjustRateParams, AdjustRateRequest, AgentRecommendation, AgentSettingsRequest,
    AutomationRequest, ExecuteParams, ExecuteRequest, ExecuteResponse, RecommendRequest,
    RiskLevel, UnsignedTx,
};
pub use market::{Branch, MarketData, TrovePosition};
pub use monitor_event::{HealthLevel, MonitorEvent, RedemptionRisk};
