use std::env;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub api: ApiSettings,
    pub chain: ChainSettings,
    pub a2a: A2aSettings,
    pub auth: AuthSettings,
    pub monitor: MonitorSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainSettings {
    pub rpc_url: String,
    pub chain_id: u64,
    pub addresses_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct A2aSettings {
    pub provider_url: String,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSettings {
    pub api_keys: Vec<String>,
    pub disabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorSettings {
    pub poll_interval_seconds: u64,
    pub auto_rebalance: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            api: ApiSettings::default(),
            chain: ChainSettings::default(),
            a2a: A2aSettings::default(),
            auth: AuthSettings::default(),
            monitor: MonitorSettings::default(),
        }
    }
}

impl Default for ApiSettings {
    fn default() -> Self {
        ApiSettings {
            host: "0.0.0.0".to_string(),
            port: 3002,
        }
    }
}

impl Default for ChainSettings {
    fn default() -> Self {
        ChainSettings {
            rpc_url: "https://rpc.cc3-testnet.creditcoin.network".to_string(),
            chain_id: crate::constants::CHAIN_ID,
            addresses_path: None,
        }
    }
}

impl Default for A2aSettings {
    fn default() -> Self {
        A2aSettings {
            provider_url: "http://localhost:3001".to_string(),
            timeout_seconds: 30,
        }
    }
}

impl Default for AuthSettings {
    fn default() -> Self {
        AuthSettings {
            api_keys: Vec::new(),
            disabled: false,
        }
    }
}

impl Default for MonitorSettings {
    fn default() -> Self {
        MonitorSettings {
            poll_interval_seconds: 30,
            auto_rebalance: false,
        }
    }
}

impl Settings {
    pub fn new() -> Self {
        Settings {
            api: ApiSettings {
                host: env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: env::var("PORT")
                    .unwrap_or_else(|_| "3002".to_string())
                    .parse()
                    .unwrap_or(3002),
            },
            chain: ChainSettings {
                rpc_url: env::var("RPC_URL")
                    .unwrap_or_else(|_| "https://rpc.cc3-testnet.creditcoin.network".to_string()),
                chain_id: env::var("CHAIN_ID")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(crate::constants::CHAIN_ID),
                addresses_path: env::var("DEPLOYED_ADDRESSES_PATH").ok(),
            },
            a2a: A2aSettings {
                provider_url: env::var("CDP_PROVIDER_URL")
                    .unwrap_or_else(|_| "http://localhost:3001".to_string()),
                timeout_seconds: env::var("CDP_PROVIDER_TIMEOUT")
                    .unwrap_or_else(|_| "30".to_string())
                    .parse()
                    .unwrap_or(30),
            },
            auth: AuthSettings {
                api_keys: env::var("API_KEYS")
                    .unwrap_or_default()
                    .split(',')
                    .map(|k| k.trim().to_string())
                    .filter(|k| !k.is_empty())
                    .collect(),
                disabled: env::var("AUTH_DISABLED")
                    .map(|v| v == "true")
                    .unwrap_or(false),
            },
            monitor: MonitorSettings {
                poll_interval_seconds: env::var("MONITOR_POLL_INTERVAL_SECONDS")
                    .unwrap_or_else(|_| "30".to_string())
                    .parse()
                    .unwrap_or(30),
                auto_rebalance: env::var("AUTO_REBALANCE")
                    .map(|v| v == "true")
                    .unwrap_or(false),
            },
        }
    }
}
