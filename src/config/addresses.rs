//! Deployed contract address book, loaded from the deployment artifact the
//! contract scripts write out.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::Branch;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployedAddresses {
    pub network: NetworkInfo,
    pub branches: Branches,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkInfo {
    pub chain_id: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Branches {
    #[serde(rename = "wCTC")]
    pub wctc: BranchAddresses,
    #[serde(rename = "lstCTC")]
    pub lstctc: BranchAddresses,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchAddresses {
    pub trove_manager: String,
    #[serde(rename = "troveNFT")]
    pub trove_nft: String,
    pub borrower_operations: String,
    pub active_pool: String,
    pub stability_pool: String,
    pub price_feed: String,
    pub coll_token: String,
}

impl DeployedAddresses {
    pub fn branch(&self, branch: Branch) -> &BranchAddresses {
        match branch {
            Branch::WCtc => &self.branches.wctc,
            Branch::LstCtc => &self.branches.lstctc,
        }
    }
}

/// Load the address book from the first candidate path that parses. The env
/// override comes first, then the deployment artifact locations.
pub fn load_addresses(explicit_path: Option<&str>) -> Result<DeployedAddresses, AppError> {
    let candidates: Vec<&str> = explicit_path
        .into_iter()
        .chain([
            "deployments/addresses.json",
            "../deployments/addresses.json",
        ])
        .collect();

    for candidate in &candidates {
        if !Path::new(candidate).is_file() {
            continue;
        }
        let data = fs::read_to_string(candidate)
            .map_err(|e| AppError::Internal(format!("failed to read {candidate}: {e}")))?;
        let addresses: DeployedAddresses = serde_json::from_str(&data)
            .map_err(|e| AppError::Internal(format!("malformed address file {candidate}: {e}")))?;
        tracing::info!(path = %candidate, "loaded deployed addresses");
        return Ok(addresses);
    }

    Err(AppError::Internal(
        "no deployed addresses found; deploy contracts first".to_string(),
    ))
}
