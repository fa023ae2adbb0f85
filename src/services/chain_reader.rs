//! Read-only view of deployed protocol state: per-branch market statistics
//! and a user's troves.

use std::str::FromStr;

use alloy::{
    providers::{ProviderBuilder, RootProvider},
    sol,
    transports::http::{Client, Http},
};
use alloy_primitives::{Address, U256};
use async_trait::async_trait;

use crate::config::DeployedAddresses;
use crate::error::AppError;
use crate::models::{Branch, MarketData, TrovePosition};

sol! {
    #[allow(missing_docs)]
    #[sol(rpc)]
    interface ITroveManager {
        function getTroveEntireColl(uint256 troveId) external view returns (uint256);
        function getTroveEntireDebt(uint256 troveId) external view returns (uint256);
        function getTroveAnnualInterestRate(uint256 troveId) external view returns (uint256);
    }

    #[allow(missing_docs)]
    #[sol(rpc)]
    interface ITroveNFT {
        function balanceOf(address owner) external view returns (uint256);
        function tokenOfOwnerByIndex(address owner, uint256 index) external view returns (uint256);
    }

    #[allow(missing_docs)]
    #[sol(rpc)]
    interface IPriceFeed {
        function lastGoodPrice() external view returns (uint256);
    }

    #[allow(missing_docs)]
    #[sol(rpc)]
    interface IActivePool {
        function getCollBalance() external view returns (uint256);
        function getBoldDebt() external view returns (uint256);
        function aggWeightedDebtSum() external view returns (uint256);
        function aggRecordedDebt() external view returns (uint256);
    }

    #[allow(missing_docs)]
    #[sol(rpc)]
    interface IStabilityPool {
        function getTotalBoldDeposits() external view returns (uint256);
    }
}

/// Seam for market/position reads. The RPC implementation talks to the chain;
/// tests substitute fixtures.
#[async_trait]
pub trait ChainReader: Send + Sync {
    async fn get_markets(&self) -> Result<Vec<MarketData>, AppError>;
    async fn get_user_positions(&self, address: &str) -> Result<Vec<TrovePosition>, AppError>;
}

pub struct RpcChainReader {
    provider: RootProvider<Http<Client>>,
    addresses: DeployedAddresses,
}

impl RpcChainReader {
    pub fn new(rpc_url: &str, addresses: DeployedAddresses) -> Result<Self, AppError> {
        let url = rpc_url
            .parse()
            .map_err(|e| AppError::Internal(format!("invalid RPC URL: {e}")))?;
        let provider = ProviderBuilder::new().on_http(url);
        Ok(Self { provider, addresses })
    }

    fn parse_address(raw: &str, what: &str) -> Result<Address, AppError> {
        Address::from_str(raw)
            .map_err(|e| AppError::Internal(format!("invalid {what} address {raw}: {e}")))
    }

    async fn read_branch_market(&self, branch: Branch) -> Result<MarketData, AppError> {
        let book = self.addresses.branch(branch);

        let price_feed =
            IPriceFeed::new(Self::parse_address(&book.price_feed, "priceFeed")?, &self.provider);
        let active_pool =
            IActivePool::new(Self::parse_address(&book.active_pool, "activePool")?, &self.provider);
        let stability_pool = IStabilityPool::new(
            Self::parse_address(&book.stability_pool, "stabilityPool")?,
            &self.provider,
        );

        let price = price_feed
            .lastGoodPrice()
            .call()
            .await
            .map_err(|e| chain_err("lastGoodPrice", e))?
            ._0;
        let total_coll = active_pool
            .getCollBalance()
            .call()
            .await
            .map_err(|e| chain_err("getCollBalance", e))?
            ._0;
        let total_debt = active_pool
            .getBoldDebt()
            .call()
            .await
            .map_err(|e| chain_err("getBoldDebt", e))?
            ._0;
        let weighted_debt = active_pool
            .aggWeightedDebtSum()
            .call()
            .await
            .map_err(|e| chain_err("aggWeightedDebtSum", e))?
            ._0;
        let recorded_debt = active_pool
            .aggRecordedDebt()
            .call()
            .await
            .map_err(|e| chain_err("aggRecordedDebt", e))?
            ._0;
        let sp_deposits = stability_pool
            .getTotalBoldDeposits()
            .call()
            .await
            .map_err(|e| chain_err("getTotalBoldDeposits", e))?
            ._0;

        // Debt-weighted average annual rate; both aggregates are 1e18-scaled
        // so the quotient is a 1e18 rate fraction.
        let avg_rate_pct = if recorded_debt.is_zero() {
            0.0
        } else {
            u256_to_f64(weighted_debt / recorded_debt) / 1e16
        };

        let price_usd = u256_to_f64(price) / 1e18;
        let coll_units = u256_to_f64(total_coll) / 1e18;
        let debt_units = u256_to_f64(total_debt) / 1e18;
        let coll_value_usd = coll_units * price_usd;

        let current_cr_pct = if debt_units > 0.0 {
            coll_value_usd / debt_units * 100.0
        } else {
            0.0
        };
        let ltv_pct = if current_cr_pct > 0.0 {
            10_000.0 / current_cr_pct
        } else {
            0.0
        };
        let sp_deposit_units = u256_to_f64(sp_deposits) / 1e18;
        // Interest paid by borrowers accrues to SP depositors.
        let sp_apy_pct = if sp_deposit_units > 0.0 {
            avg_rate_pct * ltv_pct / 100.0
        } else {
            0.0
        };

        Ok(MarketData {
            branch: branch.index(),
            collateral_symbol: branch.symbol().to_string(),
            collateral_address: book.coll_token.clone(),
            total_collateral: total_coll.to_string(),
            total_collateral_usd: format!("{:.2}", coll_value_usd),
            current_cr: format!("{:.2}", current_cr_pct),
            mcr: format!("{:.2}", branch.mcr_pct()),
            ccr: format!("{:.2}", branch.ccr_pct()),
            ltv: format!("{:.2}", ltv_pct),
            total_borrow: total_debt.to_string(),
            avg_interest_rate: format!("{:.2}", avg_rate_pct),
            sp_deposits: sp_deposits.to_string(),
            sp_apy: format!("{:.2}", sp_apy_pct),
        })
    }

    async fn read_branch_positions(
        &self,
        branch: Branch,
        owner: Address,
    ) -> Result<Vec<TrovePosition>, AppError> {
        let book = self.addresses.branch(branch);

        let trove_nft =
            ITroveNFT::new(Self::parse_address(&book.trove_nft, "troveNFT")?, &self.provider);
        let trove_manager = ITroveManager::new(
            Self::parse_address(&book.trove_manager, "troveManager")?,
            &self.provider,
        );
        let price_feed =
            IPriceFeed::new(Self::parse_address(&book.price_feed, "priceFeed")?, &self.provider);

        let count = trove_nft
            .balanceOf(owner)
            .call()
            .await
            .map_err(|e| chain_err("balanceOf", e))?
            ._0;
        if count.is_zero() {
            return Ok(Vec::new());
        }

        let price_usd = u256_to_f64(
            price_feed
                .lastGoodPrice()
                .call()
                .await
                .map_err(|e| chain_err("lastGoodPrice", e))?
                ._0,
        ) / 1e18;

        let count: u64 = count.try_into().unwrap_or(0);
        let mut positions = Vec::with_capacity(count as usize);
        for index in 0..count {
            let trove_id = trove_nft
                .tokenOfOwnerByIndex(owner, U256::from(index))
                .call()
                .await
                .map_err(|e| chain_err("tokenOfOwnerByIndex", e))?
                ._0;

            let coll = trove_manager
                .getTroveEntireColl(trove_id)
                .call()
                .await
                .map_err(|e| chain_err("getTroveEntireColl", e))?
                ._0;
            let debt = trove_manager
                .getTroveEntireDebt(trove_id)
                .call()
                .await
                .map_err(|e| chain_err("getTroveEntireDebt", e))?
                ._0;
            let rate = trove_manager
                .getTroveAnnualInterestRate(trove_id)
                .call()
                .await
                .map_err(|e| chain_err("getTroveAnnualInterestRate", e))?
                ._0;

            let coll_units = u256_to_f64(coll) / 1e18;
            let debt_units = u256_to_f64(debt) / 1e18;
            let cr_pct = if debt_units > 0.0 {
                coll_units * price_usd / debt_units * 100.0
            } else {
                0.0
            };

            positions.push(TrovePosition {
                trove_id: trove_id.try_into().unwrap_or(u64::MAX),
                branch: branch.index(),
                collateral_symbol: branch.symbol().to_string(),
                collateral_wei: coll,
                debt_wei: debt,
                cr_pct,
                interest_rate_pct: u256_to_f64(rate) / 1e16,
            });
        }

        Ok(positions)
    }
}

#[async_trait]
impl ChainReader for RpcChainReader {
    async fn get_markets(&self) -> Result<Vec<MarketData>, AppError> {
        let mut markets = Vec::with_capacity(2);
        for branch in [Branch::WCtc, Branch::LstCtc] {
            markets.push(self.read_branch_market(branch).await?);
        }
        Ok(markets)
    }

    async fn get_user_positions(&self, address: &str) -> Result<Vec<TrovePosition>, AppError> {
        let owner = Address::from_str(address)
            .map_err(|_| AppError::Validation(format!("invalid address: {address}")))?;

        let mut positions = Vec::new();
        for branch in [Branch::WCtc, Branch::LstCtc] {
            positions.extend(self.read_branch_positions(branch, owner).await?);
        }
        Ok(positions)
    }
}

fn chain_err(call: &str, err: alloy::contract::Error) -> AppError {
    tracing::error!(call, error = %err, "contract read failed");
    AppError::Upstream(format!("chain read {call} failed: {err}"))
}

fn u256_to_f64(value: U256) -> f64 {
    value.to_string().parse().unwrap_or(f64::MAX)
}
