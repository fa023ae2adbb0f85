//! Protocol constants mirrored from the deployed Snowball Liquity-v2 fork.

/// Creditcoin testnet chain id.
pub const CHAIN_ID: u64 = 102031;

/// Minimum collateral ratio per branch, in percent.
pub const WCTC_MCR_PCT: f64 = 110.0;
pub const LSTCTC_MCR_PCT: f64 = 120.0;

/// Critical collateral ratio per branch, in percent.
pub const WCTC_CCR_PCT: f64 = 150.0;
pub const LSTCTC_CCR_PCT: f64 = 160.0;

/// Annual interest rate bounds enforced by BorrowerOperations, in percent.
pub const MIN_ANNUAL_INTEREST_RATE_PCT: f64 = 0.5;
pub const MAX_ANNUAL_INTEREST_RATE_PCT: f64 = 25.0;

/// Minimum debt per trove, in sbUSD.
pub const MIN_DEBT_USD: f64 = 200.0;

/// Staking yield assumed for the liquid-staked collateral branch, in percent.
pub const LST_STAKING_YIELD_PCT: f64 = 4.0;
