//! Sponsor constants.

use alloy::primitives::{Address, address};
use std::time::Duration;

/// Default gas price used to quote a sponsored call, in wei.
pub const DEFAULT_GAS_PRICE: u128 = 20_000_000;

/// Default gas limit used to quote a sponsored call.
pub const DEFAULT_GAS_LIMIT: u64 = 3_000_000;

/// Gas limit of the EIP-7702 delegation transaction.
pub const DELEGATION_GAS_LIMIT: u64 = 300_000;

/// Gas limit of the sponsor's `execute` transaction.
pub const EXECUTE_GAS_LIMIT: u64 = 1_000_000;

/// How long to wait for a submitted transaction to be included.
pub const INCLUSION_TIMEOUT: Duration = Duration::from_secs(120);

/// Timeout of a single price feed request.
pub const PRICE_FEED_TIMEOUT: Duration = Duration::from_secs(5);

/// The public Pyth Hermes endpoint.
pub const PYTH_HERMES_URL: &str = "https://hermes.pyth.network";

/// Pyth ETH/USD price feed id.
pub const PYTH_ETH_USD_FEED_ID: &str =
    "0xff61491a931112ddf1bd8147cd1b641375f79f5825126d665480874634fd0ace";

/// Mantissa of the fallback ETH/USD price, used when the feed is unavailable.
pub const FALLBACK_PRICE: i64 = 360_000_000_000;

/// Exponent of the fallback ETH/USD price.
pub const FALLBACK_EXPO: i32 = -8;

/// The shared delegation contract accounts delegate to.
pub const DELEGATION_CONTRACT: Address = address!("A2889d18e386a35Ae708972533B475a7B47Ae8cc");

/// The gas ledger storage contract.
pub const GAS_LEDGER_CONTRACT: Address = address!("d41923bF117045b50e4589799F14Cb67A06090E1");

/// Micro-units per stable unit cent.
pub const MICRO_UNITS_PER_CENT: u64 = 10_000;
