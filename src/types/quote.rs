//! Fee quote types.

use alloy::primitives::U256;
use serde::{Deserialize, Serialize};

/// A spot price as published by the price feed: `price * 10^expo` USD per native unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedPrice {
    /// Integer mantissa.
    pub price: i64,
    /// Signed decimal exponent.
    pub expo: i32,
}

impl FeedPrice {
    /// Largest exponent magnitude a price may carry.
    ///
    /// Keeps `10^|expo|` and the fee conversion exact in 256 bits.
    pub const MAX_EXPO: i32 = 18;

    /// Creates a new [`FeedPrice`].
    pub const fn new(price: i64, expo: i32) -> Self {
        Self { price, expo }
    }

    /// Whether the price can be used to quote fees: a positive mantissa and
    /// `|expo| <= MAX_EXPO`.
    pub const fn is_valid(&self) -> bool {
        self.price > 0 && self.expo >= -Self::MAX_EXPO && self.expo <= Self::MAX_EXPO
    }

    /// USD per native unit, for display and logging only.
    pub fn usd(&self) -> f64 {
        let scale = 10f64.powi(self.expo.saturating_abs());
        if self.expo < 0 { self.price as f64 / scale } else { self.price as f64 * scale }
    }
}

/// Where the price used for a quote came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PriceSource {
    /// Fetched from the price feed.
    Oracle,
    /// The feed was unavailable and the configured fallback price was used.
    Fallback,
}

/// Estimated cost of executing a sponsored call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeQuote {
    /// Gas price in wei.
    pub gas_price: u128,
    /// Gas limit.
    pub gas_limit: u64,
    /// `gas_price * gas_limit`.
    pub fee_wei: U256,
    /// Fee in native units as a decimal string, e.g. `0.00006`.
    pub fee_native: String,
    /// Fee in USD rounded to cents, e.g. `0.22`.
    pub fee_stable_units: String,
    /// Amount debited from the ledger, in micro-USD.
    pub fee_micro_units: U256,
    /// The price the quote was computed with.
    pub native_price: FeedPrice,
    /// Where `native_price` came from.
    pub price_source: PriceSource,
}

impl FeeQuote {
    /// Whether the quote was priced with the fallback price.
    pub const fn is_fallback_priced(&self) -> bool {
        matches!(self.price_source, PriceSource::Fallback)
    }
}
