use super::{format_native, stable_cents};
use crate::{
    constants::MICRO_UNITS_PER_CENT,
    price::PriceOracle,
    types::{FeeQuote, FeedPrice, PriceSource},
};
use alloy::primitives::U256;
use tracing::debug;

/// Prices gas in native and stable units.
#[derive(Debug, Clone)]
pub struct FeeEstimator {
    oracle: PriceOracle,
    gas_price: u128,
    gas_limit: u64,
}

impl FeeEstimator {
    /// Creates an estimator quoting `gas_price * gas_limit` by default.
    pub const fn new(oracle: PriceOracle, gas_price: u128, gas_limit: u64) -> Self {
        Self { oracle, gas_price, gas_limit }
    }

    /// Quotes the configured gas price and gas limit.
    pub async fn quote(&self) -> FeeQuote {
        self.estimate(self.gas_price, self.gas_limit).await
    }

    /// Quotes `gas_price * gas_limit` at the current native price.
    ///
    /// Never fails: an unavailable price feed yields a fallback-priced quote.
    pub async fn estimate(&self, gas_price: u128, gas_limit: u64) -> FeeQuote {
        let (price, source) = self.oracle.native_price().await;
        let quote = Self::quote_at(gas_price, gas_limit, price, source);

        debug!(
            fee_wei = %quote.fee_wei,
            fee_native = %quote.fee_native,
            fee_usd = %quote.fee_stable_units,
            ?source,
            "Estimated fee."
        );

        quote
    }

    /// Computes a quote at a known price.
    pub fn quote_at(
        gas_price: u128,
        gas_limit: u64,
        native_price: FeedPrice,
        price_source: PriceSource,
    ) -> FeeQuote {
        let fee_wei = U256::from(gas_price) * U256::from(gas_limit);
        let cents = stable_cents(fee_wei, native_price);
        let (whole, rest) = cents.div_rem(U256::from(100));

        FeeQuote {
            gas_price,
            gas_limit,
            fee_wei,
            fee_native: format_native(fee_wei),
            fee_stable_units: format!("{whole}.{:02}", rest.to::<u64>()),
            fee_micro_units: cents.saturating_mul(U256::from(MICRO_UNITS_PER_CENT)),
            native_price,
            price_source,
        }
    }
}
