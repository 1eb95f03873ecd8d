//! Exact integer conversions between wei and stable units.

use crate::types::FeedPrice;
use alloy::primitives::{U256, utils::format_ether};

/// Converts `fee_wei` into USD cents at `price`, rounding half up.
///
/// `cents = fee_wei * price * 10^expo * 100 / 10^18`
pub fn stable_cents(fee_wei: U256, price: FeedPrice) -> U256 {
    let mantissa = U256::from(price.price.max(0).unsigned_abs());
    let scale = pow10(price.expo.unsigned_abs());

    let (mut numerator, mut denominator) =
        (fee_wei.saturating_mul(mantissa).saturating_mul(U256::from(100)), pow10(18));
    if price.expo >= 0 {
        numerator = numerator.saturating_mul(scale);
    } else {
        denominator = denominator.saturating_mul(scale);
    }

    (numerator.saturating_add(denominator / U256::from(2))) / denominator
}

/// Formats wei as a native-unit decimal without trailing zeros, e.g. `0.00006`.
pub fn format_native(wei: U256) -> String {
    let formatted = format_ether(wei);
    match formatted.split_once('.') {
        Some((units, decimals)) => {
            let decimals = decimals.trim_end_matches('0');
            if decimals.is_empty() { units.to_string() } else { format!("{units}.{decimals}") }
        }
        None => formatted,
    }
}

/// Formats micro-units as a stable unit decimal with six places, e.g. `0.220000`.
pub fn format_micro_units(micro: U256) -> String {
    let (whole, rest) = micro.div_rem(U256::from(1_000_000));
    format!("{whole}.{:06}", rest.to::<u64>())
}

fn pow10(exp: u32) -> U256 {
    U256::from(10).saturating_pow(U256::from(exp))
}
