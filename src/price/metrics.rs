//! Price metrics

use metrics::{Counter, Gauge};
use metrics_derive::Metrics;

/// Metrics for a [`PriceOracle`](crate::price::PriceOracle).
#[derive(Metrics)]
#[metrics(scope = "oracle")]
pub(crate) struct OracleMetrics {
    /// Last USD price used for a quote.
    pub(crate) rate: Gauge,
    /// Number of lookups answered by the feed.
    pub(crate) fetched: Counter,
    /// Number of lookups that fell back to the fixed price.
    pub(crate) fallback_used: Counter,
}
