use super::{PriceFeed, metrics::OracleMetrics};
use crate::types::{FeedPrice, PriceSource};
use std::sync::Arc;
use tracing::{debug, warn};

/// Looks up the native asset price, falling back to a fixed price when the feed is unavailable.
///
/// A lookup never fails. Every fallback is logged, counted and reported as
/// [`PriceSource::Fallback`].
#[derive(Debug, Clone)]
pub struct PriceOracle {
    /// The live feed.
    feed: Arc<dyn PriceFeed>,
    /// Price used when the feed fails.
    fallback: FeedPrice,
    /// Metrics shared between clones.
    metrics: Arc<OracleMetrics>,
}

impl PriceOracle {
    /// Return a new [`PriceOracle`].
    pub fn new(feed: Arc<dyn PriceFeed>, fallback: FeedPrice) -> Self {
        Self { feed, fallback, metrics: Arc::new(OracleMetrics::default()) }
    }

    /// Returns the current native asset price and where it came from.
    pub async fn native_price(&self) -> (FeedPrice, PriceSource) {
        let (price, source) = match self.feed.fetch().await {
            Ok(price) if price.is_valid() => {
                self.metrics.fetched.increment(1);
                debug!(price = price.price, expo = price.expo, "Fetched native price.");
                (price, PriceSource::Oracle)
            }
            Ok(price) => {
                self.metrics.fallback_used.increment(1);
                warn!(
                    price = price.price,
                    expo = price.expo,
                    fallback_usd = self.fallback.usd(),
                    "Price feed returned an unusable price, using fallback price."
                );
                (self.fallback, PriceSource::Fallback)
            }
            Err(err) => {
                self.metrics.fallback_used.increment(1);
                warn!(
                    %err,
                    fallback_usd = self.fallback.usd(),
                    "Price feed unavailable, using fallback price."
                );
                (self.fallback, PriceSource::Fallback)
            }
        };

        self.metrics.rate.set(price.usd());
        (price, source)
    }
}
