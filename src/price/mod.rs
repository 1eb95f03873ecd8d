//! Native asset price oracle and fetchers.

mod fetchers;
pub use fetchers::*;

mod metrics;

mod oracle;
pub use oracle::PriceOracle;

use crate::{error::PriceFeedError, types::FeedPrice};

/// A source of the native asset's USD spot price.
#[async_trait::async_trait]
pub trait PriceFeed: std::fmt::Debug + Send + Sync {
    /// Fetches the latest price.
    async fn fetch(&self) -> Result<FeedPrice, PriceFeedError>;
}
