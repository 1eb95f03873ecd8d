use crate::{error::PriceFeedError, price::PriceFeed, types::FeedPrice};
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use serde::Deserialize;
use serde_with::{DisplayFromStr, PickFirst, serde_as};
use std::time::Duration;
use tracing::trace;
use url::Url;

/// Pyth Hermes price fetcher.
///
/// Reads a single feed from `GET {endpoint}/api/latest_price_feeds?ids[]={feed_id}`.
#[derive(Debug, Clone)]
pub struct PythHermes {
    client: reqwest::Client,
    endpoint: Url,
    feed_id: String,
}

impl PythHermes {
    /// Creates a fetcher for `feed_id`. Requests fail after `timeout`.
    pub fn new(
        endpoint: Url,
        feed_id: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, PriceFeedError> {
        let mut headers = HeaderMap::default();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder().default_headers(headers).timeout(timeout).build()?;

        Ok(Self { client, endpoint, feed_id: feed_id.into() })
    }

    fn request_url(&self) -> String {
        format!("{}/api/latest_price_feeds", self.endpoint.as_str().trim_end_matches('/'))
    }
}

#[async_trait::async_trait]
impl PriceFeed for PythHermes {
    async fn fetch(&self) -> Result<FeedPrice, PriceFeedError> {
        let feeds: Vec<HermesPriceFeed> = self
            .client
            .get(self.request_url())
            .query(&[("ids[]", self.feed_id.as_str())])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        trace!(?feeds, "Hermes response.");

        latest_price(&self.feed_id, feeds)
    }
}

/// A price feed entry as returned by Hermes.
#[derive(Debug, Deserialize)]
struct HermesPriceFeed {
    /// Feed id, hex without prefix.
    #[allow(dead_code)]
    id: String,
    /// The latest price.
    price: HermesPrice,
}

#[serde_as]
#[derive(Debug, Deserialize)]
struct HermesPrice {
    /// Mantissa, published as a decimal string.
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    price: i64,
    /// Exponent.
    expo: i32,
}

/// Picks the first feed of the response.
fn latest_price(feed_id: &str, feeds: Vec<HermesPriceFeed>) -> Result<FeedPrice, PriceFeedError> {
    let feed =
        feeds.into_iter().next().ok_or_else(|| PriceFeedError::MissingFeed(feed_id.to_string()))?;

    let price = FeedPrice::new(feed.price.price, feed.price.expo);
    if price.price <= 0 {
        return Err(PriceFeedError::InvalidPrice(price.price));
    }
    if !price.is_valid() {
        return Err(PriceFeedError::InvalidExponent(price.expo));
    }

    Ok(price)
}
