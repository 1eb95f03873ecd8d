/// Errors returned by a price feed.
///
/// These never fail a fee estimation: the oracle substitutes its fallback price.
#[derive(Debug, thiserror::Error)]
pub enum PriceFeedError {
    /// The request failed, timed out, returned a non-success status or an undecodable body.
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    /// The response did not contain the requested feed.
    #[error("feed {0} missing from response")]
    MissingFeed(String),
    /// The feed published a non-positive price.
    #[error("invalid price {0}")]
    InvalidPrice(i64),
    /// The feed published an exponent outside the supported range.
    #[error("unsupported price exponent {0}")]
    InvalidExponent(i32),
}
