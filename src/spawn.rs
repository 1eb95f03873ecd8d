//! Construction of the sponsor components from a [`SponsorConfig`].
use crate::{
    authorization::AuthorizationSigner,
    config::SponsorConfig,
    delegation::DelegationInstaller,
    ledger::OnchainLedger,
    orchestrator::Orchestrator,
    price::{PriceFeed, PriceFetcher, PriceOracle, PythHermes},
    pricing::FeeEstimator,
    signers::DynSigner,
    sponsor::SponsorExecutor,
    transactions::TransactionWatcher,
};
use alloy::{
    primitives::ChainId,
    providers::{DynProvider, Provider, ProviderBuilder},
    rpc::client::ClientBuilder,
    transports::layers::RetryBackoffLayer,
};
use eyre::WrapErr;
use std::sync::Arc;
use tracing::info;

/// [`RetryBackoffLayer`] used for the chain provider.
///
/// At most 10 retries with a backoff of 800ms.
const RETRY_LAYER: RetryBackoffLayer = RetryBackoffLayer::new(10, 800, u64::MAX);

/// Connects to the configured endpoint and checks it serves the expected chain.
pub async fn connect(config: &SponsorConfig) -> eyre::Result<(DynProvider, ChainId)> {
    let client = ClientBuilder::default().layer(RETRY_LAYER).http(config.chain.endpoint.clone());
    let provider = ProviderBuilder::new().connect_client(client).erased();

    let chain_id = provider
        .get_chain_id()
        .await
        .wrap_err_with(|| format!("failed to read chain id from {}", config.chain.endpoint))?;
    if let Some(expected) = config.chain.chain_id {
        if expected != chain_id {
            eyre::bail!("endpoint serves chain {chain_id}, expected {expected}");
        }
    }

    Ok((provider, chain_id))
}

/// Builds the price oracle of the configured feed.
pub fn price_oracle(config: &SponsorConfig) -> eyre::Result<PriceOracle> {
    let feed: Arc<dyn PriceFeed> = match config.pricefeed.fetcher {
        PriceFetcher::Pyth => Arc::new(
            PythHermes::new(
                config.pricefeed.endpoint.clone(),
                config.pricefeed.feed_id.clone(),
                config.pricefeed.timeout,
            )
            .wrap_err("failed to build price feed client")?,
        ),
    };

    let fallback = config.pricefeed.fallback();
    eyre::ensure!(
        fallback.is_valid(),
        "invalid fallback price {} with exponent {}",
        fallback.price,
        fallback.expo
    );

    Ok(PriceOracle::new(feed, fallback))
}

/// Builds the fee estimator with the configured gas price and limit.
pub fn fee_estimator(config: &SponsorConfig) -> eyre::Result<FeeEstimator> {
    Ok(FeeEstimator::new(price_oracle(config)?, config.fees.gas_price, config.fees.gas_limit))
}

/// Builds an [`Orchestrator`] for the configured user and sponsor keys.
pub fn orchestrator(
    config: &SponsorConfig,
    provider: DynProvider,
    chain_id: ChainId,
) -> eyre::Result<Orchestrator> {
    let sponsor = DynSigner::from_signing_key(&config.secrets.sponsor_key)
        .wrap_err("invalid sponsor key")?;
    let user = DynSigner::from_signing_key(&config.secrets.user_key).wrap_err("invalid user key")?;
    let timeout = config.transactions.inclusion_timeout;

    info!(sponsor = %sponsor.address(), user = %user.address(), chain_id, "Loaded signers.");

    let sponsor_watcher = TransactionWatcher::new(provider.clone(), sponsor, timeout);
    let user_watcher = TransactionWatcher::new(provider, user.clone(), timeout);

    Ok(Orchestrator::new(
        chain_id,
        Arc::new(DelegationInstaller::new(
            config.contracts.delegation,
            user.clone(),
            user_watcher,
            config.transactions.delegation_gas_limit,
        )),
        AuthorizationSigner::new(Arc::new(user)),
        fee_estimator(config)?,
        Arc::new(OnchainLedger::new(config.contracts.ledger, sponsor_watcher.clone())),
        Arc::new(SponsorExecutor::new(sponsor_watcher, config.transactions.execute_gas_limit)),
    ))
}
