//! Sponsor configuration.
use crate::{
    constants::{
        DEFAULT_GAS_LIMIT, DEFAULT_GAS_PRICE, DELEGATION_CONTRACT, DELEGATION_GAS_LIMIT,
        EXECUTE_GAS_LIMIT, FALLBACK_EXPO, FALLBACK_PRICE, GAS_LEDGER_CONTRACT, INCLUSION_TIMEOUT,
        PRICE_FEED_TIMEOUT, PYTH_ETH_USD_FEED_ID, PYTH_HERMES_URL,
    },
    price::PriceFetcher,
    types::FeedPrice,
};
use alloy::primitives::{Address, ChainId};
use eyre::WrapErr;
use serde::{Deserialize, Serialize};
use std::{path::Path, time::Duration};
use url::Url;

/// Sponsor configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SponsorConfig {
    /// Chain configuration.
    #[serde(default)]
    pub chain: ChainConfig,
    /// Contract addresses.
    #[serde(default)]
    pub contracts: ContractsConfig,
    /// Fee quote configuration.
    #[serde(default)]
    pub fees: FeeConfig,
    /// Transaction configuration.
    #[serde(default)]
    pub transactions: TransactionConfig,
    /// Price feed configuration.
    #[serde(default)]
    pub pricefeed: PriceFeedConfig,
    /// Port to serve Prometheus metrics on. Metrics are not exported if unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics_port: Option<u16>,
    /// Secrets.
    #[serde(skip_serializing, default)]
    pub secrets: SecretsConfig,
}

impl SponsorConfig {
    /// Sets the RPC endpoint.
    pub fn with_endpoint(mut self, endpoint: Url) -> Self {
        self.chain.endpoint = endpoint;
        self
    }

    /// Sets the expected chain id.
    pub fn with_chain_id(mut self, chain_id: Option<ChainId>) -> Self {
        self.chain.chain_id = chain_id.or(self.chain.chain_id);
        self
    }

    /// Sets the gas ledger contract address.
    pub fn with_ledger(mut self, ledger: Address) -> Self {
        self.contracts.ledger = ledger;
        self
    }

    /// Sets how long to wait for transactions to be included.
    pub fn with_inclusion_timeout(mut self, timeout: Duration) -> Self {
        self.transactions.inclusion_timeout = timeout;
        self
    }

    /// Sets the port to serve the metrics on.
    pub fn with_metrics_port(mut self, port: Option<u16>) -> Self {
        self.metrics_port = port.or(self.metrics_port);
        self
    }

    /// Sets the sponsor's private key.
    pub fn with_sponsor_key(mut self, key: Option<String>) -> Self {
        if let Some(key) = key {
            self.secrets.sponsor_key = key;
        }
        self
    }

    /// Sets the user's private key.
    pub fn with_user_key(mut self, key: Option<String>) -> Self {
        if let Some(key) = key {
            self.secrets.user_key = key;
        }
        self
    }

    /// Load from a YAML file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> eyre::Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)
            .wrap_err_with(|| format!("failed to read config file: {}", path.display()))?;
        let config = serde_yaml::from_reader(&file)
            .wrap_err_with(|| format!("failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Save to a YAML file. Secrets are not written.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> eyre::Result<()> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

/// Chain configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainConfig {
    /// JSON-RPC endpoint.
    pub endpoint: Url,
    /// Expected chain id. The endpoint is rejected if it serves another chain.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<ChainId>,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self { endpoint: Url::parse("http://localhost:8545").expect("valid url"), chain_id: None }
    }
}

/// Contract addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractsConfig {
    /// The shared delegation contract accounts delegate to.
    pub delegation: Address,
    /// The gas ledger contract.
    pub ledger: Address,
}

impl Default for ContractsConfig {
    fn default() -> Self {
        Self { delegation: DELEGATION_CONTRACT, ledger: GAS_LEDGER_CONTRACT }
    }
}

/// Fee quote configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeConfig {
    /// Gas price in wei.
    pub gas_price: u128,
    /// Gas limit.
    pub gas_limit: u64,
}

impl Default for FeeConfig {
    fn default() -> Self {
        Self { gas_price: DEFAULT_GAS_PRICE, gas_limit: DEFAULT_GAS_LIMIT }
    }
}

/// Transaction configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionConfig {
    /// Gas limit of the delegation transaction.
    pub delegation_gas_limit: u64,
    /// Gas limit of the sponsor's `execute` transaction.
    pub execute_gas_limit: u64,
    /// How long to wait for a transaction to be included, in seconds.
    #[serde(with = "crate::serde::duration")]
    pub inclusion_timeout: Duration,
}

impl Default for TransactionConfig {
    fn default() -> Self {
        Self {
            delegation_gas_limit: DELEGATION_GAS_LIMIT,
            execute_gas_limit: EXECUTE_GAS_LIMIT,
            inclusion_timeout: INCLUSION_TIMEOUT,
        }
    }
}

/// Price feed configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceFeedConfig {
    /// The price fetcher.
    #[serde(default)]
    pub fetcher: PriceFetcher,
    /// Feed endpoint.
    pub endpoint: Url,
    /// Native asset USD feed id.
    pub feed_id: String,
    /// Request timeout, in seconds.
    #[serde(with = "crate::serde::duration")]
    pub timeout: Duration,
    /// Mantissa of the price used when the feed is unavailable.
    pub fallback_price: i64,
    /// Exponent of the price used when the feed is unavailable.
    pub fallback_expo: i32,
}

impl PriceFeedConfig {
    /// The price used when the feed is unavailable.
    pub const fn fallback(&self) -> FeedPrice {
        FeedPrice::new(self.fallback_price, self.fallback_expo)
    }
}

impl Default for PriceFeedConfig {
    fn default() -> Self {
        Self {
            fetcher: PriceFetcher::default(),
            endpoint: Url::parse(PYTH_HERMES_URL).expect("valid url"),
            feed_id: PYTH_ETH_USD_FEED_ID.to_string(),
            timeout: PRICE_FEED_TIMEOUT,
            fallback_price: FALLBACK_PRICE,
            fallback_expo: FALLBACK_EXPO,
        }
    }
}

/// Secrets. Never serialized.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SecretsConfig {
    /// Private key of the sponsor account.
    #[serde(default)]
    pub sponsor_key: String,
    /// Private key of the user account.
    #[serde(default)]
    pub user_key: String,
}
