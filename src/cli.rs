//! # Gas sponsor CLI
use crate::{
    config::SponsorConfig,
    error::RunError,
    metrics,
    orchestrator::{SponsorSession, StepOutcome},
    pricing::format_micro_units,
    signers::DynSigner,
    spawn,
    types::{DelegationState, GasLedger, PendingCall},
};
use alloy::{
    primitives::{Address, Bytes, ChainId, U256},
    providers::Provider,
};
use clap::{Parser, Subcommand};
use eyre::{OptionExt, WrapErr};
use std::{
    net::{IpAddr, Ipv4Addr},
    path::PathBuf,
    time::Duration,
};
use tracing::{info, warn};
use url::Url;

/// Executes calls from EIP-7702 accounts with gas paid from a prepaid ledger balance.
#[derive(Debug, Parser)]
#[command(author, about = "Gas sponsor", long_about = None)]
pub struct Args {
    /// The configuration file.
    ///
    /// If missing, a default one will be used and stored under the given path.
    #[arg(long, value_name = "CONFIG", env = "SPONSOR_CONFIG", default_value = "sponsor.yaml")]
    pub config: PathBuf,
    /// The RPC endpoint of the chain to send transactions to.
    #[arg(long, value_name = "RPC_ENDPOINT", env = "SPONSOR_RPC_URL")]
    pub endpoint: Option<Url>,
    /// The expected chain id of the endpoint.
    #[arg(long, value_name = "CHAIN_ID")]
    pub chain_id: Option<ChainId>,
    /// The port to serve the metrics on.
    #[arg(long = "metrics-port", value_name = "PORT")]
    pub metrics_port: Option<u16>,
    /// How long to wait for a transaction to be included.
    #[arg(long, value_name = "SECONDS", value_parser = parse_duration_secs)]
    pub inclusion_timeout: Option<Duration>,
    /// The secret key of the sponsor account.
    #[arg(long, value_name = "SECRET_KEY", env = "SPONSOR_SK", hide_env_values = true)]
    pub sponsor_key: Option<String>,
    /// The secret key of the user account.
    #[arg(long, value_name = "SECRET_KEY", env = "USER_SK", hide_env_values = true)]
    pub user_key: Option<String>,
    /// The command to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Sponsor a call from the user account.
    Execute(ExecuteCommand),
    /// Show the prepaid gas balance of an account.
    Balance {
        /// The account. Defaults to the user account.
        account: Option<Address>,
    },
    /// Quote the fee of a sponsored call.
    Quote {
        /// Gas price in wei. Defaults to the configured gas price.
        #[arg(long)]
        gas_price: Option<u128>,
        /// Gas limit. Defaults to the configured gas limit.
        #[arg(long)]
        gas_limit: Option<u64>,
    },
    /// Show the delegation state of an account.
    Delegation {
        /// The account. Defaults to the user account.
        account: Option<Address>,
    },
}

/// Sponsors a single call.
#[derive(Debug, Parser)]
pub struct ExecuteCommand {
    /// The call target.
    pub to: Address,
    /// The calldata as hex.
    #[arg(default_value = "0x")]
    pub data: Bytes,
    /// Native value to forward, in wei.
    #[arg(long, default_value = "0")]
    pub value: U256,
    /// How many times to retry a failed step.
    #[arg(long, default_value_t = 0)]
    pub retries: u32,
    /// Wait for the gas balance to be topped up instead of stopping.
    #[arg(long)]
    pub wait_for_funds: bool,
    /// How often to check the gas balance while waiting for funds.
    #[arg(long, value_name = "SECONDS", value_parser = parse_duration_secs, default_value = "10")]
    pub poll_interval: Duration,
}

impl Args {
    /// Runs the command.
    pub async fn run(self) -> eyre::Result<()> {
        let config = if !self.config.exists() {
            let config = SponsorConfig::default();
            config.save_to_file(&self.config)?;
            info!(path = %self.config.display(), "Wrote default config.");
            config
        } else {
            SponsorConfig::load_from_file(&self.config)?
        };
        let config = self.merge_sponsor_config(config);

        if let Some(port) = config.metrics_port {
            metrics::setup_exporter((IpAddr::V4(Ipv4Addr::LOCALHOST), port))?;
        }

        match self.command {
            Command::Execute(command) => command.run(&config).await,
            Command::Balance { account } => balance(&config, account).await,
            Command::Quote { gas_price, gas_limit } => {
                let quote = spawn::fee_estimator(&config)?
                    .estimate(
                        gas_price.unwrap_or(config.fees.gas_price),
                        gas_limit.unwrap_or(config.fees.gas_limit),
                    )
                    .await;
                print_quote(&quote);
                Ok(())
            }
            Command::Delegation { account } => delegation(&config, account).await,
        }
    }

    /// Merges [`Args`] values into an existing [`SponsorConfig`] instance.
    pub fn merge_sponsor_config(&self, mut config: SponsorConfig) -> SponsorConfig {
        if let Some(endpoint) = &self.endpoint {
            config = config.with_endpoint(endpoint.clone());
        }
        if let Some(timeout) = self.inclusion_timeout {
            config = config.with_inclusion_timeout(timeout);
        }
        config
            .with_chain_id(self.chain_id)
            .with_metrics_port(self.metrics_port)
            .with_sponsor_key(self.sponsor_key.clone())
            .with_user_key(self.user_key.clone())
    }
}

impl ExecuteCommand {
    /// Drives a sponsorship run until the call is executed.
    async fn run(self, config: &SponsorConfig) -> eyre::Result<()> {
        let Self { to, data, value, retries, wait_for_funds, poll_interval } = self;
        let (provider, chain_id) = spawn::connect(config).await?;
        let orchestrator = spawn::orchestrator(config, provider, chain_id)?;
        let account = user_address(config)?;

        let call = PendingCall::new(to, data, value);
        let session = SponsorSession::open(orchestrator, account, call).await?;
        info!(%account, step = %session.run().step, "Starting sponsorship.");

        let mut attempts = 0;
        loop {
            match session.advance().await {
                Ok(StepOutcome::Advanced { from, to }) => {
                    attempts = 0;
                    info!(%from, %to, "Step completed.");
                }
                Ok(StepOutcome::InsufficientFunds { required, available, quote }) => {
                    warn!(
                        required = %format_micro_units(required),
                        available = %format_micro_units(available),
                        fee_usd = %quote.fee_stable_units,
                        "Insufficient gas balance, top up the ledger to continue."
                    );
                    if !wait_for_funds {
                        eyre::bail!(
                            "insufficient gas balance: {} USD required, {} USD available",
                            format_micro_units(required),
                            format_micro_units(available)
                        );
                    }
                    wait_for_balance(&session, required, poll_interval).await?;
                }
                Ok(StepOutcome::Completed { receipt }) => {
                    println!("{}", receipt.tx_hash);
                    return Ok(());
                }
                Ok(StepOutcome::AlreadyCompleted) => return Ok(()),
                Ok(StepOutcome::Busy) => tokio::task::yield_now().await,
                Err(err) if attempts < retries => {
                    attempts += 1;
                    warn!(%err, attempt = attempts, "Retrying step.");
                }
                Err(err) => return Err(halted(err)),
            }
        }
    }
}

/// Polls the ledger every `poll_interval` until the balance covers `required`.
async fn wait_for_balance(
    session: &SponsorSession,
    required: U256,
    poll_interval: Duration,
) -> eyre::Result<()> {
    loop {
        tokio::time::sleep(poll_interval).await;
        let available = session.available_balance().await.map_err(halted)?;
        if available >= required {
            info!(available = %format_micro_units(available), "Gas balance topped up.");
            return Ok(());
        }
    }
}

fn halted(err: RunError) -> eyre::Report {
    let step = err.step();
    eyre::Report::new(err).wrap_err(format!("sponsorship halted at {step}"))
}

/// Prints the prepaid gas balance of `account`.
async fn balance(config: &SponsorConfig, account: Option<Address>) -> eyre::Result<()> {
    let account = match account {
        Some(account) => account,
        None => user_address(config)?,
    };
    let (provider, _) = spawn::connect(config).await?;

    let balance = GasLedger::new(config.contracts.ledger, provider)
        .userGasAmountInUSD(account)
        .call()
        .await
        .wrap_err("failed to read gas balance")?;

    println!("{} USD", format_micro_units(balance));
    Ok(())
}

/// Prints the delegation state of `account`.
async fn delegation(config: &SponsorConfig, account: Option<Address>) -> eyre::Result<()> {
    let account = match account {
        Some(account) => account,
        None => user_address(config)?,
    };
    let (provider, _) = spawn::connect(config).await?;

    let code = provider.get_code_at(account).await.wrap_err("failed to read account code")?;
    let state = DelegationState::from_code(&code, config.contracts.delegation);

    println!("{state:?}");
    Ok(())
}

fn print_quote(quote: &crate::types::FeeQuote) {
    println!("gas price:  {} wei", quote.gas_price);
    println!("gas limit:  {}", quote.gas_limit);
    println!("fee:        {} ETH", quote.fee_native);
    println!("fee:        {} USD", quote.fee_stable_units);
    println!("debit:      {} micro-USD", quote.fee_micro_units);
    println!("price:      {} USD ({:?})", quote.native_price.usd(), quote.price_source);
}

fn user_address(config: &SponsorConfig) -> eyre::Result<Address> {
    let key = Some(config.secrets.user_key.as_str())
        .filter(|key| !key.is_empty())
        .ok_or_eyre("missing user key, set USER_SK or pass an account")?;
    Ok(DynSigner::from_signing_key(key).wrap_err("invalid user key")?.address())
}

/// Parses a string representing seconds to a [`Duration`].
fn parse_duration_secs(arg: &str) -> Result<Duration, std::num::ParseIntError> {
    let seconds = arg.parse()?;
    Ok(Duration::from_secs(seconds))
}
