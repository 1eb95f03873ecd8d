use super::{ConfirmedTransaction, TransactionMetrics};
use crate::{error::TransactionError, signers::DynSigner};
use alloy::{
    consensus::{TxEip1559, TypedTransaction},
    eips::Encodable2718,
    network::{Ethereum, EthereumWallet, NetworkWallet},
    primitives::{Address, Bytes, TxKind, U256},
    providers::{DynProvider, PendingTransactionError, Provider, WatchTxError},
    rpc::types::TransactionRequest,
    transports::{RpcError, TransportErrorKind},
};
use std::{
    fmt,
    sync::Arc,
    time::{Duration, Instant},
};
use tracing::{debug, warn};

/// Signs transactions with a single key, broadcasts them and waits for their inclusion.
///
/// Inclusion, not submission, is what callers wait on: [`TransactionWatcher::send`] only returns
/// once the transaction has a receipt, or the inclusion timeout elapsed.
#[derive(Clone)]
pub struct TransactionWatcher {
    /// Provider used to read chain state and broadcast transactions.
    provider: DynProvider,
    /// Address of the signing key.
    signer: Address,
    /// Wallet wrapping the signing key.
    wallet: EthereumWallet,
    /// How long to wait for inclusion.
    timeout: Duration,
    /// Metrics shared between clones.
    metrics: Arc<TransactionMetrics>,
}

impl fmt::Debug for TransactionWatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransactionWatcher")
            .field("signer", &self.signer)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl TransactionWatcher {
    /// Creates a new [`TransactionWatcher`] signing with `signer`.
    pub fn new(provider: DynProvider, signer: DynSigner, timeout: Duration) -> Self {
        Self {
            provider,
            signer: signer.address(),
            wallet: EthereumWallet::new(signer.0),
            timeout,
            metrics: Arc::new(TransactionMetrics::default()),
        }
    }

    /// The provider this watcher reads from and broadcasts to.
    pub const fn provider(&self) -> &DynProvider {
        &self.provider
    }

    /// The address transactions are sent from.
    pub const fn address(&self) -> Address {
        self.signer
    }

    /// Builds an EIP-1559 call from the signer to `to`.
    ///
    /// The nonce is read from the pending block and fees are estimated from the node. The gas
    /// limit is estimated when not given.
    pub async fn eip1559_call(
        &self,
        to: Address,
        input: Bytes,
        gas_limit: Option<u64>,
    ) -> Result<TypedTransaction, TransactionError> {
        let chain_id = self.provider.get_chain_id().await?;
        let nonce = self.provider.get_transaction_count(self.signer).pending().await?;
        let fees = self.provider.estimate_eip1559_fees().await?;
        let gas_limit = match gas_limit {
            Some(gas_limit) => gas_limit,
            None => {
                self.provider
                    .estimate_gas(TransactionRequest {
                        from: Some(self.signer),
                        to: Some(TxKind::Call(to)),
                        input: input.clone().into(),
                        ..Default::default()
                    })
                    .await?
            }
        };

        Ok(TxEip1559 {
            chain_id,
            nonce,
            gas_limit,
            max_fee_per_gas: fees.max_fee_per_gas,
            max_priority_fee_per_gas: fees.max_priority_fee_per_gas,
            to: TxKind::Call(to),
            value: U256::ZERO,
            access_list: Default::default(),
            input,
        }
        .into())
    }

    /// Simulates `tx` with `eth_call` from the signer.
    ///
    /// Revert data is passed to `decode`; when it yields nothing the raw data is reported.
    pub async fn simulate(
        &self,
        tx: &TypedTransaction,
        decode: impl Fn(&Bytes) -> Option<String>,
    ) -> Result<Bytes, TransactionError> {
        let mut request: TransactionRequest = tx.clone().into();
        // Unset nonce, the simulation should not depend on it.
        request.nonce = None;
        request.from = Some(self.signer);

        self.provider.call(request).await.map_err(|err| match revert_reason(&err, decode) {
            Some(reason) => {
                self.metrics.simulation_failed.increment(1);
                TransactionError::Revert { reason }
            }
            None => err.into(),
        })
    }

    /// Signs and broadcasts `tx`, then waits for it to be included.
    ///
    /// Returns [`TransactionError::Reverted`] for a failed receipt and
    /// [`TransactionError::NotIncluded`] if no receipt arrived within the timeout.
    pub async fn send(&self, tx: TypedTransaction) -> Result<ConfirmedTransaction, TransactionError> {
        let signed =
            NetworkWallet::<Ethereum>::sign_transaction_from(&self.wallet, self.signer, tx)
                .await?;

        let pending = self.provider.send_raw_transaction(&signed.encoded_2718()).await?;
        let tx_hash = *pending.tx_hash();
        self.metrics.sent.increment(1);
        debug!(%tx_hash, signer = %self.signer, "sent transaction");

        let start = Instant::now();
        let receipt = match pending.with_timeout(Some(self.timeout)).get_receipt().await {
            Ok(receipt) => receipt,
            Err(PendingTransactionError::TxWatcher(WatchTxError::Timeout)) => {
                self.metrics.timed_out.increment(1);
                warn!(%tx_hash, timeout = ?self.timeout, "transaction was not included");
                return Err(TransactionError::NotIncluded(tx_hash));
            }
            Err(err) => return Err(err.into()),
        };
        self.metrics.confirmation_time.record(start.elapsed().as_millis() as f64);

        if !receipt.status() {
            self.metrics.reverted.increment(1);
            warn!(%tx_hash, "transaction reverted");
            return Err(TransactionError::Reverted(tx_hash));
        }

        self.metrics.confirmed.increment(1);
        debug!(%tx_hash, block = ?receipt.block_number, "transaction confirmed");

        Ok(ConfirmedTransaction::from(&receipt))
    }
}

/// Extracts a revert reason from an RPC error, if it carries revert data.
///
/// The data is passed to `decode`; undecodable data is reported as hex.
pub fn revert_reason(
    err: &RpcError<TransportErrorKind>,
    decode: impl Fn(&Bytes) -> Option<String>,
) -> Option<String> {
    let data = err.as_error_resp().and_then(|resp| resp.as_revert_data())?;
    Some(decode(&data).unwrap_or_else(|| data.to_string()))
}
