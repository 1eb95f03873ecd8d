//! Sponsor submission of authorized calls.

use crate::{
    error::TransactionError,
    transactions::{ConfirmedTransaction, TransactionWatcher},
    types::{DelegationContract, PendingCall, UserSignature},
};
use alloy::{
    primitives::{Address, Bytes, U256},
    sol_types::{SolCall, decode_revert_reason},
};
use tracing::info;

/// Submits and pays for a user's authorized call.
#[async_trait::async_trait]
pub trait SponsorApi: std::fmt::Debug + Send + Sync {
    /// The sponsor address committed to by the authorization digest.
    fn sponsor_address(&self) -> Address;

    /// Calls `execute` on the delegated `account` and waits for inclusion.
    async fn submit(
        &self,
        account: Address,
        call: &PendingCall,
        nonce: u64,
        signature: &UserSignature,
    ) -> Result<ConfirmedTransaction, TransactionError>;
}

/// [`SponsorApi`] sending from the sponsor key held by the watcher.
#[derive(Debug, Clone)]
pub struct SponsorExecutor {
    watcher: TransactionWatcher,
    gas_limit: u64,
}

impl SponsorExecutor {
    /// Creates a new [`SponsorExecutor`].
    pub const fn new(watcher: TransactionWatcher, gas_limit: u64) -> Self {
        Self { watcher, gas_limit }
    }
}

/// Calldata of `execute` authorizing `call` for `sponsor` at `nonce`.
fn execute_input(
    sponsor: Address,
    call: &PendingCall,
    nonce: u64,
    signature: &UserSignature,
) -> Bytes {
    DelegationContract::executeCall {
        userCall: call.into(),
        sponsor,
        nonce: U256::from(nonce),
        signature: Bytes::copy_from_slice(&signature.as_bytes()),
    }
    .abi_encode()
    .into()
}

/// Decodes delegation contract errors, then `Error(string)` and panics.
fn decode_execute_revert(data: &Bytes) -> Option<String> {
    DelegationContract::DelegationContractErrors::decode_reason(data)
        .or_else(|| decode_revert_reason(data))
}

#[async_trait::async_trait]
impl SponsorApi for SponsorExecutor {
    fn sponsor_address(&self) -> Address {
        self.watcher.address()
    }

    async fn submit(
        &self,
        account: Address,
        call: &PendingCall,
        nonce: u64,
        signature: &UserSignature,
    ) -> Result<ConfirmedTransaction, TransactionError> {
        let input = execute_input(self.sponsor_address(), call, nonce, signature);

        // Nonce is read fresh here.
        let tx = self.watcher.eip1559_call(account, input, Some(self.gas_limit)).await?;
        self.watcher.simulate(&tx, decode_execute_revert).await?;

        let confirmed = self.watcher.send(tx).await?;
        info!(%account, tx_hash = %confirmed.tx_hash, "Executed sponsored call.");
        Ok(confirmed)
    }
}
