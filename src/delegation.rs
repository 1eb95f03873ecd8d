//! EIP-7702 delegation installation.

use crate::{
    error::TransactionError,
    signers::DynSigner,
    transactions::{ConfirmedTransaction, TransactionWatcher},
    types::DelegationState,
};
use alloy::{
    consensus::TxEip7702,
    eips::{eip1559::Eip1559Estimation, eip7702::Authorization},
    primitives::{Address, ChainId, U256},
    providers::Provider,
};
use tracing::{debug, info};

/// Reads and installs the delegation of an account to the shared delegation contract.
#[async_trait::async_trait]
pub trait DelegationApi: std::fmt::Debug + Send + Sync {
    /// Returns the delegation state of `account`, derived from its code.
    async fn delegation_state(&self, account: Address) -> Result<DelegationState, TransactionError>;

    /// Returns the pending transaction count of `account`.
    async fn account_nonce(&self, account: Address) -> Result<u64, TransactionError>;

    /// Installs the delegation on `account` with a transaction at `nonce`, waiting for inclusion.
    ///
    /// Fails with [`TransactionError::DelegationNotApplied`] if the transaction was included but
    /// the account is still not delegated.
    async fn install(
        &self,
        account: Address,
        nonce: u64,
    ) -> Result<ConfirmedTransaction, TransactionError>;
}

/// [`DelegationApi`] that installs the delegation with a self-sent EIP-7702 transaction.
///
/// Both the authorization and the transaction are signed by the account's own key.
#[derive(Debug, Clone)]
pub struct DelegationInstaller {
    delegation: Address,
    signer: DynSigner,
    watcher: TransactionWatcher,
    gas_limit: u64,
}

impl DelegationInstaller {
    /// Creates an installer for the account of `signer`.
    pub const fn new(
        delegation: Address,
        signer: DynSigner,
        watcher: TransactionWatcher,
        gas_limit: u64,
    ) -> Self {
        Self { delegation, signer, watcher, gas_limit }
    }

    /// Builds the self-sent transaction installing the delegation on the signer's account.
    async fn delegation_transaction(
        &self,
        chain_id: ChainId,
        nonce: u64,
        fees: Eip1559Estimation,
    ) -> Result<TxEip7702, TransactionError> {
        // The sender nonce is bumped before the authorization list is processed.
        let authorization = self
            .signer
            .sign_authorization(Authorization {
                chain_id: U256::from(chain_id),
                address: self.delegation,
                nonce: nonce + 1,
            })
            .await?;

        Ok(TxEip7702 {
            chain_id,
            nonce,
            gas_limit: self.gas_limit,
            max_fee_per_gas: fees.max_fee_per_gas,
            max_priority_fee_per_gas: fees.max_priority_fee_per_gas,
            to: self.signer.address(),
            value: U256::ZERO,
            access_list: Default::default(),
            authorization_list: vec![authorization],
            input: Default::default(),
        })
    }

    /// Fails with [`TransactionError::DelegationNotApplied`] unless `account` is delegated.
    async fn ensure_installed(&self, account: Address) -> Result<(), TransactionError> {
        if !self.delegation_state(account).await?.is_installed() {
            return Err(TransactionError::DelegationNotApplied {
                account,
                delegation: self.delegation,
            });
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl DelegationApi for DelegationInstaller {
    async fn delegation_state(&self, account: Address) -> Result<DelegationState, TransactionError> {
        let code = self.watcher.provider().get_code_at(account).await?;
        let state = DelegationState::from_code(&code, self.delegation);
        debug!(%account, ?state, "Read delegation state.");
        Ok(state)
    }

    async fn account_nonce(&self, account: Address) -> Result<u64, TransactionError> {
        Ok(self.watcher.provider().get_transaction_count(account).pending().await?)
    }

    async fn install(
        &self,
        account: Address,
        nonce: u64,
    ) -> Result<ConfirmedTransaction, TransactionError> {
        if account != self.signer.address() {
            return Err(TransactionError::Other(
                format!("no key for {account}, installer signs for {}", self.signer.address())
                    .into(),
            ));
        }

        let provider = self.watcher.provider();
        let chain_id = provider.get_chain_id().await?;
        let fees = provider.estimate_eip1559_fees().await?;

        let tx = self.delegation_transaction(chain_id, nonce, fees).await?;
        let confirmed = self.watcher.send(tx.into()).await?;
        self.ensure_installed(account).await?;

        info!(%account, delegation = %self.delegation, tx_hash = %confirmed.tx_hash, "Installed delegation.");
        Ok(confirmed)
    }
}
