//! Prepaid gas ledger access.

use crate::{
    error::TransactionError,
    transactions::{ConfirmedTransaction, TransactionWatcher},
    types::GasLedger,
};
use alloy::{
    primitives::{Address, Bytes, U256},
    sol_types::{SolCall, decode_revert_reason},
};
use tracing::{debug, info};

/// Reads and debits the prepaid gas balances.
///
/// Balances are denominated in micro-USD.
#[async_trait::async_trait]
pub trait LedgerApi: std::fmt::Debug + Send + Sync {
    /// Returns the balance of `user`.
    async fn balance_of(&self, user: Address) -> Result<U256, TransactionError>;

    /// Debits `amount` from `user` and waits for inclusion.
    async fn debit(
        &self,
        user: Address,
        amount: U256,
    ) -> Result<ConfirmedTransaction, TransactionError>;
}

/// [`LedgerApi`] backed by the on-chain gas ledger contract.
///
/// Debits are sent from the sponsor key held by the watcher.
#[derive(Debug, Clone)]
pub struct OnchainLedger {
    address: Address,
    watcher: TransactionWatcher,
}

impl OnchainLedger {
    /// Creates a ledger accessor for the contract at `address`.
    pub const fn new(address: Address, watcher: TransactionWatcher) -> Self {
        Self { address, watcher }
    }
}

/// Calldata debiting `amount` micro-USD from `user`.
fn debit_input(user: Address, amount: U256) -> Bytes {
    GasLedger::deductGasCall { user, usdAmount: amount }.abi_encode().into()
}

#[async_trait::async_trait]
impl LedgerApi for OnchainLedger {
    async fn balance_of(&self, user: Address) -> Result<U256, TransactionError> {
        let balance = GasLedger::new(self.address, self.watcher.provider().clone())
            .userGasAmountInUSD(user)
            .call()
            .await?;
        debug!(%user, %balance, "Read ledger balance.");
        Ok(balance)
    }

    async fn debit(
        &self,
        user: Address,
        amount: U256,
    ) -> Result<ConfirmedTransaction, TransactionError> {
        let tx = self.watcher.eip1559_call(self.address, debit_input(user, amount), None).await?;
        self.watcher.simulate(&tx, |data| decode_revert_reason(data)).await?;

        let confirmed = self.watcher.send(tx).await?;
        info!(%user, %amount, tx_hash = %confirmed.tx_hash, "Debited gas ledger.");
        Ok(confirmed)
    }
}
