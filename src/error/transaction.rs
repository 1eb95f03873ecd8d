use alloy::{
    primitives::{Address, B256},
    providers::PendingTransactionError,
    transports::{RpcError, TransportErrorKind},
};
use thiserror::Error;

/// Errors that may occur while sending a transaction or reading chain state.
#[derive(Debug, Error)]
pub enum TransactionError {
    /// The call reverted when simulated before broadcasting.
    #[error("execution reverted: {reason}")]
    Revert {
        /// Decoded revert reason, or the raw revert data.
        reason: String,
    },
    /// The transaction was included with a failed status.
    #[error("transaction {0} reverted")]
    Reverted(B256),
    /// The transaction was not included before the timeout.
    #[error("transaction {0} was not included")]
    NotIncluded(B256),
    /// The authorization was included but the account code does not point at the delegation.
    #[error("delegation of {account} to {delegation} was not applied")]
    DelegationNotApplied {
        /// The account.
        account: Address,
        /// The expected delegation contract.
        delegation: Address,
    },
    /// Error occurred while signing a transaction or authorization.
    #[error(transparent)]
    Sign(#[from] alloy::signers::Error),
    /// RPC error.
    #[error(transparent)]
    Rpc(#[from] RpcError<TransportErrorKind>),
    /// Contract call error.
    #[error(transparent)]
    Contract(#[from] alloy::contract::Error),
    /// Other errors.
    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync + 'static>),
}

impl From<PendingTransactionError> for TransactionError {
    fn from(value: PendingTransactionError) -> Self {
        match value {
            PendingTransactionError::TransportError(err) => Self::Rpc(err),
            err => Self::Other(Box::new(err)),
        }
    }
}
