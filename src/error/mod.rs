//! Sponsor error types.
use crate::types::Step;
use thiserror::Error;

mod price;
pub use price::PriceFeedError;

mod transaction;
pub use transaction::TransactionError;

/// Failure of a single protocol step.
///
/// None of these are fatal to the process. The run stays at [`RunError::step`] and the caller
/// decides whether to retry or abandon it.
#[derive(Debug, Error)]
pub enum RunError {
    /// The delegation transaction failed, reverted or was not included.
    #[error("delegation failed: {0}")]
    DelegationFailed(#[source] TransactionError),
    /// The user refused to sign the authorization digest.
    #[error("signature declined: {0}")]
    SignatureDeclined(#[source] alloy::signers::Error),
    /// The ledger debit failed, reverted or was not included.
    #[error("debit failed: {0}")]
    DebitFailed(#[source] TransactionError),
    /// The sponsored call failed, reverted or was not included.
    #[error("execution failed: {0}")]
    ExecutionFailed(#[source] TransactionError),
    /// A chain read required by the step failed.
    #[error("{step}: chain read failed: {source}")]
    Rpc {
        /// The step the read was made for.
        step: Step,
        /// The underlying error.
        #[source]
        source: TransactionError,
    },
}

impl RunError {
    /// The step that failed.
    pub const fn step(&self) -> Step {
        match self {
            Self::DelegationFailed(_) => Step::AwaitDelegation,
            Self::SignatureDeclined(_) => Step::AwaitSignature,
            Self::DebitFailed(_) => Step::AwaitFeePayment,
            Self::ExecutionFailed(_) => Step::AwaitSubmission,
            Self::Rpc { step, .. } => *step,
        }
    }

    /// Creates a [`RunError::Rpc`] for `step`.
    pub fn rpc(step: Step, source: impl Into<TransactionError>) -> Self {
        Self::Rpc { step, source: source.into() }
    }
}
