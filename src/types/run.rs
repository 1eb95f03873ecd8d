//! Sponsorship run state.

use super::{FeeQuote, PendingCall};
use alloy::primitives::{Address, B256, ChainId, Signature};
use std::fmt;

/// A step of the sponsorship protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Step {
    /// Install the account delegation.
    AwaitDelegation = 1,
    /// Obtain the user's signature over the authorization digest.
    AwaitSignature = 2,
    /// Price the call and debit the prepaid ledger.
    AwaitFeePayment = 3,
    /// Have the sponsor submit the call.
    AwaitSubmission = 4,
}

impl Step {
    /// The step number, `1..=4`.
    pub const fn number(&self) -> u8 {
        *self as u8
    }

    /// The step following this one, if any.
    pub const fn next(&self) -> Option<Self> {
        match self {
            Self::AwaitDelegation => Some(Self::AwaitSignature),
            Self::AwaitSignature => Some(Self::AwaitFeePayment),
            Self::AwaitFeePayment => Some(Self::AwaitSubmission),
            Self::AwaitSubmission => None,
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::AwaitDelegation => "authorize delegation",
            Self::AwaitSignature => "sign authorization",
            Self::AwaitFeePayment => "pay fees",
            Self::AwaitSubmission => "submit transaction",
        };
        write!(f, "step {} ({name})", self.number())
    }
}

/// The user's signature together with the digest it was produced for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserSignature {
    /// The signed authorization digest.
    pub digest: B256,
    /// The signature over the digest.
    pub signature: Signature,
}

impl UserSignature {
    /// The 65-byte `r || s || v` encoding expected by the delegation contract.
    pub fn as_bytes(&self) -> [u8; 65] {
        self.signature.as_bytes()
    }
}

/// The mutable state of one sponsorship request.
///
/// Owned by a single session. Transient fields are discarded when the run is reset; on-chain
/// effects of completed steps are not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrchestrationRun {
    /// The user account the call is executed from.
    pub account: Address,
    /// The call being sponsored.
    pub call: PendingCall,
    /// Chain the run executes on.
    pub chain_id: ChainId,
    /// Current step.
    pub step: Step,
    /// Whether the sponsored call has been included.
    pub completed: bool,
    /// User nonce committed to by the authorization digest.
    ///
    /// Captured once at session start and bumped only after the delegation is installed.
    pub nonce: u64,
    /// Signature obtained in step 2.
    pub signature: Option<UserSignature>,
    /// Quote computed in step 3.
    pub fee_quote: Option<FeeQuote>,
    /// Whether a step is currently executing.
    pub processing: bool,
}

impl OrchestrationRun {
    /// Creates a fresh run starting at `step`.
    pub fn new(
        account: Address,
        call: PendingCall,
        chain_id: ChainId,
        nonce: u64,
        step: Step,
    ) -> Self {
        Self {
            account,
            call,
            chain_id,
            step,
            completed: false,
            nonce,
            signature: None,
            fee_quote: None,
            processing: false,
        }
    }

    /// Moves the run to the next step, or marks it completed after the last one.
    pub(crate) fn advance_step(&mut self) {
        match self.step.next() {
            Some(next) => self.step = next,
            None => self.completed = true,
        }
    }
}
