//! The sponsored transaction state machine.
//!
//! A run moves through four ordered steps:
//!
//! 1. install the account delegation
//! 2. obtain the user's signature over the authorization digest
//! 3. price the call and debit the prepaid ledger
//! 4. have the sponsor submit the call
//!
//! Each step is a transition from one [`OrchestrationRun`] to the next. A failed step leaves the
//! run at the same step so it can be retried; there is no backward transition.

mod metrics;
use self::metrics::OrchestratorMetrics;

mod session;
pub use session::SponsorSession;

use crate::{
    authorization::AuthorizationSigner,
    delegation::DelegationApi,
    error::RunError,
    ledger::LedgerApi,
    pricing::FeeEstimator,
    sponsor::SponsorApi,
    transactions::ConfirmedTransaction,
    types::{FeeQuote, OrchestrationRun, PendingCall, Step},
};
use alloy::primitives::{Address, ChainId, U256};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// The result of a call to `advance`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// The step succeeded and the run moved on.
    Advanced {
        /// The step that was executed.
        from: Step,
        /// The step the run is now at.
        to: Step,
    },
    /// The ledger balance does not cover the quote. Nothing was debited and the run stays at
    /// [`Step::AwaitFeePayment`] until the balance is topped up.
    InsufficientFunds {
        /// Micro-units the call costs.
        required: U256,
        /// Micro-units the user holds.
        available: U256,
        /// The quote `required` is taken from.
        quote: FeeQuote,
    },
    /// The sponsored call was included.
    Completed {
        /// The sponsor's `execute` transaction.
        receipt: ConfirmedTransaction,
    },
    /// A step is already in flight. Nothing was done.
    Busy,
    /// The run is already completed. Nothing was done.
    AlreadyCompleted,
}

/// The run after a step, and how the step went.
///
/// On failure the run is at the step that failed, possibly carrying state computed before the
/// failure such as the fee quote.
#[derive(Debug)]
pub struct Transition {
    /// The run after the step.
    pub run: OrchestrationRun,
    /// The step outcome.
    pub outcome: Result<StepOutcome, RunError>,
}

impl Transition {
    fn advanced(mut run: OrchestrationRun) -> Self {
        let from = run.step;
        run.advance_step();
        Self { outcome: Ok(StepOutcome::Advanced { from, to: run.step }), run }
    }

    fn failed(run: OrchestrationRun, err: RunError) -> Self {
        Self { run, outcome: Err(err) }
    }
}

/// Drives runs through the protocol against the chain collaborators.
#[derive(Debug, Clone)]
pub struct Orchestrator {
    chain_id: ChainId,
    delegation: Arc<dyn DelegationApi>,
    signer: AuthorizationSigner,
    fees: FeeEstimator,
    ledger: Arc<dyn LedgerApi>,
    sponsor: Arc<dyn SponsorApi>,
    metrics: Arc<OrchestratorMetrics>,
}

impl Orchestrator {
    /// Creates a new [`Orchestrator`] for `chain_id`.
    pub fn new(
        chain_id: ChainId,
        delegation: Arc<dyn DelegationApi>,
        signer: AuthorizationSigner,
        fees: FeeEstimator,
        ledger: Arc<dyn LedgerApi>,
        sponsor: Arc<dyn SponsorApi>,
    ) -> Self {
        Self {
            chain_id,
            delegation,
            signer,
            fees,
            ledger,
            sponsor,
            metrics: Arc::new(OrchestratorMetrics::default()),
        }
    }

    /// The chain runs execute on.
    pub const fn chain_id(&self) -> ChainId {
        self.chain_id
    }

    /// The sponsor address runs are authorized for.
    pub fn sponsor_address(&self) -> Address {
        self.sponsor.sponsor_address()
    }

    /// Opens a run for `call` from `account`.
    ///
    /// Captures the account nonce, and starts at [`Step::AwaitSignature`] if the delegation is
    /// already installed.
    pub async fn open(
        &self,
        account: Address,
        call: PendingCall,
    ) -> Result<OrchestrationRun, RunError> {
        let state = self
            .delegation
            .delegation_state(account)
            .await
            .map_err(|err| RunError::rpc(Step::AwaitDelegation, err))?;
        let nonce = self
            .delegation
            .account_nonce(account)
            .await
            .map_err(|err| RunError::rpc(Step::AwaitDelegation, err))?;

        let step = if state.is_installed() {
            self.metrics.delegation_skipped.increment(1);
            Step::AwaitSignature
        } else {
            Step::AwaitDelegation
        };

        self.metrics.opened.increment(1);
        info!(%account, ?state, nonce, ?step, "Opened sponsorship run.");

        Ok(OrchestrationRun::new(account, call, self.chain_id, nonce, step))
    }

    /// Returns the current ledger balance of `account`.
    pub async fn available_balance(&self, account: Address) -> Result<U256, RunError> {
        self.ledger.balance_of(account).await.map_err(|err| RunError::rpc(Step::AwaitFeePayment, err))
    }

    /// Executes the current step of `run`.
    ///
    /// A completed run is returned unchanged with [`StepOutcome::AlreadyCompleted`].
    pub async fn advance(&self, run: OrchestrationRun) -> Transition {
        if run.completed {
            return Transition { run, outcome: Ok(StepOutcome::AlreadyCompleted) };
        }

        let step = run.step;
        debug!(account = %run.account, %step, "Executing step.");

        let transition = match step {
            Step::AwaitDelegation => self.await_delegation(run).await,
            Step::AwaitSignature => self.await_signature(run).await,
            Step::AwaitFeePayment => self.await_fee_payment(run).await,
            Step::AwaitSubmission => self.await_submission(run).await,
        };

        match &transition.outcome {
            Ok(StepOutcome::Advanced { .. }) => self.metrics.steps_advanced.increment(1),
            Ok(StepOutcome::Completed { .. }) => self.metrics.completed.increment(1),
            Ok(StepOutcome::InsufficientFunds { .. }) => {
                self.metrics.insufficient_funds.increment(1)
            }
            Ok(_) => {}
            Err(err) => {
                self.metrics.steps_failed.increment(1);
                warn!(account = %transition.run.account, %step, %err, "Step failed.");
            }
        }

        transition
    }

    /// Step 1: install the delegation, unless it already is.
    async fn await_delegation(&self, mut run: OrchestrationRun) -> Transition {
        let state = match self.delegation.delegation_state(run.account).await {
            Ok(state) => state,
            Err(err) => return Transition::failed(run, RunError::rpc(Step::AwaitDelegation, err)),
        };

        if state.is_installed() {
            // Installed since the run was opened, so the nonce may have moved too.
            match self.delegation.account_nonce(run.account).await {
                Ok(nonce) => run.nonce = nonce,
                Err(err) => {
                    return Transition::failed(run, RunError::rpc(Step::AwaitDelegation, err));
                }
            }
            self.metrics.delegation_skipped.increment(1);
            info!(account = %run.account, nonce = run.nonce, "Delegation already installed.");
            return Transition::advanced(run);
        }

        match self.delegation.install(run.account, run.nonce).await {
            Ok(receipt) => {
                run.nonce += 1;
                info!(account = %run.account, tx_hash = %receipt.tx_hash, "Delegation installed.");
                Transition::advanced(run)
            }
            Err(err) => Transition::failed(run, RunError::DelegationFailed(err)),
        }
    }

    /// Step 2: have the user sign the authorization digest.
    async fn await_signature(&self, mut run: OrchestrationRun) -> Transition {
        match self
            .signer
            .sign(&run.call, run.nonce, self.sponsor.sponsor_address(), run.chain_id)
            .await
        {
            Ok(signature) => {
                run.signature = Some(signature);
                Transition::advanced(run)
            }
            Err(err) => Transition::failed(run, RunError::SignatureDeclined(err)),
        }
    }

    /// Step 3: price the call and debit the ledger if the balance covers it.
    async fn await_fee_payment(&self, mut run: OrchestrationRun) -> Transition {
        let quote = match &run.fee_quote {
            Some(quote) => quote.clone(),
            None => {
                let quote = self.fees.quote().await;
                run.fee_quote = Some(quote.clone());
                quote
            }
        };
        let required = quote.fee_micro_units;

        if required.is_zero() {
            self.metrics.zero_fee.increment(1);
            debug!(account = %run.account, "Zero fee, skipping debit.");
            return Transition::advanced(run);
        }

        let available = match self.ledger.balance_of(run.account).await {
            Ok(balance) => balance,
            Err(err) => return Transition::failed(run, RunError::rpc(Step::AwaitFeePayment, err)),
        };

        if available < required {
            info!(account = %run.account, %required, %available, "Insufficient gas balance.");
            return Transition {
                run,
                outcome: Ok(StepOutcome::InsufficientFunds { required, available, quote }),
            };
        }

        match self.ledger.debit(run.account, required).await {
            Ok(_) => Transition::advanced(run),
            Err(err) => Transition::failed(run, RunError::DebitFailed(err)),
        }
    }

    /// Step 4: have the sponsor submit the call.
    async fn await_submission(&self, mut run: OrchestrationRun) -> Transition {
        // A run constructed at step 4 by hand may not be signed yet.
        let signature = match run.signature {
            Some(signature) => signature,
            None => match self
                .signer
                .sign(&run.call, run.nonce, self.sponsor.sponsor_address(), run.chain_id)
                .await
            {
                Ok(signature) => *run.signature.insert(signature),
                Err(err) => return Transition::failed(run, RunError::SignatureDeclined(err)),
            },
        };

        match self.sponsor.submit(run.account, &run.call, run.nonce, &signature).await {
            Ok(receipt) => {
                run.advance_step();
                info!(account = %run.account, tx_hash = %receipt.tx_hash, "Sponsored call executed.");
                Transition { run, outcome: Ok(StepOutcome::Completed { receipt }) }
            }
            Err(err) => Transition::failed(run, RunError::ExecutionFailed(err)),
        }
    }
}
