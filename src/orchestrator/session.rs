use super::{Orchestrator, StepOutcome, Transition};
use crate::{
    error::RunError,
    types::{OrchestrationRun, PendingCall},
};
use alloy::primitives::{Address, U256};
use parking_lot::Mutex;
use tracing::debug;

/// The run held by a session.
#[derive(Debug)]
struct SessionState {
    run: OrchestrationRun,
    /// Bumped whenever the run is replaced, so a step started on an older run cannot write back.
    epoch: u64,
}

/// Caller-facing handle on a single sponsorship run.
///
/// Allows at most one in-flight [`SponsorSession::advance`]; concurrent calls return
/// [`StepOutcome::Busy`] without doing anything.
#[derive(Debug)]
pub struct SponsorSession {
    orchestrator: Orchestrator,
    state: Mutex<SessionState>,
}

impl SponsorSession {
    /// Opens a session for `call` from `account`.
    pub async fn open(
        orchestrator: Orchestrator,
        account: Address,
        call: PendingCall,
    ) -> Result<Self, RunError> {
        let run = orchestrator.open(account, call).await?;
        Ok(Self { orchestrator, state: Mutex::new(SessionState { run, epoch: 0 }) })
    }

    /// A snapshot of the current run.
    pub fn run(&self) -> OrchestrationRun {
        self.state.lock().run.clone()
    }

    /// Executes the current step.
    ///
    /// If the returned future is dropped before it resolves, the run stays at its current step
    /// and can be advanced again. On-chain effects already in flight are not reverted.
    pub async fn advance(&self) -> Result<StepOutcome, RunError> {
        let (run, epoch) = {
            let mut state = self.state.lock();
            if state.run.completed {
                return Ok(StepOutcome::AlreadyCompleted);
            }
            if state.run.processing {
                self.orchestrator.metrics.busy.increment(1);
                debug!(account = %state.run.account, step = %state.run.step, "Step in flight.");
                return Ok(StepOutcome::Busy);
            }
            state.run.processing = true;
            (state.run.clone(), state.epoch)
        };

        let guard = ProcessingGuard { state: &self.state };
        let Transition { mut run, outcome } = self.orchestrator.advance(run).await;

        run.processing = false;
        {
            let mut state = self.state.lock();
            if state.epoch == epoch {
                state.run = run;
            }
        }
        drop(guard);

        outcome
    }

    /// Abandons the current run and opens a new one for `call` from the same account.
    ///
    /// A step still in flight for the old run completes on chain but is not recorded. The new run
    /// stays busy until that step has finished.
    pub async fn reset(&self, call: PendingCall) -> Result<(), RunError> {
        let account = self.state.lock().run.account;
        let mut run = self.orchestrator.open(account, call).await?;

        let mut state = self.state.lock();
        run.processing = state.run.processing;
        state.run = run;
        state.epoch += 1;
        Ok(())
    }

    /// Re-reads the account's ledger balance, e.g. after it was topped up.
    pub async fn available_balance(&self) -> Result<U256, RunError> {
        let account = self.state.lock().run.account;
        self.orchestrator.available_balance(account).await
    }

    /// Closes the session, returning the final run.
    ///
    /// The signature and fee quote are discarded; on-chain effects of completed steps remain.
    pub fn close(self) -> OrchestrationRun {
        let mut run = self.state.into_inner().run;
        run.processing = false;
        run.signature = None;
        run.fee_quote = None;
        run
    }
}

/// Clears the processing flag when an in-flight step finishes or is dropped.
///
/// The flag is cleared even if the run was reset meanwhile, since the reset run inherits it.
struct ProcessingGuard<'a> {
    state: &'a Mutex<SessionState>,
}

impl Drop for ProcessingGuard<'_> {
    fn drop(&mut self) {
        self.state.lock().run.processing = false;
    }
}
