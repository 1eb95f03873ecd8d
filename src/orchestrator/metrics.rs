use metrics::Counter;
use metrics_derive::Metrics;

/// Metrics for an [`Orchestrator`](crate::orchestrator::Orchestrator).
#[derive(Metrics)]
#[metrics(scope = "orchestrator")]
pub(crate) struct OrchestratorMetrics {
    /// Number of opened runs.
    pub(crate) opened: Counter,
    /// Number of steps that advanced the run.
    pub(crate) steps_advanced: Counter,
    /// Number of delegation steps skipped because the account was already delegated.
    pub(crate) delegation_skipped: Counter,
    /// Number of failed steps.
    pub(crate) steps_failed: Counter,
    /// Number of fee payments halted on an insufficient balance.
    pub(crate) insufficient_funds: Counter,
    /// Number of fee payments skipped because the quote was zero.
    pub(crate) zero_fee: Counter,
    /// Number of completed runs.
    pub(crate) completed: Counter,
    /// Number of `advance` calls rejected while a step was in flight.
    pub(crate) busy: Counter,
}
