use metrics::{Counter, Histogram};
use metrics_derive::Metrics;

/// Metrics for a [`TransactionWatcher`](crate::transactions::TransactionWatcher).
#[derive(Metrics)]
#[metrics(scope = "transactions")]
pub struct TransactionMetrics {
    /// Number of broadcast transactions.
    pub sent: Counter,
    /// Number of transactions rejected by simulation before broadcasting.
    pub simulation_failed: Counter,
    /// Number of transactions included with a success status.
    pub confirmed: Counter,
    /// Number of transactions included with a failed status.
    pub reverted: Counter,
    /// Number of transactions not included before the timeout.
    pub timed_out: Counter,
    /// Time it takes to include transactions, in milliseconds.
    pub confirmation_time: Histogram,
}
