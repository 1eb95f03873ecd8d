//! Submitting transactions and waiting for their inclusion.

mod metrics;
pub use metrics::TransactionMetrics;
mod transaction;
pub use transaction::ConfirmedTransaction;
mod watcher;
pub use watcher::{TransactionWatcher, revert_reason};
