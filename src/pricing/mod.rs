//! Fee estimation in native and stable units.

mod conversion;
pub use conversion::{format_micro_units, format_native, stable_cents};

mod fee_estimator;
pub use fee_estimator::FeeEstimator;
