//! # Gas sponsor
//!
//! Lets the holder of an EIP-7702 account execute a call without holding native gas. The sponsor
//! submits and pays for the transaction, and is reimbursed from the user's prepaid stable unit
//! balance on the gas ledger.
//!
//! See [`orchestrator`] for the protocol.

pub mod authorization;
pub mod cli;
pub mod config;
pub mod constants;
pub mod delegation;
pub mod error;
pub mod ledger;
pub mod metrics;
pub mod orchestrator;
pub mod price;
pub mod pricing;
pub mod serde;
pub mod signers;
pub mod spawn;
pub mod sponsor;
pub mod transactions;
pub mod types;
