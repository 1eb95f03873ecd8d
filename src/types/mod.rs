//! Shared primitive types.

mod call;
pub use call::*;

mod delegation;
pub use delegation::*;

mod digest;
pub use digest::*;

mod ledger;
pub use ledger::*;

mod quote;
pub use quote::*;

mod run;
pub use run::*;
