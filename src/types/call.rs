//! The call a user asks to have sponsored.

use super::DelegationContract;
use alloy::primitives::{Address, B256, Bytes, U256, keccak256};
use serde::{Deserialize, Serialize};

/// A call to be executed from the user's delegated account.
///
/// Supplied by an external call builder (transfer, swap, ...). The calldata is opaque and never
/// parsed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingCall {
    /// The call target.
    #[serde(rename = "to")]
    pub target: Address,
    /// The calldata bytes.
    #[serde(rename = "data", default)]
    pub calldata: Bytes,
    /// Amount of native value forwarded to the target.
    #[serde(default)]
    pub value: U256,
}

impl PendingCall {
    /// Creates a new [`PendingCall`].
    pub fn new(target: Address, calldata: impl Into<Bytes>, value: U256) -> Self {
        Self { target, calldata: calldata.into(), value }
    }

    /// Keccak hash of the calldata, as committed to by the authorization digest.
    pub fn calldata_hash(&self) -> B256 {
        keccak256(&self.calldata)
    }
}

impl From<PendingCall> for DelegationContract::Call {
    fn from(call: PendingCall) -> Self {
        Self { data: call.calldata, to: call.target, value: call.value }
    }
}

impl From<&PendingCall> for DelegationContract::Call {
    fn from(call: &PendingCall) -> Self {
        call.clone().into()
    }
}
