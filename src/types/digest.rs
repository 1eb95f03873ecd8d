//! Authorization digest signed by the user and recomputed by the delegation contract.

use super::PendingCall;
use alloy::{
    primitives::{Address, B256, ChainId, U256, keccak256},
    sol_types::SolValue,
};

/// The digest binding a [`PendingCall`] to a sponsor and a nonce.
///
/// ```solidity
/// keccak256(abi.encode(block.chainid, to, value, keccak256(data), sponsor, nonce))
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AuthorizationDigest(B256);

impl AuthorizationDigest {
    /// Computes the digest for the given call.
    pub fn compute(chain_id: ChainId, call: &PendingCall, sponsor: Address, nonce: u64) -> Self {
        let encoded = (
            U256::from(chain_id),
            call.target,
            call.value,
            call.calldata_hash(),
            sponsor,
            U256::from(nonce),
        )
            .abi_encode_params();
        Self(keccak256(encoded))
    }

    /// Returns the digest hash.
    pub const fn hash(&self) -> B256 {
        self.0
    }
}

impl From<AuthorizationDigest> for B256 {
    fn from(digest: AuthorizationDigest) -> Self {
        digest.0
    }
}
