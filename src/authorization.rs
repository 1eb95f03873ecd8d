//! User authorization of a sponsored call.

use crate::{
    signers::DigestSigner,
    types::{AuthorizationDigest, PendingCall, UserSignature},
};
use alloy::primitives::{Address, ChainId};
use std::sync::Arc;
use tracing::debug;

/// Computes authorization digests and has the user's wallet sign them.
#[derive(Debug, Clone)]
pub struct AuthorizationSigner {
    signer: Arc<dyn DigestSigner>,
}

impl AuthorizationSigner {
    /// Creates a new [`AuthorizationSigner`] for the user's wallet.
    pub fn new(signer: Arc<dyn DigestSigner>) -> Self {
        Self { signer }
    }

    /// The address of the user's wallet.
    pub fn address(&self) -> Address {
        self.signer.address()
    }

    /// Signs the digest of `call` for `sponsor` at `nonce`.
    ///
    /// Has no side effects. A wallet refusal is returned as is.
    pub async fn sign(
        &self,
        call: &PendingCall,
        nonce: u64,
        sponsor: Address,
        chain_id: ChainId,
    ) -> Result<UserSignature, alloy::signers::Error> {
        let digest = AuthorizationDigest::compute(chain_id, call, sponsor, nonce).hash();
        debug!(%digest, %sponsor, nonce, "Requesting authorization signature.");

        let signature = self.signer.sign_digest(digest).await?;
        Ok(UserSignature { digest, signature })
    }
}
