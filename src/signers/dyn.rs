//! Local key signer.
use super::DigestSigner;
use alloy::{
    eips::eip7702::{Authorization, SignedAuthorization},
    network::{FullSigner, TxSigner},
    primitives::{Address, B256, Signature},
    signers::local::PrivateKeySigner,
};
use std::{fmt, ops::Deref, str::FromStr, sync::Arc};

/// Type-erased signer used for both the user and the sponsor account.
#[derive(Clone)]
pub struct DynSigner(pub Arc<dyn FullSigner<Signature> + Send + Sync>);

impl fmt::Debug for DynSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("DynSigner").field(&self.address()).finish()
    }
}

impl DynSigner {
    /// Load a hex encoded private key.
    pub fn from_signing_key(key: &str) -> eyre::Result<Self> {
        Ok(Self(Arc::new(PrivateKeySigner::from_str(key)?)))
    }

    /// Returns the signer's Ethereum Address.
    pub fn address(&self) -> Address {
        TxSigner::address(&self.0)
    }

    /// Signs an EIP-7702 authorization with this signer as the authority.
    pub async fn sign_authorization(
        &self,
        authorization: Authorization,
    ) -> Result<SignedAuthorization, alloy::signers::Error> {
        let signature = self.sign_hash(&authorization.signature_hash()).await?;
        Ok(authorization.into_signed(signature))
    }
}

impl Deref for DynSigner {
    type Target = dyn FullSigner<Signature> + Send + Sync;

    fn deref(&self) -> &Self::Target {
        self.0.as_ref()
    }
}

#[async_trait::async_trait]
impl DigestSigner for DynSigner {
    fn address(&self) -> Address {
        Self::address(self)
    }

    async fn sign_digest(&self, digest: B256) -> Result<Signature, alloy::signers::Error> {
        self.sign_message(digest.as_slice()).await
    }
}
