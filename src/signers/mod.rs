//! Sponsor and user signers.

mod r#dyn;
pub use r#dyn::DynSigner;

use alloy::primitives::{Address, B256, Signature};

/// A wallet that can sign an authorization digest on behalf of a user.
///
/// The digest is signed as a raw 32-byte EIP-191 personal message. Implementations may prompt a
/// human and may take arbitrarily long; a refusal is reported as an error.
#[async_trait::async_trait]
pub trait DigestSigner: std::fmt::Debug + Send + Sync {
    /// The address whose key produces the signatures.
    fn address(&self) -> Address;

    /// Signs `digest` as an EIP-191 personal message.
    async fn sign_digest(&self, digest: B256) -> Result<Signature, alloy::signers::Error>;
}
