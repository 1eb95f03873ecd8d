use alloy::{
    eips::eip7702::constants::{EIP7702_CLEARED_DELEGATION, EIP7702_DELEGATION_DESIGNATOR},
    primitives::{Address, Bytes},
    sol,
    sol_types::SolInterface,
};
use serde::{Deserialize, Serialize};

sol! {
    #[sol(rpc)]
    #[derive(Debug)]
    contract DelegationContract {
        /// A call forwarded by the delegated account.
        #[derive(PartialEq, Eq)]
        struct Call {
            /// The calldata bytes.
            bytes data;
            /// The call target.
            address to;
            /// Amount of native value to send to the target.
            uint256 value;
        }

        /// The signature could not be recovered.
        error ECDSAInvalidSignature();

        /// The signature has an invalid length.
        error ECDSAInvalidSignatureLength(uint256 length);

        /// The signature has a malleable `s` value.
        error ECDSAInvalidSignatureS(bytes32 s);

        /// The forwarded call reverted.
        error ExternalCallFailed();

        /// The account cannot cover the forwarded value.
        error InsufficientETHBalance();

        /// The recovered signer is not the account.
        error InvalidSigner();

        /// Verifies `signature` over the authorization digest and forwards `userCall`.
        function execute(Call calldata userCall, address sponsor, uint256 nonce, bytes calldata signature)
            external
            payable;
    }
}

impl DelegationContract::DelegationContractErrors {
    /// Decodes revert data returned by the delegation contract into a readable reason.
    pub fn decode_reason(data: &Bytes) -> Option<String> {
        let err = Self::abi_decode(data).ok()?;
        Some(match err {
            Self::ECDSAInvalidSignature(_) => "invalid signature".to_string(),
            Self::ECDSAInvalidSignatureLength(err) => {
                format!("invalid signature length {}", err.length)
            }
            Self::ECDSAInvalidSignatureS(err) => format!("invalid signature s value {}", err.s),
            Self::ExternalCallFailed(_) => "forwarded call failed".to_string(),
            Self::InsufficientETHBalance(_) => {
                "account balance does not cover the forwarded value".to_string()
            }
            Self::InvalidSigner(_) => "signer is not the account".to_string(),
        })
    }
}

/// Delegation status of an account with respect to the shared delegation contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DelegationState {
    /// The account has no code, cleared code, or delegates somewhere else.
    NotInstalled,
    /// The account code is the EIP-7702 designator pointing at the delegation contract.
    Installed,
}

impl DelegationState {
    /// Derives the state from the account code.
    pub fn from_code(code: &[u8], delegation: Address) -> Self {
        match delegated_address(code) {
            Some(address) if address == delegation => Self::Installed,
            _ => Self::NotInstalled,
        }
    }

    /// Whether the delegation is installed.
    pub const fn is_installed(&self) -> bool {
        matches!(self, Self::Installed)
    }
}

/// Returns the address an EIP-7702 designator points to, if `code` is one.
pub fn delegated_address(code: &[u8]) -> Option<Address> {
    if code.len() != EIP7702_DELEGATION_DESIGNATOR.len() + 20
        || !code.starts_with(&EIP7702_DELEGATION_DESIGNATOR)
        || code == EIP7702_CLEARED_DELEGATION
    {
        return None;
    }
    Some(Address::from_slice(&code[EIP7702_DELEGATION_DESIGNATOR.len()..]))
}
