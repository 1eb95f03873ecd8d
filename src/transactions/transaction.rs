use alloy::{primitives::B256, rpc::types::TransactionReceipt};
use serde::{Deserialize, Serialize};

/// A transaction that was included with a success status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmedTransaction {
    /// Transaction hash.
    pub tx_hash: B256,
    /// Block the transaction was included in.
    pub block_number: u64,
    /// Gas used by the transaction.
    pub gas_used: u64,
}

impl From<&TransactionReceipt> for ConfirmedTransaction {
    fn from(receipt: &TransactionReceipt) -> Self {
        Self {
            tx_hash: receipt.transaction_hash,
            block_number: receipt.block_number.unwrap_or_default(),
            gas_used: receipt.gas_used,
        }
    }
}
