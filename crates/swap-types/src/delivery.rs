//! Transaction delivery types for the swap client.
//!
//! This module defines types related to blockchain transaction submission
//! and monitoring, including transaction hashes and receipts.

use alloy_primitives::{Address, U256};

/// An unsigned transaction to be filled, signed and broadcast by the delivery layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
	/// Target chain.
	pub chain_id: u64,
	/// Recipient contract.
	pub to: Address,
	/// ABI-encoded call data.
	pub data: Vec<u8>,
	/// Native value attached to the call.
	pub value: U256,
	/// Explicit gas limit; filled by the provider when absent.
	pub gas_limit: Option<u64>,
	/// Legacy gas price in wei; filled by the provider when absent.
	pub gas_price: Option<u128>,
}

/// Blockchain transaction hash representation.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TransactionHash(pub Vec<u8>);

impl TransactionHash {
	/// Hex representation with `0x` prefix.
	pub fn to_hex(&self) -> String {
		format!("0x{}", hex::encode(&self.0))
	}
}

/// Transaction receipt containing execution details.
///
/// Provides information about a transaction after it has been included in a block,
/// including its success status and block number.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TransactionReceipt {
	/// The hash of the transaction.
	pub hash: TransactionHash,
	/// The block number where the transaction was included.
	pub block_number: u64,
	/// Whether the transaction executed successfully.
	pub success: bool,
}
