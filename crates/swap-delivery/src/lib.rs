//! Transaction delivery module for the swap client.
//!
//! This module handles the on-chain side of a swap: reading chain state and
//! ERC-20 allowances, submitting the approval transaction and waiting for it to
//! be confirmed. Everything else in the swap lifecycle goes through the order
//! book instead of the chain.

use async_trait::async_trait;
use std::time::Duration;
use swap_types::{Address, Transaction, TransactionHash, TransactionReceipt, U256};
use thiserror::Error;

/// Re-export implementations
pub mod implementations {
	pub mod evm {
		pub mod alloy;
	}
}

/// Minimal ERC-20 ABI used for allowance reads and approvals.
pub mod erc20 {
	alloy_sol_types::sol! {
		interface IERC20 {
			function allowance(address owner, address spender) external view returns (uint256);
			function approve(address spender, uint256 amount) external returns (bool);
		}
	}
}

/// Errors that can occur during transaction delivery operations.
#[derive(Debug, Error)]
pub enum DeliveryError {
	/// Error that occurs during network communication.
	#[error("Network error: {0}")]
	Network(String),
	/// Error that occurs when a transaction execution fails.
	#[error("Transaction failed: {0}")]
	TransactionFailed(String),
	/// The transaction did not reach the requested confirmations in time.
	#[error("Timeout: {0}")]
	Timeout(String),
}

/// Trait defining the interface for transaction delivery providers.
///
/// Implementations sign transactions with the wallet key they were created
/// with. Tests substitute in-memory fakes.
#[async_trait]
pub trait DeliveryInterface: Send + Sync {
	/// Returns the chain id reported by the RPC endpoint.
	async fn get_chain_id(&self) -> Result<u64, DeliveryError>;

	/// Gets the current gas price in wei.
	async fn get_gas_price(&self) -> Result<u128, DeliveryError>;

	/// Reads `allowance(owner, spender)` on the given ERC-20 token.
	async fn get_allowance(
		&self,
		token: Address,
		owner: Address,
		spender: Address,
	) -> Result<U256, DeliveryError>;

	/// Signs and broadcasts a transaction, returning its hash.
	async fn submit(&self, tx: Transaction) -> Result<TransactionHash, DeliveryError>;

	/// Waits until the transaction is included and has the requested number of
	/// confirmations, or `timeout` elapses.
	///
	/// A reverted transaction is still returned as a receipt with
	/// `success == false`; judging it is up to the caller.
	async fn wait_for_confirmation(
		&self,
		hash: &TransactionHash,
		confirmations: u64,
		timeout: Duration,
	) -> Result<TransactionReceipt, DeliveryError>;

	/// Gets the latest block number.
	async fn get_block_number(&self) -> Result<u64, DeliveryError>;
}

/// Service that fronts the delivery provider for the configured network.
///
/// Holds the confirmation policy so callers only say what they want delivered.
pub struct DeliveryService {
	provider: Box<dyn DeliveryInterface>,
	/// Number of confirmations required before a transaction counts as final.
	min_confirmations: u64,
	/// Upper bound on the time spent waiting for those confirmations.
	confirmation_timeout: Duration,
}

impl DeliveryService {
	pub fn new(
		provider: Box<dyn DeliveryInterface>,
		min_confirmations: u64,
		confirmation_timeout: Duration,
	) -> Self {
		Self {
			provider,
			min_confirmations,
			confirmation_timeout,
		}
	}

	pub async fn chain_id(&self) -> Result<u64, DeliveryError> {
		self.provider.get_chain_id().await
	}

	pub async fn gas_price(&self) -> Result<u128, DeliveryError> {
		self.provider.get_gas_price().await
	}

	pub async fn allowance(
		&self,
		token: Address,
		owner: Address,
		spender: Address,
	) -> Result<U256, DeliveryError> {
		self.provider.get_allowance(token, owner, spender).await
	}

	/// Submits a transaction to the network.
	pub async fn deliver(&self, tx: Transaction) -> Result<TransactionHash, DeliveryError> {
		self.provider.submit(tx).await
	}

	/// Waits for the configured number of confirmations.
	pub async fn confirm_with_default(
		&self,
		hash: &TransactionHash,
	) -> Result<TransactionReceipt, DeliveryError> {
		self.provider
			.wait_for_confirmation(hash, self.min_confirmations, self.confirmation_timeout)
			.await
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use alloy_sol_types::SolCall;
	use std::sync::atomic::{AtomicU64, Ordering};
	use std::sync::Arc;

	struct RecordingDelivery {
		confirmations_requested: Arc<AtomicU64>,
	}

	#[async_trait]
	impl DeliveryInterface for RecordingDelivery {
		async fn get_chain_id(&self) -> Result<u64, DeliveryError> {
			Ok(1)
		}

		async fn get_gas_price(&self) -> Result<u128, DeliveryError> {
			Ok(1_000_000_000)
		}

		async fn get_allowance(
			&self,
			_token: Address,
			_owner: Address,
			_spender: Address,
		) -> Result<U256, DeliveryError> {
			Ok(U256::ZERO)
		}

		async fn submit(&self, _tx: Transaction) -> Result<TransactionHash, DeliveryError> {
			Ok(TransactionHash(vec![0xab; 32]))
		}

		async fn wait_for_confirmation(
			&self,
			hash: &TransactionHash,
			confirmations: u64,
			_timeout: Duration,
		) -> Result<TransactionReceipt, DeliveryError> {
			self.confirmations_requested
				.store(confirmations, Ordering::SeqCst);
			Ok(TransactionReceipt {
				hash: hash.clone(),
				block_number: 10,
				success: true,
			})
		}

		async fn get_block_number(&self) -> Result<u64, DeliveryError> {
			Ok(10)
		}
	}

	#[tokio::test]
	async fn test_confirm_uses_configured_confirmations() {
		let requested = Arc::new(AtomicU64::new(0));
		let service = DeliveryService::new(
			Box::new(RecordingDelivery {
				confirmations_requested: requested.clone(),
			}),
			3,
			Duration::from_secs(60),
		);

		let hash = service
			.deliver(Transaction {
				chain_id: 1,
				to: Address::ZERO,
				data: vec![],
				value: U256::ZERO,
				gas_limit: None,
				gas_price: None,
			})
			.await
			.unwrap();
		let receipt = service.confirm_with_default(&hash).await.unwrap();

		assert!(receipt.success);
		assert_eq!(requested.load(Ordering::SeqCst), 3);
	}

	#[test]
	fn test_approve_calldata_layout() {
		let spender = Address::repeat_byte(0x11);
		let data = erc20::IERC20::approveCall {
			spender,
			amount: U256::MAX,
		}
		.abi_encode();

		assert_eq!(data.len(), 4 + 32 + 32);
		assert_eq!(&data[..4], &[0x09, 0x5e, 0xa7, 0xb3]);
		assert_eq!(&data[16..36], spender.as_slice());
		assert!(data[36..].iter().all(|b| *b == 0xff));
	}

	#[test]
	fn test_allowance_calldata_selector() {
		let data = erc20::IERC20::allowanceCall {
			owner: Address::ZERO,
			spender: Address::ZERO,
		}
		.abi_encode();
		assert_eq!(&data[..4], &[0xdd, 0x62, 0xed, 0x3e]);
	}
}
