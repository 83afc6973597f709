//! Account management module for the swap client.
//!
//! The account is the wallet of the run: an address plus a signing capability.
//! It is constructed once from configuration and read-only afterwards. The
//! order signer uses it for EIP-712 hash signing; transaction signing lives in
//! the delivery layer's own wallet.

use alloy_primitives::{PrimitiveSignature, B256};
use async_trait::async_trait;
use swap_types::Address;
use thiserror::Error;

/// Re-export implementations
pub mod implementations {
	pub mod local;
}

/// Errors that can occur during account operations.
#[derive(Debug, Error)]
pub enum AccountError {
	/// Error that occurs when signing operations fail.
	#[error("Signing failed: {0}")]
	SigningFailed(String),
	/// Error that occurs when a cryptographic key is invalid or malformed.
	#[error("Invalid key: {0}")]
	InvalidKey(String),
}

/// Trait defining the interface for account implementations.
#[async_trait]
pub trait AccountInterface: Send + Sync {
	/// Retrieves the address associated with this account.
	async fn address(&self) -> Result<Address, AccountError>;

	/// Signs a 32-byte digest, e.g. an EIP-712 signing hash.
	///
	/// Implementations must be deterministic: the same digest and key always
	/// produce the same signature.
	async fn sign_hash(&self, hash: &B256) -> Result<PrimitiveSignature, AccountError>;
}

/// Service that manages account operations.
pub struct AccountService {
	implementation: Box<dyn AccountInterface>,
}

impl AccountService {
	pub fn new(implementation: Box<dyn AccountInterface>) -> Self {
		Self { implementation }
	}

	/// Retrieves the address associated with the managed account.
	pub async fn get_address(&self) -> Result<Address, AccountError> {
		self.implementation.address().await
	}

	/// Signs a digest with the managed account.
	pub async fn sign_hash(&self, hash: &B256) -> Result<PrimitiveSignature, AccountError> {
		self.implementation.sign_hash(hash).await
	}
}
