//! ERC-20 allowance management.
//!
//! The vault relayer pulls sell tokens from the owner during settlement, so it
//! needs a sufficient allowance before the order is submitted. When it is
//! missing, the manager approves `U256::MAX` so later swaps of the same token
//! need no further approval.

use alloy_sol_types::SolCall;
use std::sync::Arc;
use swap_delivery::erc20::IERC20;
use swap_delivery::{DeliveryError, DeliveryService};
use swap_types::constants::APPROVAL_GAS_LIMIT;
use swap_types::{Address, AllowanceRecord, Transaction, U256};
use thiserror::Error;

/// Failure of the allowance check or of the approval transaction.
#[derive(Debug, Error)]
pub enum AllowanceError {
	#[error("Failed to read allowance: {0}")]
	Read(String),
	#[error("Failed to read gas price: {0}")]
	GasPrice(String),
	#[error("Approval transaction rejected: {0}")]
	Rejected(String),
	#[error("Approval transaction {tx_hash} reverted")]
	Reverted { tx_hash: String },
	#[error("Approval not confirmed: {0}")]
	ConfirmationTimeout(String),
	#[error("Failed to confirm approval: {0}")]
	Confirmation(String),
}

pub struct AllowanceManager {
	delivery: Arc<DeliveryService>,
	chain_id: u64,
}

impl AllowanceManager {
	pub fn new(delivery: Arc<DeliveryService>, chain_id: u64) -> Self {
		Self { delivery, chain_id }
	}

	/// Reads the current allowance. Never cached.
	pub async fn read(
		&self,
		token: Address,
		owner: Address,
		spender: Address,
	) -> Result<AllowanceRecord, AllowanceError> {
		let current_amount = self
			.delivery
			.allowance(token, owner, spender)
			.await
			.map_err(|e| AllowanceError::Read(e.to_string()))?;

		Ok(AllowanceRecord {
			token,
			owner,
			spender,
			current_amount,
		})
	}

	/// Makes sure `spender` may pull at least `required` of `token` from `owner`.
	///
	/// Returns `true` if an approval transaction was issued and confirmed,
	/// `false` if the existing allowance already covered `required`.
	pub async fn ensure_allowance(
		&self,
		token: Address,
		owner: Address,
		spender: Address,
		required: U256,
	) -> Result<bool, AllowanceError> {
		let record = self.read(token, owner, spender).await?;
		tracing::info!(
			token = %token,
			spender = %spender,
			current = %record.current_amount,
			required = %required,
			"Checked allowance"
		);

		if record.covers(required) {
			tracing::info!("Token allowance is sufficient");
			return Ok(false);
		}

		let gas_price = self
			.delivery
			.gas_price()
			.await
			.map_err(|e| AllowanceError::GasPrice(e.to_string()))?;

		let tx = Transaction {
			chain_id: self.chain_id,
			to: token,
			data: IERC20::approveCall {
				spender,
				amount: U256::MAX,
			}
			.abi_encode(),
			value: U256::ZERO,
			gas_limit: Some(APPROVAL_GAS_LIMIT),
			gas_price: Some(gas_price),
		};

		let tx_hash = self
			.delivery
			.deliver(tx)
			.await
			.map_err(|e| AllowanceError::Rejected(e.to_string()))?;
		tracing::info!(tx_hash = %tx_hash.to_hex(), "Approval transaction sent");

		let receipt = self
			.delivery
			.confirm_with_default(&tx_hash)
			.await
			.map_err(|e| match e {
				DeliveryError::Timeout(msg) => AllowanceError::ConfirmationTimeout(msg),
				other => AllowanceError::Confirmation(other.to_string()),
			})?;

		if !receipt.success {
			return Err(AllowanceError::Reverted {
				tx_hash: tx_hash.to_hex(),
			});
		}

		tracing::info!(
			tx_hash = %tx_hash.to_hex(),
			block = receipt.block_number,
			"Approval confirmed"
		);
		Ok(true)
	}
}
