//! Alloy-backed delivery over JSON-RPC.

use crate::erc20::IERC20;
use crate::{DeliveryError, DeliveryInterface};
use alloy_network::EthereumWallet;
use alloy_primitives::{Address, FixedBytes, U256};
use alloy_provider::{Provider, ProviderBuilder};
use alloy_rpc_types::TransactionRequest;
use alloy_signer_local::PrivateKeySigner;
use alloy_sol_types::SolCall;
use alloy_transport_http::Http;
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use swap_types::{
	with_0x_prefix, SecretString, Transaction as SwapTransaction, TransactionHash,
	TransactionReceipt,
};

/// Interval between receipt polls while waiting for confirmations.
const CONFIRMATION_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// A receipt read together with the chain height at the time of the read.
#[derive(Debug, Clone)]
struct ReceiptSnapshot {
	hash: TransactionHash,
	success: bool,
	/// Inclusion block; missing on some nodes for fresh receipts.
	block_number: Option<u64>,
	current_block: u64,
}

/// Returns the final receipt once the transaction reverted or is buried under
/// `confirmations` blocks, counting the inclusion block as the first one.
fn settled_receipt(snapshot: &ReceiptSnapshot, confirmations: u64) -> Option<TransactionReceipt> {
	let tx_block = snapshot.block_number.unwrap_or(snapshot.current_block);
	let depth = snapshot.current_block.saturating_sub(tx_block) + 1;

	(depth >= confirmations.max(1) || !snapshot.success).then(|| TransactionReceipt {
		hash: snapshot.hash.clone(),
		block_number: tx_block,
		success: snapshot.success,
	})
}

/// Polls `fetch` every [`CONFIRMATION_POLL_INTERVAL`] until the receipt settles
/// or `timeout` elapses.
async fn await_confirmations<F, Fut>(
	mut fetch: F,
	confirmations: u64,
	timeout: Duration,
) -> Result<TransactionReceipt, DeliveryError>
where
	F: FnMut() -> Fut,
	Fut: Future<Output = Result<Option<ReceiptSnapshot>, DeliveryError>>,
{
	let start_time = tokio::time::Instant::now();

	loop {
		if start_time.elapsed() > timeout {
			return Err(DeliveryError::Timeout(format!(
				"Timeout waiting for {} confirmations after {} seconds",
				confirmations.max(1),
				timeout.as_secs()
			)));
		}

		if let Some(snapshot) = fetch().await? {
			if let Some(receipt) = settled_receipt(&snapshot, confirmations) {
				return Ok(receipt);
			}
			tracing::debug!(
				current_block = snapshot.current_block,
				"Waiting for more confirmations"
			);
		}

		tokio::time::sleep(CONFIRMATION_POLL_INTERVAL).await;
	}
}

/// Alloy-based EVM delivery implementation.
///
/// Transactions are filled (nonce, gas, chain id) and signed by the provider's
/// wallet before broadcast.
pub struct AlloyDelivery {
	provider: Arc<dyn Provider<Http<reqwest::Client>> + Send + Sync>,
	chain_id: u64,
}

impl AlloyDelivery {
	pub fn new(rpc_url: &str, chain_id: u64, signer: PrivateKeySigner) -> Result<Self, DeliveryError> {
		let url = rpc_url
			.parse()
			.map_err(|e| DeliveryError::Network(format!("Invalid RPC URL {}: {}", rpc_url, e)))?;

		let wallet = EthereumWallet::from(signer);
		let provider = ProviderBuilder::new()
			.with_recommended_fillers()
			.wallet(wallet)
			.on_http(url);

		Ok(Self {
			provider: Arc::new(provider),
			chain_id,
		})
	}

	/// Reads the receipt and, once it exists, the current chain height.
	async fn read_receipt(
		&self,
		tx_hash: FixedBytes<32>,
	) -> Result<Option<ReceiptSnapshot>, DeliveryError> {
		let receipt = self
			.provider
			.get_transaction_receipt(tx_hash)
			.await
			.map_err(|e| DeliveryError::Network(format!("Failed to get receipt: {}", e)))?;
		let Some(receipt) = receipt else {
			return Ok(None);
		};

		Ok(Some(ReceiptSnapshot {
			hash: TransactionHash(receipt.transaction_hash.0.to_vec()),
			success: receipt.status(),
			block_number: receipt.block_number,
			current_block: self.get_block_number().await?,
		}))
	}
}

fn to_request(tx: SwapTransaction) -> TransactionRequest {
	let request = TransactionRequest {
		chain_id: Some(tx.chain_id),
		value: Some(tx.value),
		gas: tx.gas_limit,
		gas_price: tx.gas_price,
		..Default::default()
	};
	request.to(tx.to).input(tx.data.into())
}

#[async_trait]
impl DeliveryInterface for AlloyDelivery {
	async fn get_chain_id(&self) -> Result<u64, DeliveryError> {
		self.provider
			.get_chain_id()
			.await
			.map_err(|e| DeliveryError::Network(format!("Failed to get chain id: {}", e)))
	}

	async fn get_gas_price(&self) -> Result<u128, DeliveryError> {
		self.provider
			.get_gas_price()
			.await
			.map_err(|e| DeliveryError::Network(format!("Failed to get gas price: {}", e)))
	}

	async fn get_allowance(
		&self,
		token: Address,
		owner: Address,
		spender: Address,
	) -> Result<U256, DeliveryError> {
		let call_data = IERC20::allowanceCall { owner, spender }.abi_encode();
		let call_request = TransactionRequest::default()
			.to(token)
			.input(call_data.into());

		let call_result = self
			.provider
			.call(&call_request)
			.await
			.map_err(|e| DeliveryError::Network(format!("Failed to call allowance: {}", e)))?;

		let decoded = IERC20::allowanceCall::abi_decode_returns(&call_result, true)
			.map_err(|e| DeliveryError::Network(format!("Invalid allowance response: {}", e)))?;
		Ok(decoded._0)
	}

	async fn submit(&self, tx: SwapTransaction) -> Result<TransactionHash, DeliveryError> {
		if tx.chain_id != self.chain_id {
			return Err(DeliveryError::TransactionFailed(format!(
				"Transaction targets chain {} but provider is bound to chain {}",
				tx.chain_id, self.chain_id
			)));
		}

		let pending_tx = self
			.provider
			.send_transaction(to_request(tx))
			.await
			.map_err(|e| {
				DeliveryError::TransactionFailed(format!("Failed to send transaction: {}", e))
			})?;

		let tx_hash = *pending_tx.tx_hash();
		let hash_str = with_0x_prefix(&hex::encode(tx_hash.0));
		tracing::info!(tx_hash = %hash_str, chain_id = self.chain_id, "Submitted transaction");

		Ok(TransactionHash(tx_hash.0.to_vec()))
	}

	async fn wait_for_confirmation(
		&self,
		hash: &TransactionHash,
		confirmations: u64,
		timeout: Duration,
	) -> Result<TransactionReceipt, DeliveryError> {
		if hash.0.len() != 32 {
			return Err(DeliveryError::Network(format!(
				"Invalid transaction hash length {}",
				hash.0.len()
			)));
		}
		let tx_hash = FixedBytes::<32>::from_slice(&hash.0);

		tracing::info!(
			tx_hash = %hash.to_hex(),
			"Waiting for {} confirmations (timeout: {}s)",
			confirmations.max(1),
			timeout.as_secs()
		);

		await_confirmations(|| self.read_receipt(tx_hash), confirmations, timeout).await
	}

	async fn get_block_number(&self) -> Result<u64, DeliveryError> {
		self.provider
			.get_block_number()
			.await
			.map_err(|e| DeliveryError::Network(format!("Failed to get block number: {}", e)))
	}
}

/// Creates an HTTP delivery provider bound to `chain_id` and signing with `private_key`.
pub fn create_http_delivery(
	rpc_url: &str,
	chain_id: u64,
	private_key: &SecretString,
) -> Result<Box<dyn DeliveryInterface>, DeliveryError> {
	let signer: PrivateKeySigner = private_key.with_exposed(|key| {
		key.trim()
			.parse()
			.map_err(|_| DeliveryError::Network("Invalid private key format".to_string()))
	})?;

	Ok(Box::new(AlloyDelivery::new(rpc_url, chain_id, signer)?))
}
