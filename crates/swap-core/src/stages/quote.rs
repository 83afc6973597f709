//! Quote acquisition with a network pre-flight check.

use std::sync::Arc;
use swap_delivery::DeliveryService;
use swap_orderbook::{OrderBookError, OrderBookService};
use swap_types::{Address, OrderKind, Quote, QuoteRequest, U256};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum QuoteError {
	/// The RPC endpoint serves a different chain than the order book.
	#[error("Connected to chain {actual}, expected chain {expected}")]
	NetworkMismatch { expected: u64, actual: u64 },
	#[error("Failed to read chain id: {0}")]
	ChainId(String),
	#[error("Quote rejected: {0}")]
	Rejected(String),
	#[error("Quote request failed: {0}")]
	Service(String),
}

pub struct QuoteService {
	delivery: Arc<DeliveryService>,
	orderbook: Arc<OrderBookService>,
	expected_chain_id: u64,
}

impl QuoteService {
	pub fn new(
		delivery: Arc<DeliveryService>,
		orderbook: Arc<OrderBookService>,
		expected_chain_id: u64,
	) -> Self {
		Self {
			delivery,
			orderbook,
			expected_chain_id,
		}
	}

	/// Verifies the RPC endpoint is on the expected chain.
	pub async fn check_network(&self) -> Result<u64, QuoteError> {
		let actual = self
			.delivery
			.chain_id()
			.await
			.map_err(|e| QuoteError::ChainId(e.to_string()))?;
		tracing::info!(chain_id = actual, "Connected to network");

		if actual != self.expected_chain_id {
			return Err(QuoteError::NetworkMismatch {
				expected: self.expected_chain_id,
				actual,
			});
		}
		Ok(actual)
	}

	/// Requests a sell quote for exactly `sell_amount`.
	///
	/// Performs the network check first and makes no other call if it fails.
	pub async fn get_quote(
		&self,
		sell_token: Address,
		buy_token: Address,
		owner: Address,
		receiver: Address,
		sell_amount: U256,
	) -> Result<Quote, QuoteError> {
		self.check_network().await?;

		if sell_amount.is_zero() {
			return Err(QuoteError::Rejected("sell amount must be nonzero".into()));
		}

		let request = QuoteRequest {
			sell_token,
			buy_token,
			from: owner,
			receiver,
			sell_amount_before_fee: sell_amount,
			kind: OrderKind::Sell,
		};

		let mut quote = self.orderbook.quote(&request).await.map_err(|e| match e {
			OrderBookError::Rejected { status, message } if status < 500 => {
				QuoteError::Rejected(message)
			},
			other => QuoteError::Service(other.to_string()),
		})?;
		quote.requested_sell_amount = sell_amount;

		tracing::info!(
			fee_amount = %quote.fee_amount,
			buy_amount = %quote.buy_amount,
			valid_to = quote.valid_to,
			"Quote received"
		);
		Ok(quote)
	}
}
