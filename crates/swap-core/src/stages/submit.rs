//! Posts signed orders to the order book.

use std::sync::Arc;
use swap_orderbook::{OrderBookError, OrderBookService};
use swap_types::{truncate_id, SignedOrder};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SubmissionError {
	/// The order book refused the order (bad signature, expired, no balance).
	#[error("Order rejected ({status}): {message}")]
	Rejected { status: u16, message: String },
	#[error("Order submission failed: {0}")]
	Transport(String),
	#[error("Invalid submission response: {0}")]
	InvalidResponse(String),
}

impl From<OrderBookError> for SubmissionError {
	fn from(err: OrderBookError) -> Self {
		match err {
			OrderBookError::Rejected { status, message } => {
				SubmissionError::Rejected { status, message }
			},
			OrderBookError::Transport(msg) => SubmissionError::Transport(msg),
			OrderBookError::NotFound(msg) | OrderBookError::Decode(msg) => {
				SubmissionError::InvalidResponse(msg)
			},
		}
	}
}

pub struct OrderSubmitter {
	orderbook: Arc<OrderBookService>,
}

impl OrderSubmitter {
	pub fn new(orderbook: Arc<OrderBookService>) -> Self {
		Self { orderbook }
	}

	/// Submits the order and returns the uid assigned by the order book.
	pub async fn submit(&self, order: &SignedOrder) -> Result<String, SubmissionError> {
		let uid = self.orderbook.submit(order).await?;
		if uid.trim().is_empty() {
			return Err(SubmissionError::InvalidResponse(
				"order book returned an empty uid".into(),
			));
		}
		tracing::info!(order_id = %truncate_id(&uid), "Order submitted");
		Ok(uid)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::stages::build::OrderBuilder;
	use crate::stages::sign::OrderSigner;
	use crate::test_support::{account, far_future, quote_for, FakeBook, ANVIL_ADDRESS};
	use std::sync::atomic::Ordering;
	use swap_types::constants::{EMPTY_APP_DATA, GPV2_SETTLEMENT};
	use swap_types::U256;

	async fn signed() -> SignedOrder {
		let quote = quote_for(U256::from(10_000_000_000_000_000u64), far_future());
		let order = OrderBuilder::default().build(&quote, ANVIL_ADDRESS);
		OrderSigner::new(account(), GPV2_SETTLEMENT)
			.sign(order, 1, EMPTY_APP_DATA.to_string(), quote.quote_id)
			.await
			.unwrap()
	}

	#[tokio::test]
	async fn test_submit_returns_uid() {
		let (orderbook, book) = FakeBook::service(vec![]);
		let submitter = OrderSubmitter::new(orderbook);
		let order = signed().await;

		let uid = submitter.submit(&order).await.unwrap();

		assert!(!uid.is_empty());
		assert_eq!(book.submitted.lock().unwrap()[0], order);
	}

	#[tokio::test]
	async fn test_rejection_is_submission_error() {
		let (orderbook, book) = FakeBook::service(vec![]);
		book.reject_submission.store(true, Ordering::SeqCst);
		let submitter = OrderSubmitter::new(orderbook);

		let err = submitter.submit(&signed().await).await.unwrap_err();
		assert!(matches!(err, SubmissionError::Rejected { status: 400, .. }));
	}
}
