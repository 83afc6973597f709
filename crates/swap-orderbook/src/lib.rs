//! Order book client module for the swap client.
//!
//! The order book is the off-chain service that prices trades, accepts signed
//! orders and reports their lifecycle. This crate defines the interface used by
//! the core and an HTTP implementation of it.

use async_trait::async_trait;
use swap_types::{OrderDetails, Quote, QuoteRequest, SignedOrder};
use thiserror::Error;

/// Re-export implementations
pub mod implementations {
	pub mod http;
}

/// Errors returned by the order book.
#[derive(Debug, Error)]
pub enum OrderBookError {
	/// The service answered with a non-success status.
	#[error("Order book rejected request ({status}): {message}")]
	Rejected { status: u16, message: String },
	/// The requested order does not exist.
	#[error("Order not found: {0}")]
	NotFound(String),
	/// The request did not complete (connection, timeout, TLS).
	#[error("Transport error: {0}")]
	Transport(String),
	/// The response body could not be interpreted.
	#[error("Invalid response: {0}")]
	Decode(String),
}

impl OrderBookError {
	/// Returns true for failures that may succeed when retried.
	pub fn is_transient(&self) -> bool {
		match self {
			OrderBookError::Transport(_) => true,
			OrderBookError::Rejected { status, .. } => *status == 429 || *status >= 500,
			OrderBookError::NotFound(_) | OrderBookError::Decode(_) => false,
		}
	}
}

/// Trait defining the order book operations the swap lifecycle depends on.
#[async_trait]
pub trait OrderBookInterface: Send + Sync {
	/// Requests a sell-side quote.
	async fn get_quote(&self, request: &QuoteRequest) -> Result<Quote, OrderBookError>;

	/// Posts a signed order and returns the order uid assigned by the service.
	async fn submit_order(&self, order: &SignedOrder) -> Result<String, OrderBookError>;

	/// Fetches the current state of an order.
	async fn get_order(&self, uid: &str) -> Result<OrderDetails, OrderBookError>;
}

/// Thin service wrapper around the configured order book implementation.
pub struct OrderBookService {
	implementation: Box<dyn OrderBookInterface>,
}

impl OrderBookService {
	pub fn new(implementation: Box<dyn OrderBookInterface>) -> Self {
		Self { implementation }
	}

	pub async fn quote(&self, request: &QuoteRequest) -> Result<Quote, OrderBookError> {
		self.implementation.get_quote(request).await
	}

	pub async fn submit(&self, order: &SignedOrder) -> Result<String, OrderBookError> {
		self.implementation.submit_order(order).await
	}

	pub async fn order(&self, uid: &str) -> Result<OrderDetails, OrderBookError> {
		self.implementation.get_order(uid).await
	}
}
