//! Event types emitted while a swap progresses.
//!
//! Events are published on the core event bus in lifecycle order:
//! quote, allowance decision, signature, submission, one status update per
//! poll, and finally either a terminal outcome or a timeout.

use crate::order::{MonitorOutcome, OrderStatus};
use crate::utils::serde_helpers::u256_decimal;
use alloy_primitives::U256;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SwapEvent {
	/// A quote was received from the order book.
	QuoteReceived {
		#[serde(with = "u256_decimal")]
		fee_amount: U256,
		#[serde(with = "u256_decimal")]
		buy_amount: U256,
		valid_to: u32,
	},
	/// The allowance check finished; `issued` is true if an approval was sent.
	AllowanceDecision { issued: bool },
	/// The order was signed.
	OrderSigned,
	/// The order book accepted the order.
	OrderSubmitted { order_id: String },
	/// One status poll completed.
	StatusUpdate { status: OrderStatus },
	/// Monitoring ended in a terminal, errored or interrupted state.
	MonitorTerminal { outcome: MonitorOutcome },
	/// Monitoring ended because the timeout elapsed.
	MonitorTimeout,
}
