//! Order types for the swap lifecycle.
//!
//! An [`Order`] is derived from a [`crate::Quote`] once per run, frozen when it
//! is signed into a [`SignedOrder`], and afterwards only observed through the
//! [`OrderStatus`] reported by the order book.

use crate::quote::{OrderKind, TokenBalance};
use crate::utils::serde_helpers::{u256_decimal, u256_decimal_opt};
use crate::utils::unix_to_utc;
use alloy_primitives::{Address, B256, U256};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unsigned GPv2 order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
	pub sell_token: Address,
	pub buy_token: Address,
	pub receiver: Address,
	#[serde(with = "u256_decimal")]
	pub sell_amount: U256,
	#[serde(with = "u256_decimal")]
	pub buy_amount: U256,
	pub valid_to: u32,
	pub app_data: B256,
	#[serde(with = "u256_decimal")]
	pub fee_amount: U256,
	pub kind: OrderKind,
	pub partially_fillable: bool,
	pub sell_token_balance: TokenBalance,
	pub buy_token_balance: TokenBalance,
}

/// How the order's `feeAmount` is derived from the quote.
///
/// `Zero` signs the order with a zero fee regardless of the quote's estimate;
/// the protocol then takes its fee out of the surplus at settlement. `Quoted`
/// carries the quote's fee into the signed order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeePolicy {
	#[default]
	Zero,
	Quoted,
}

/// Method used to bind the owner to the order terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SigningScheme {
	/// Typed structured data signature over the order struct.
	Eip712,
}

impl SigningScheme {
	pub fn as_str(&self) -> &'static str {
		match self {
			SigningScheme::Eip712 => "eip712",
		}
	}
}

/// A signed order, ready for submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedOrder {
	pub order: Order,
	/// 65-byte `r || s || v` signature with `v` in {27, 28}.
	pub signature: Vec<u8>,
	pub signing_scheme: SigningScheme,
	/// Address that produced the signature.
	pub owner: Address,
	/// App data document as received with the quote.
	pub app_data: String,
	/// Identifier of the quote the order was built from.
	pub quote_id: Option<i64>,
}

impl SignedOrder {
	pub fn signature_hex(&self) -> String {
		format!("0x{}", hex::encode(&self.signature))
	}
}

/// Lifecycle status of a submitted order as reported by the order book.
///
/// Transitions only forward from `Pending` to a terminal value. The client never
/// mutates it; it only observes it by polling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
	Pending,
	Fulfilled,
	Cancelled,
	Expired,
	/// A status string this client does not recognise.
	Unknown(String),
}

impl OrderStatus {
	/// Maps the order book's status string.
	pub fn from_wire(status: &str) -> Self {
		match status {
			"open" | "presignaturePending" | "pending" => OrderStatus::Pending,
			"fulfilled" => OrderStatus::Fulfilled,
			"cancelled" => OrderStatus::Cancelled,
			"expired" => OrderStatus::Expired,
			other => OrderStatus::Unknown(other.to_string()),
		}
	}
}

impl fmt::Display for OrderStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			OrderStatus::Pending => write!(f, "pending"),
			OrderStatus::Fulfilled => write!(f, "fulfilled"),
			OrderStatus::Cancelled => write!(f, "cancelled"),
			OrderStatus::Expired => write!(f, "expired"),
			OrderStatus::Unknown(raw) => write!(f, "unknown({})", raw),
		}
	}
}

/// Final state of the order monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MonitorOutcome {
	Fulfilled,
	Cancelled,
	Expired,
	/// The timeout elapsed and the final fetch still did not report a terminal status.
	TimedOut,
	/// A status fetch failed and monitoring stopped.
	Errored,
	/// Monitoring was stopped by the local cancellation signal.
	Interrupted,
}

impl MonitorOutcome {
	/// Terminal outcome matching a terminal order status.
	pub fn from_status(status: &OrderStatus) -> Option<Self> {
		match status {
			OrderStatus::Fulfilled => Some(MonitorOutcome::Fulfilled),
			OrderStatus::Cancelled => Some(MonitorOutcome::Cancelled),
			OrderStatus::Expired => Some(MonitorOutcome::Expired),
			OrderStatus::Pending | OrderStatus::Unknown(_) => None,
		}
	}
}

impl fmt::Display for MonitorOutcome {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let s = match self {
			MonitorOutcome::Fulfilled => "fulfilled",
			MonitorOutcome::Cancelled => "cancelled",
			MonitorOutcome::Expired => "expired",
			MonitorOutcome::TimedOut => "timed out",
			MonitorOutcome::Errored => "errored",
			MonitorOutcome::Interrupted => "interrupted",
		};
		write!(f, "{}", s)
	}
}

/// Order as reported by the status endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderDetails {
	pub uid: String,
	pub status: OrderStatus,
	pub creation_date: Option<String>,
	pub sell_token: Option<Address>,
	pub buy_token: Option<Address>,
	#[serde(with = "u256_decimal_opt", default)]
	pub sell_amount: Option<U256>,
	#[serde(with = "u256_decimal_opt", default)]
	pub buy_amount: Option<U256>,
	#[serde(with = "u256_decimal_opt", default)]
	pub fee_amount: Option<U256>,
	pub valid_to: Option<u32>,
	#[serde(with = "u256_decimal_opt", default)]
	pub executed_sell_amount: Option<U256>,
	#[serde(with = "u256_decimal_opt", default)]
	pub executed_buy_amount: Option<U256>,
	#[serde(with = "u256_decimal_opt", default)]
	pub executed_fee_amount: Option<U256>,
	/// Settlement transaction, once the order has been executed.
	pub tx_hash: Option<String>,
}

impl OrderDetails {
	/// `valid_to` as a UTC timestamp, when the order book reported one.
	pub fn valid_until(&self) -> Option<DateTime<Utc>> {
		self.valid_to.and_then(unix_to_utc)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_status_from_wire() {
		assert_eq!(OrderStatus::from_wire("open"), OrderStatus::Pending);
		assert_eq!(
			OrderStatus::from_wire("presignaturePending"),
			OrderStatus::Pending
		);
		assert_eq!(OrderStatus::from_wire("fulfilled"), OrderStatus::Fulfilled);
		assert_eq!(OrderStatus::from_wire("cancelled"), OrderStatus::Cancelled);
		assert_eq!(OrderStatus::from_wire("expired"), OrderStatus::Expired);
		assert_eq!(
			OrderStatus::from_wire("weird"),
			OrderStatus::Unknown("weird".to_string())
		);
	}

	#[test]
	fn test_terminal_statuses_map_to_outcomes() {
		assert_eq!(
			MonitorOutcome::from_status(&OrderStatus::Fulfilled),
			Some(MonitorOutcome::Fulfilled)
		);
		assert_eq!(
			MonitorOutcome::from_status(&OrderStatus::Expired),
			Some(MonitorOutcome::Expired)
		);
		assert_eq!(MonitorOutcome::from_status(&OrderStatus::Pending), None);
		assert_eq!(
			MonitorOutcome::from_status(&OrderStatus::Unknown("x".into())),
			None
		);
	}

	#[test]
	fn test_details_valid_until() {
		let details: OrderDetails = serde_json::from_value(serde_json::json!({
			"uid": "0x01",
			"status": "Pending",
			"creation_date": null,
			"sell_token": null,
			"buy_token": null,
			"valid_to": 1700000000,
			"tx_hash": null
		}))
		.unwrap();
		assert_eq!(
			details.valid_until().map(|at| at.timestamp()),
			Some(1_700_000_000)
		);
		assert_eq!(
			OrderDetails {
				valid_to: None,
				..details
			}
			.valid_until(),
			None
		);
	}
}
