//! Quote types exchanged with the order book.

use crate::utils::serde_helpers::u256_decimal;
use crate::utils::unix_to_utc;
use alloy_primitives::{Address, B256, U256};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Side of the trade that is fixed by the order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderKind {
	/// The sell amount is exact, the buy amount is a lower bound.
	Sell,
	/// The buy amount is exact, the sell amount is an upper bound.
	Buy,
}

impl OrderKind {
	pub fn as_str(&self) -> &'static str {
		match self {
			OrderKind::Sell => "sell",
			OrderKind::Buy => "buy",
		}
	}
}

/// Where sell tokens are taken from and buy tokens are delivered to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenBalance {
	#[default]
	Erc20,
	External,
	Internal,
}

impl TokenBalance {
	pub fn as_str(&self) -> &'static str {
		match self {
			TokenBalance::Erc20 => "erc20",
			TokenBalance::External => "external",
			TokenBalance::Internal => "internal",
		}
	}
}

/// Parameters of a sell-side price quote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteRequest {
	pub sell_token: Address,
	pub buy_token: Address,
	/// Owner of the sell tokens and signer of the resulting order.
	pub from: Address,
	pub receiver: Address,
	/// Amount the caller wants to sell. This exact value is reused for the
	/// allowance check and for the signed order.
	#[serde(with = "u256_decimal")]
	pub sell_amount_before_fee: U256,
	pub kind: OrderKind,
}

/// A price quote returned by the order book.
///
/// Immutable once received. `valid_to` must still be in the future when the
/// derived order is signed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
	pub sell_token: Address,
	pub buy_token: Address,
	pub receiver: Option<Address>,
	/// Sell amount as reported by the service (net of its fee estimate).
	#[serde(with = "u256_decimal")]
	pub sell_amount: U256,
	#[serde(with = "u256_decimal")]
	pub buy_amount: U256,
	#[serde(with = "u256_decimal")]
	pub fee_amount: U256,
	/// Unix timestamp (seconds) after which the quote can no longer be used.
	pub valid_to: u32,
	/// App data as received: either a bytes32 hex string or a full JSON document.
	pub app_data: String,
	/// The bytes32 that is signed as `appData`.
	pub app_data_hash: B256,
	pub kind: OrderKind,
	pub partially_fillable: bool,
	pub sell_token_balance: TokenBalance,
	pub buy_token_balance: TokenBalance,
	pub from: Address,
	/// Service-side identifier of the quote, echoed back on submission.
	pub quote_id: Option<i64>,
	/// The amount the caller asked to sell.
	#[serde(with = "u256_decimal")]
	pub requested_sell_amount: U256,
}

impl Quote {
	/// `valid_to` as a UTC timestamp.
	pub fn valid_until(&self) -> Option<DateTime<Utc>> {
		unix_to_utc(self.valid_to)
	}

	/// Returns true if the quote is no longer valid at `now` (unix seconds).
	pub fn is_expired_at(&self, now: u64) -> bool {
		u64::from(self.valid_to) <= now
	}
}
