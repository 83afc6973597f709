//! Common types module for the swap client.
//!
//! This module defines the data model shared by every stage of the order
//! lifecycle: quotes, orders, signatures, order status, allowance records,
//! on-chain transactions and the events emitted while a swap runs.

/// Allowance types for ERC-20 spending permissions.
pub mod allowance;
/// Named protocol constants (addresses, chain ids, gas limits).
pub mod constants;
/// Transaction delivery types for blockchain interactions.
pub mod delivery;
/// Event types published while a swap progresses.
pub mod events;
/// Order types: unsigned orders, signed orders and lifecycle status.
pub mod order;
/// Quote request and response types.
pub mod quote;
/// Secure string type for private keys.
pub mod secret_string;
/// Utility functions for formatting and serialization.
pub mod utils;

pub use allowance::AllowanceRecord;
pub use alloy_primitives::{Address, B256, U256};
pub use delivery::{Transaction, TransactionHash, TransactionReceipt};
pub use events::SwapEvent;
pub use order::{
	FeePolicy, MonitorOutcome, Order, OrderDetails, OrderStatus, SignedOrder, SigningScheme,
};
pub use quote::{OrderKind, Quote, QuoteRequest, TokenBalance};
pub use secret_string::SecretString;
pub use utils::{current_timestamp, format_valid_to, truncate_id, unix_to_utc, with_0x_prefix};
