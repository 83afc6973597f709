//! ERC-20 allowance snapshot.

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};

/// Allowance granted by `owner` to `spender` on `token`, as read from chain.
///
/// Records are read fresh on every check and never cached across runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllowanceRecord {
	pub token: Address,
	pub owner: Address,
	pub spender: Address,
	pub current_amount: U256,
}

impl AllowanceRecord {
	/// Returns true if the allowance covers `required`.
	pub fn covers(&self, required: U256) -> bool {
		self.current_amount >= required
	}
}
