//! Turns a quote into the unsigned order that will be signed.

use swap_types::{Address, FeePolicy, Order, Quote, U256};

/// Builds orders from quotes under a fixed fee policy.
///
/// The sell amount of the order is always the amount the caller asked to sell,
/// never the net amount the service reports in the quote.
#[derive(Debug, Clone, Copy, Default)]
pub struct OrderBuilder {
	fee_policy: FeePolicy,
}

impl OrderBuilder {
	pub fn new(fee_policy: FeePolicy) -> Self {
		Self { fee_policy }
	}

	pub fn fee_policy(&self) -> FeePolicy {
		self.fee_policy
	}

	fn fee_amount(&self, quote: &Quote) -> U256 {
		match self.fee_policy {
			FeePolicy::Zero => U256::ZERO,
			FeePolicy::Quoted => quote.fee_amount,
		}
	}

	/// Amount of sell token the settlement may pull: sell amount plus signed fee.
	pub fn required_allowance(&self, quote: &Quote) -> U256 {
		quote
			.requested_sell_amount
			.saturating_add(self.fee_amount(quote))
	}

	pub fn build(&self, quote: &Quote, receiver: Address) -> Order {
		Order {
			sell_token: quote.sell_token,
			buy_token: quote.buy_token,
			receiver,
			sell_amount: quote.requested_sell_amount,
			buy_amount: quote.buy_amount,
			valid_to: quote.valid_to,
			app_data: quote.app_data_hash,
			fee_amount: self.fee_amount(quote),
			kind: quote.kind,
			partially_fillable: quote.partially_fillable,
			sell_token_balance: quote.sell_token_balance,
			buy_token_balance: quote.buy_token_balance,
		}
	}
}
