//! EIP-712 order signing.
//!
//! Orders are hashed as the GPv2 `Order` struct in the protocol's signing
//! domain and signed with the account key. No network access is involved, and
//! identical inputs always produce identical signatures.

use alloy_primitives::{PrimitiveSignature, B256, U256};
use alloy_sol_types::{Eip712Domain, SolStruct};
use std::borrow::Cow;
use std::sync::Arc;
use swap_account::{AccountError, AccountService};
use swap_types::constants::{DOMAIN_NAME, DOMAIN_VERSION};
use swap_types::{Address, Order, SignedOrder, SigningScheme};
use thiserror::Error;

mod gpv2 {
	alloy_sol_types::sol! {
		#[derive(Debug)]
		struct Order {
			address sellToken;
			address buyToken;
			address receiver;
			uint256 sellAmount;
			uint256 buyAmount;
			uint32 validTo;
			bytes32 appData;
			uint256 feeAmount;
			string kind;
			bool partiallyFillable;
			string sellTokenBalance;
			string buyTokenBalance;
		}
	}
}

#[derive(Debug, Error)]
pub enum SigningError {
	#[error("Account error: {0}")]
	Account(#[from] AccountError),
}

impl From<&Order> for gpv2::Order {
	fn from(order: &Order) -> Self {
		Self {
			sellToken: order.sell_token,
			buyToken: order.buy_token,
			receiver: order.receiver,
			sellAmount: order.sell_amount,
			buyAmount: order.buy_amount,
			validTo: order.valid_to,
			appData: order.app_data,
			feeAmount: order.fee_amount,
			kind: order.kind.as_str().to_string(),
			partiallyFillable: order.partially_fillable,
			sellTokenBalance: order.sell_token_balance.as_str().to_string(),
			buyTokenBalance: order.buy_token_balance.as_str().to_string(),
		}
	}
}

/// Signing domain of the settlement contract on `chain_id`.
pub fn domain(chain_id: u64, settlement: Address) -> Eip712Domain {
	Eip712Domain::new(
		Some(Cow::Borrowed(DOMAIN_NAME)),
		Some(Cow::Borrowed(DOMAIN_VERSION)),
		Some(U256::from(chain_id)),
		Some(settlement),
		None,
	)
}

/// EIP-712 digest of `order` in `domain`.
pub fn order_digest(order: &Order, domain: &Eip712Domain) -> B256 {
	gpv2::Order::from(order).eip712_signing_hash(domain)
}

/// 65-byte `r || s || v` encoding with `v` in {27, 28}.
fn signature_bytes(signature: &PrimitiveSignature) -> Vec<u8> {
	let mut bytes = Vec::with_capacity(65);
	bytes.extend_from_slice(&signature.r().to_be_bytes::<32>());
	bytes.extend_from_slice(&signature.s().to_be_bytes::<32>());
	bytes.push(27 + u8::from(signature.v()));
	bytes
}

pub struct OrderSigner {
	account: Arc<AccountService>,
	settlement: Address,
}

impl OrderSigner {
	pub fn new(account: Arc<AccountService>, settlement: Address) -> Self {
		Self {
			account,
			settlement,
		}
	}

	/// Signs `order` for `chain_id`.
	///
	/// `app_data` is the document the order's app data hash was derived from and
	/// `quote_id` the quote the order was built from; both are carried along for
	/// submission.
	pub async fn sign(
		&self,
		order: Order,
		chain_id: u64,
		app_data: String,
		quote_id: Option<i64>,
	) -> Result<SignedOrder, SigningError> {
		let digest = order_digest(&order, &domain(chain_id, self.settlement));
		let signature = self.account.sign_hash(&digest).await?;
		let owner = self.account.get_address().await?;

		tracing::debug!(digest = %digest, owner = %owner, "Signed order");

		Ok(SignedOrder {
			order,
			signature: signature_bytes(&signature),
			signing_scheme: SigningScheme::Eip712,
			owner,
			app_data,
			quote_id,
		})
	}
}
