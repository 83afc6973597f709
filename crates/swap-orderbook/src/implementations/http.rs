//! HTTP implementation of the order book interface.
//!
//! Speaks the GPv2 order book REST API:
//!
//! - `POST {base}/api/v1/quote`
//! - `POST {base}/api/v1/orders`
//! - `GET  {base}/api/v1/orders/{uid}`
//!
//! Amounts travel as decimal strings and field names are camelCase.

use crate::{OrderBookError, OrderBookInterface};
use alloy_primitives::{keccak256, Address, B256};
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;
use swap_types::utils::serde_helpers::{u256_decimal, u256_decimal_opt};
use swap_types::{
	truncate_id, OrderDetails, OrderKind, OrderStatus, Quote, QuoteRequest, SignedOrder,
	TokenBalance, U256,
};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QuoteRequestBody {
	sell_token: Address,
	buy_token: Address,
	from: Address,
	receiver: Address,
	#[serde(with = "u256_decimal")]
	sell_amount_before_fee: U256,
	kind: OrderKind,
}

impl From<&QuoteRequest> for QuoteRequestBody {
	fn from(request: &QuoteRequest) -> Self {
		Self {
			sell_token: request.sell_token,
			buy_token: request.buy_token,
			from: request.from,
			receiver: request.receiver,
			sell_amount_before_fee: request.sell_amount_before_fee,
			kind: request.kind,
		}
	}
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteResponseBody {
	quote: QuoteBody,
	from: Address,
	#[serde(default)]
	id: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteBody {
	sell_token: Address,
	buy_token: Address,
	#[serde(default)]
	receiver: Option<Address>,
	#[serde(with = "u256_decimal")]
	sell_amount: U256,
	#[serde(with = "u256_decimal")]
	buy_amount: U256,
	valid_to: u32,
	app_data: String,
	#[serde(default)]
	app_data_hash: Option<B256>,
	#[serde(with = "u256_decimal")]
	fee_amount: U256,
	kind: OrderKind,
	#[serde(default)]
	partially_fillable: bool,
	#[serde(default)]
	sell_token_balance: TokenBalance,
	#[serde(default)]
	buy_token_balance: TokenBalance,
}

impl QuoteResponseBody {
	fn into_quote(self, requested_sell_amount: U256) -> Quote {
		let app_data_hash = app_data_hash(&self.quote.app_data, self.quote.app_data_hash);
		Quote {
			sell_token: self.quote.sell_token,
			buy_token: self.quote.buy_token,
			receiver: self.quote.receiver,
			sell_amount: self.quote.sell_amount,
			buy_amount: self.quote.buy_amount,
			fee_amount: self.quote.fee_amount,
			valid_to: self.quote.valid_to,
			app_data: self.quote.app_data,
			app_data_hash,
			kind: self.quote.kind,
			partially_fillable: self.quote.partially_fillable,
			sell_token_balance: self.quote.sell_token_balance,
			buy_token_balance: self.quote.buy_token_balance,
			from: self.from,
			quote_id: self.id,
			requested_sell_amount,
		}
	}
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OrderCreationBody {
	sell_token: Address,
	buy_token: Address,
	receiver: Address,
	#[serde(with = "u256_decimal")]
	sell_amount: U256,
	#[serde(with = "u256_decimal")]
	buy_amount: U256,
	valid_to: u32,
	app_data: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	app_data_hash: Option<B256>,
	#[serde(with = "u256_decimal")]
	fee_amount: U256,
	kind: OrderKind,
	partially_fillable: bool,
	sell_token_balance: TokenBalance,
	buy_token_balance: TokenBalance,
	signing_scheme: &'static str,
	signature: String,
	from: Address,
	#[serde(skip_serializing_if = "Option::is_none")]
	quote_id: Option<i64>,
}

impl From<&SignedOrder> for OrderCreationBody {
	fn from(signed: &SignedOrder) -> Self {
		let order = &signed.order;
		// A full app data document is sent alongside the hash that was signed.
		let app_data_hash = parse_bytes32(&signed.app_data)
			.is_none()
			.then_some(order.app_data);
		Self {
			sell_token: order.sell_token,
			buy_token: order.buy_token,
			receiver: order.receiver,
			sell_amount: order.sell_amount,
			buy_amount: order.buy_amount,
			valid_to: order.valid_to,
			app_data: signed.app_data.clone(),
			app_data_hash,
			fee_amount: order.fee_amount,
			kind: order.kind,
			partially_fillable: order.partially_fillable,
			sell_token_balance: order.sell_token_balance,
			buy_token_balance: order.buy_token_balance,
			signing_scheme: signed.signing_scheme.as_str(),
			signature: signed.signature_hex(),
			from: signed.owner,
			quote_id: signed.quote_id,
		}
	}
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OrderResponseBody {
	uid: String,
	status: String,
	#[serde(default)]
	creation_date: Option<String>,
	#[serde(default)]
	sell_token: Option<Address>,
	#[serde(default)]
	buy_token: Option<Address>,
	#[serde(with = "u256_decimal_opt", default)]
	sell_amount: Option<U256>,
	#[serde(with = "u256_decimal_opt", default)]
	buy_amount: Option<U256>,
	#[serde(with = "u256_decimal_opt", default)]
	fee_amount: Option<U256>,
	#[serde(default)]
	valid_to: Option<u32>,
	#[serde(with = "u256_decimal_opt", default)]
	executed_sell_amount: Option<U256>,
	#[serde(with = "u256_decimal_opt", default)]
	executed_buy_amount: Option<U256>,
	#[serde(with = "u256_decimal_opt", default)]
	executed_fee_amount: Option<U256>,
	#[serde(default)]
	tx_hash: Option<String>,
}

impl From<OrderResponseBody> for OrderDetails {
	fn from(body: OrderResponseBody) -> Self {
		Self {
			status: OrderStatus::from_wire(&body.status),
			uid: body.uid,
			creation_date: body.creation_date,
			sell_token: body.sell_token,
			buy_token: body.buy_token,
			sell_amount: body.sell_amount,
			buy_amount: body.buy_amount,
			fee_amount: body.fee_amount,
			valid_to: body.valid_to,
			executed_sell_amount: body.executed_sell_amount,
			executed_buy_amount: body.executed_buy_amount,
			executed_fee_amount: body.executed_fee_amount,
			tx_hash: body.tx_hash,
		}
	}
}

/// Error payload of the order book API.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiErrorBody {
	error_type: String,
	#[serde(default)]
	description: String,
}

fn parse_bytes32(value: &str) -> Option<B256> {
	let trimmed = value.trim();
	if trimmed.len() != 66 || !trimmed.starts_with("0x") {
		return None;
	}
	B256::from_str(trimmed).ok()
}

/// Resolves the bytes32 that is signed as `appData`.
///
/// The service returns either the hash itself or a JSON document, optionally
/// with its hash. A document without a hash is hashed locally.
fn app_data_hash(app_data: &str, reported_hash: Option<B256>) -> B256 {
	parse_bytes32(app_data)
		.or(reported_hash)
		.unwrap_or_else(|| keccak256(app_data.as_bytes()))
}

fn error_message(body: &str) -> String {
	match serde_json::from_str::<ApiErrorBody>(body) {
		Ok(err) if err.description.is_empty() => err.error_type,
		Ok(err) => format!("{}: {}", err.error_type, err.description),
		Err(_) => body.to_string(),
	}
}

/// Order book client over HTTP.
pub struct HttpOrderBook {
	client: Client,
	base_url: String,
}

impl HttpOrderBook {
	pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, OrderBookError> {
		let base_url: String = base_url.into();
		let client = Client::builder()
			.pool_idle_timeout(Duration::from_secs(90))
			.pool_max_idle_per_host(10)
			.timeout(timeout)
			.build()
			.map_err(|e| OrderBookError::Transport(format!("Failed to create HTTP client: {}", e)))?;

		Ok(Self {
			client,
			base_url: base_url.trim_end_matches('/').to_string(),
		})
	}

	fn url(&self, path: &str) -> String {
		format!("{}{}", self.base_url, path)
	}

	async fn check(response: Response) -> Result<Response, OrderBookError> {
		let status = response.status();
		if status.is_success() {
			return Ok(response);
		}
		let body = response.text().await.unwrap_or_default();
		Err(OrderBookError::Rejected {
			status: status.as_u16(),
			message: error_message(&body),
		})
	}
}

#[async_trait]
impl OrderBookInterface for HttpOrderBook {
	async fn get_quote(&self, request: &QuoteRequest) -> Result<Quote, OrderBookError> {
		let url = self.url("/api/v1/quote");
		tracing::debug!(%url, sell_token = %request.sell_token, buy_token = %request.buy_token, "Requesting quote");

		let response = self
			.client
			.post(&url)
			.json(&QuoteRequestBody::from(request))
			.send()
			.await
			.map_err(|e| OrderBookError::Transport(format!("Quote request failed: {}", e)))?;

		let body: QuoteResponseBody = Self::check(response)
			.await?
			.json()
			.await
			.map_err(|e| OrderBookError::Decode(format!("Failed to parse quote: {}", e)))?;

		Ok(body.into_quote(request.sell_amount_before_fee))
	}

	async fn submit_order(&self, order: &SignedOrder) -> Result<String, OrderBookError> {
		let url = self.url("/api/v1/orders");

		let response = self
			.client
			.post(&url)
			.json(&OrderCreationBody::from(order))
			.send()
			.await
			.map_err(|e| OrderBookError::Transport(format!("Order submission failed: {}", e)))?;

		let uid: String = Self::check(response)
			.await?
			.json()
			.await
			.map_err(|e| OrderBookError::Decode(format!("Failed to parse order uid: {}", e)))?;

		if uid.is_empty() {
			return Err(OrderBookError::Decode("Empty order uid".to_string()));
		}
		tracing::debug!(order_id = %truncate_id(&uid), "Order accepted");
		Ok(uid)
	}

	async fn get_order(&self, uid: &str) -> Result<OrderDetails, OrderBookError> {
		let url = self.url(&format!("/api/v1/orders/{}", uid));

		let response = self
			.client
			.get(&url)
			.send()
			.await
			.map_err(|e| OrderBookError::Transport(format!("Status request failed: {}", e)))?;

		if response.status() == StatusCode::NOT_FOUND {
			return Err(OrderBookError::NotFound(uid.to_string()));
		}

		let body: OrderResponseBody = Self::check(response)
			.await?
			.json()
			.await
			.map_err(|e| OrderBookError::Decode(format!("Failed to parse order: {}", e)))?;

		Ok(body.into())
	}
}

/// Creates an HTTP order book client.
pub fn create_http_orderbook(
	api_url: &str,
	timeout: Duration,
) -> Result<Box<dyn OrderBookInterface>, OrderBookError> {
	Ok(Box::new(HttpOrderBook::new(api_url, timeout)?))
}
