//! Swap pipeline that drives one order through its lifecycle.
//!
//! The stages run strictly in sequence: network check and quote, allowance,
//! build, expiry check, sign, submit and monitor. A failing stage
//! short-circuits the run with a tagged [`SwapError`]. Once the order has been
//! submitted nothing fails anymore: the monitor outcome is reported instead.

pub mod event_bus;

use crate::monitoring::{MonitorReport, MonitorSettings, OrderMonitor};
use crate::stages::{
	AllowanceError, AllowanceManager, OrderBuilder, OrderSigner, OrderSubmitter, QuoteError,
	QuoteService, SigningError, SubmissionError,
};
use event_bus::EventBus;
use std::sync::Arc;
use swap_account::{AccountError, AccountService};
use swap_config::{Config, SwapConfig};
use swap_delivery::DeliveryService;
use swap_orderbook::{OrderBookError, OrderBookService};
use swap_types::{
	current_timestamp, truncate_id, Address, FeePolicy, Order, OrderDetails, Quote, SignedOrder,
	SwapEvent, U256,
};
use thiserror::Error;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::instrument;

/// Errors that abort a swap before its order is placed.
#[derive(Debug, Error)]
pub enum SwapError {
	#[error("Network mismatch: connected to chain {actual}, expected {expected}")]
	NetworkMismatch { expected: u64, actual: u64 },
	#[error("Quote error: {0}")]
	Quote(QuoteError),
	#[error("Allowance transaction error: {0}")]
	AllowanceTx(#[from] AllowanceError),
	#[error("Quote expired at {valid_to} (now {now})")]
	QuoteExpired { valid_to: u32, now: u64 },
	#[error("Signing error: {0}")]
	Signing(#[from] SigningError),
	#[error("Submission error: {0}")]
	Submission(#[from] SubmissionError),
	#[error("Account error: {0}")]
	Account(#[from] AccountError),
}

impl From<QuoteError> for SwapError {
	fn from(err: QuoteError) -> Self {
		match err {
			QuoteError::NetworkMismatch { expected, actual } => {
				SwapError::NetworkMismatch { expected, actual }
			},
			other => SwapError::Quote(other),
		}
	}
}

/// The trade a pipeline run performs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapRequest {
	pub sell_token: Address,
	pub buy_token: Address,
	/// Exact amount to sell, used unchanged for quote, allowance and signature.
	pub sell_amount: U256,
	/// Recipient of the bought tokens; the wallet address if unset.
	pub receiver: Option<Address>,
}

impl From<&SwapConfig> for SwapRequest {
	fn from(config: &SwapConfig) -> Self {
		Self {
			sell_token: config.sell_token,
			buy_token: config.buy_token,
			sell_amount: config.sell_amount,
			receiver: config.receiver,
		}
	}
}

/// Everything a completed run produced.
#[derive(Debug, Clone)]
pub struct SwapReport {
	pub owner: Address,
	pub quote: Quote,
	pub approval_issued: bool,
	pub signed_order: SignedOrder,
	pub order_id: String,
	pub monitor: MonitorReport,
}

/// Static parameters of the pipeline.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
	pub chain_id: u64,
	/// Spender of the sell token allowance.
	pub vault_relayer: Address,
	/// EIP-712 verifying contract.
	pub settlement: Address,
	pub fee_policy: FeePolicy,
	pub monitor: MonitorSettings,
}

impl From<&Config> for PipelineSettings {
	fn from(config: &Config) -> Self {
		Self {
			chain_id: config.network.chain_id,
			vault_relayer: config.orderbook.vault_relayer,
			settlement: config.orderbook.settlement_contract,
			fee_policy: config.order.fee_policy,
			monitor: MonitorSettings::from(&config.monitor),
		}
	}
}

/// Routes an interrupt to the order monitor while one is running.
///
/// Until an order has been placed there is nothing to interrupt: the earlier
/// stages always run to completion, and only ending the process stops them.
#[derive(Clone, Default)]
pub struct InterruptHandle {
	active: Arc<Mutex<Option<CancellationToken>>>,
}

impl InterruptHandle {
	/// Stops the running monitor. Returns false if no order is being monitored.
	pub async fn interrupt(&self) -> bool {
		match self.active.lock().await.as_ref() {
			Some(token) => {
				token.cancel();
				true
			},
			None => false,
		}
	}

	async fn arm(&self) -> CancellationToken {
		let token = CancellationToken::new();
		*self.active.lock().await = Some(token.clone());
		token
	}

	async fn disarm(&self) {
		self.active.lock().await.take();
	}
}

pub struct SwapPipeline {
	account: Arc<AccountService>,
	orderbook: Arc<OrderBookService>,
	quotes: QuoteService,
	allowance: AllowanceManager,
	builder: OrderBuilder,
	signer: OrderSigner,
	submitter: OrderSubmitter,
	monitor: OrderMonitor,
	event_bus: EventBus,
	settings: PipelineSettings,
	interrupt: InterruptHandle,
}

impl SwapPipeline {
	pub fn new(
		account: Arc<AccountService>,
		delivery: Arc<DeliveryService>,
		orderbook: Arc<OrderBookService>,
		event_bus: EventBus,
		settings: PipelineSettings,
	) -> Self {
		Self {
			quotes: QuoteService::new(delivery.clone(), orderbook.clone(), settings.chain_id),
			allowance: AllowanceManager::new(delivery, settings.chain_id),
			builder: OrderBuilder::new(settings.fee_policy),
			signer: OrderSigner::new(account.clone(), settings.settlement),
			submitter: OrderSubmitter::new(orderbook.clone()),
			monitor: OrderMonitor::new(
				orderbook.clone(),
				event_bus.clone(),
				settings.monitor.clone(),
			),
			account,
			orderbook,
			event_bus,
			settings,
			interrupt: InterruptHandle::default(),
		}
	}

	pub fn event_bus(&self) -> &EventBus {
		&self.event_bus
	}

	pub fn interrupt_handle(&self) -> InterruptHandle {
		self.interrupt.clone()
	}

	/// Runs the full lifecycle for `request`.
	#[instrument(skip_all, fields(sell_token = %request.sell_token, buy_token = %request.buy_token))]
	pub async fn run(&self, request: &SwapRequest) -> Result<SwapReport, SwapError> {
		let owner = self.account.get_address().await?;
		let receiver = request.receiver.unwrap_or(owner);
		tracing::info!(owner = %owner, sell_amount = %request.sell_amount, "Starting swap");

		let quote = self.request_quote(request, owner, receiver).await?;
		let approval_issued = self.ensure_allowance(&quote, owner).await?;
		let order = self.build_order(&quote, receiver, current_timestamp())?;
		let signed_order = self.sign_order(order, &quote).await?;
		let order_id = self.submit_order(&signed_order).await?;
		let monitor = self.monitor_order(&order_id).await;

		Ok(SwapReport {
			owner,
			quote,
			approval_issued,
			signed_order,
			order_id,
			monitor,
		})
	}

	/// Fetches the current state of an existing order once.
	pub async fn status(&self, order_id: &str) -> Result<OrderDetails, OrderBookError> {
		self.orderbook.order(order_id).await
	}

	/// Monitors an order placed earlier.
	pub async fn monitor_existing(&self, order_id: &str) -> MonitorReport {
		self.monitor_order(order_id).await
	}

	/// Monitors with the interrupt handle armed for the duration of the call.
	async fn monitor_order(&self, order_id: &str) -> MonitorReport {
		let cancel = self.interrupt.arm().await;
		let report = self.monitor.monitor(order_id, &cancel).await;
		self.interrupt.disarm().await;
		report
	}

	async fn request_quote(
		&self,
		request: &SwapRequest,
		owner: Address,
		receiver: Address,
	) -> Result<Quote, SwapError> {
		let quote = self
			.quotes
			.get_quote(
				request.sell_token,
				request.buy_token,
				owner,
				receiver,
				request.sell_amount,
			)
			.await?;

		self.event_bus
			.publish(SwapEvent::QuoteReceived {
				fee_amount: quote.fee_amount,
				buy_amount: quote.buy_amount,
				valid_to: quote.valid_to,
			})
			.ok();
		Ok(quote)
	}

	async fn ensure_allowance(&self, quote: &Quote, owner: Address) -> Result<bool, SwapError> {
		let issued = self
			.allowance
			.ensure_allowance(
				quote.sell_token,
				owner,
				self.settings.vault_relayer,
				self.builder.required_allowance(quote),
			)
			.await?;

		self.event_bus
			.publish(SwapEvent::AllowanceDecision { issued })
			.ok();
		Ok(issued)
	}

	/// Builds the order, refusing quotes whose validity ended by `now`.
	fn build_order(&self, quote: &Quote, receiver: Address, now: u64) -> Result<Order, SwapError> {
		if quote.is_expired_at(now) {
			return Err(SwapError::QuoteExpired {
				valid_to: quote.valid_to,
				now,
			});
		}
		let order = self.builder.build(quote, receiver);
		tracing::debug!(
			fee_policy = ?self.builder.fee_policy(),
			fee_amount = %order.fee_amount,
			"Built order"
		);
		Ok(order)
	}

	async fn sign_order(&self, order: Order, quote: &Quote) -> Result<SignedOrder, SwapError> {
		let signed = self
			.signer
			.sign(
				order,
				self.settings.chain_id,
				quote.app_data.clone(),
				quote.quote_id,
			)
			.await?;
		self.event_bus.publish(SwapEvent::OrderSigned).ok();
		Ok(signed)
	}

	async fn submit_order(&self, order: &SignedOrder) -> Result<String, SwapError> {
		let order_id = self.submitter.submit(order).await?;
		tracing::info!(order_id = %truncate_id(&order_id), "Order placed");
		self.event_bus
			.publish(SwapEvent::OrderSubmitted {
				order_id: order_id.clone(),
			})
			.ok();
		Ok(order_id)
	}
}
