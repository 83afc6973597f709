//! In-memory collaborators shared by the core tests.

use alloy_primitives::address;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use swap_account::implementations::local::create_account;
use swap_account::AccountService;
use swap_delivery::{DeliveryError, DeliveryInterface, DeliveryService};
use swap_orderbook::{OrderBookError, OrderBookInterface, OrderBookService};
use swap_types::{
	constants::EMPTY_APP_DATA, Address, OrderDetails, OrderKind, OrderStatus, Quote,
	QuoteRequest, SecretString, SignedOrder, TokenBalance, Transaction, TransactionHash,
	TransactionReceipt, B256, U256,
};

pub const ANVIL_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
pub const ANVIL_ADDRESS: Address = address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266");
pub const WETH: Address = address!("C02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2");
pub const USDT: Address = address!("dAC17F958D2ee523a2206206994597C13D831ec7");

pub fn account() -> Arc<AccountService> {
	Arc::new(AccountService::new(
		create_account(&SecretString::from(ANVIL_KEY)).unwrap(),
	))
}

/// How the fake chain treats the approval transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalBehavior {
	Succeeds,
	Reverts,
	RejectedOnSend,
	NeverConfirms,
}

pub struct ChainState {
	pub chain_id: u64,
	pub gas_price: u128,
	pub allowance: Mutex<U256>,
	pub approval: ApprovalBehavior,
	pub chain_id_calls: AtomicUsize,
	pub allowance_calls: AtomicUsize,
	pub gas_price_calls: AtomicUsize,
	pub submitted: Mutex<Vec<Transaction>>,
}

impl ChainState {
	pub fn submit_count(&self) -> usize {
		self.submitted.lock().unwrap().len()
	}

	/// Every call except the chain id query.
	pub fn calls_after_network_check(&self) -> usize {
		self.allowance_calls.load(Ordering::SeqCst)
			+ self.gas_price_calls.load(Ordering::SeqCst)
			+ self.submit_count()
	}
}

pub struct FakeChain {
	state: Arc<ChainState>,
}

impl FakeChain {
	pub fn new(chain_id: u64, allowance: U256, approval: ApprovalBehavior) -> (Self, Arc<ChainState>) {
		let state = Arc::new(ChainState {
			chain_id,
			gas_price: 20_000_000_000,
			allowance: Mutex::new(allowance),
			approval,
			chain_id_calls: AtomicUsize::new(0),
			allowance_calls: AtomicUsize::new(0),
			gas_price_calls: AtomicUsize::new(0),
			submitted: Mutex::new(Vec::new()),
		});
		(
			Self {
				state: state.clone(),
			},
			state,
		)
	}

	pub fn service(chain_id: u64, allowance: U256, approval: ApprovalBehavior) -> (Arc<DeliveryService>, Arc<ChainState>) {
		let (chain, state) = Self::new(chain_id, allowance, approval);
		(
			Arc::new(DeliveryService::new(
				Box::new(chain),
				1,
				Duration::from_secs(600),
			)),
			state,
		)
	}
}

#[async_trait]
impl DeliveryInterface for FakeChain {
	async fn get_chain_id(&self) -> Result<u64, DeliveryError> {
		self.state.chain_id_calls.fetch_add(1, Ordering::SeqCst);
		Ok(self.state.chain_id)
	}

	async fn get_gas_price(&self) -> Result<u128, DeliveryError> {
		self.state.gas_price_calls.fetch_add(1, Ordering::SeqCst);
		Ok(self.state.gas_price)
	}

	async fn get_allowance(
		&self,
		_token: Address,
		_owner: Address,
		_spender: Address,
	) -> Result<U256, DeliveryError> {
		self.state.allowance_calls.fetch_add(1, Ordering::SeqCst);
		Ok(*self.state.allowance.lock().unwrap())
	}

	async fn submit(&self, tx: Transaction) -> Result<TransactionHash, DeliveryError> {
		if self.state.approval == ApprovalBehavior::RejectedOnSend {
			return Err(DeliveryError::TransactionFailed("insufficient funds".into()));
		}
		self.state.submitted.lock().unwrap().push(tx);
		Ok(TransactionHash(vec![0xaa; 32]))
	}

	async fn wait_for_confirmation(
		&self,
		hash: &TransactionHash,
		_confirmations: u64,
		timeout: Duration,
	) -> Result<TransactionReceipt, DeliveryError> {
		match self.state.approval {
			ApprovalBehavior::NeverConfirms => Err(DeliveryError::Timeout(format!(
				"not confirmed after {}s",
				timeout.as_secs()
			))),
			ApprovalBehavior::Reverts => Ok(TransactionReceipt {
				hash: hash.clone(),
				block_number: 100,
				success: false,
			}),
			_ => {
				*self.state.allowance.lock().unwrap() = U256::MAX;
				Ok(TransactionReceipt {
					hash: hash.clone(),
					block_number: 100,
					success: true,
				})
			},
		}
	}

	async fn get_block_number(&self) -> Result<u64, DeliveryError> {
		Ok(100)
	}
}

/// Scripted answer of the status endpoint.
#[derive(Debug, Clone)]
pub enum StatusStep {
	Status(&'static str),
	TransportError,
}

pub struct BookState {
	pub quote: Mutex<Option<Quote>>,
	pub reject_quote: AtomicBool,
	pub reject_submission: AtomicBool,
	pub statuses: Mutex<VecDeque<StatusStep>>,
	pub quote_calls: AtomicUsize,
	pub status_calls: AtomicUsize,
	pub submitted: Mutex<Vec<SignedOrder>>,
	pub quote_requests: Mutex<Vec<QuoteRequest>>,
}

impl BookState {
	pub fn submit_count(&self) -> usize {
		self.submitted.lock().unwrap().len()
	}

	pub fn status_count(&self) -> usize {
		self.status_calls.load(Ordering::SeqCst)
	}
}

/// Order book fake. When the status script runs out, the order stays open.
pub struct FakeBook {
	state: Arc<BookState>,
}

impl FakeBook {
	pub fn new(quote: Option<Quote>, statuses: Vec<StatusStep>) -> (Self, Arc<BookState>) {
		let state = Arc::new(BookState {
			quote: Mutex::new(quote),
			reject_quote: AtomicBool::new(false),
			reject_submission: AtomicBool::new(false),
			statuses: Mutex::new(statuses.into()),
			quote_calls: AtomicUsize::new(0),
			status_calls: AtomicUsize::new(0),
			submitted: Mutex::new(Vec::new()),
			quote_requests: Mutex::new(Vec::new()),
		});
		(
			Self {
				state: state.clone(),
			},
			state,
		)
	}

	pub fn service(statuses: Vec<StatusStep>) -> (Arc<OrderBookService>, Arc<BookState>) {
		let (book, state) = Self::new(None, statuses);
		(Arc::new(OrderBookService::new(Box::new(book))), state)
	}
}

#[async_trait]
impl OrderBookInterface for FakeBook {
	async fn get_quote(&self, request: &QuoteRequest) -> Result<Quote, OrderBookError> {
		self.state.quote_calls.fetch_add(1, Ordering::SeqCst);
		self.state
			.quote_requests
			.lock()
			.unwrap()
			.push(request.clone());
		if self.state.reject_quote.load(Ordering::SeqCst) {
			return Err(OrderBookError::Rejected {
				status: 400,
				message: "UnsupportedToken: buy token not supported".into(),
			});
		}
		let template = self.state.quote.lock().unwrap().clone();
		let mut quote = template.unwrap_or_else(|| quote_for(request.sell_amount_before_fee, far_future()));
		quote.requested_sell_amount = request.sell_amount_before_fee;
		quote.from = request.from;
		Ok(quote)
	}

	async fn submit_order(&self, order: &SignedOrder) -> Result<String, OrderBookError> {
		if self.state.reject_submission.load(Ordering::SeqCst) {
			return Err(OrderBookError::Rejected {
				status: 400,
				message: "InvalidSignature".into(),
			});
		}
		self.state.submitted.lock().unwrap().push(order.clone());
		Ok(format!("0x{}", "ab".repeat(56)))
	}

	async fn get_order(&self, uid: &str) -> Result<OrderDetails, OrderBookError> {
		self.state.status_calls.fetch_add(1, Ordering::SeqCst);
		let step = self.state.statuses.lock().unwrap().pop_front();
		match step.unwrap_or(StatusStep::Status("open")) {
			StatusStep::Status(status) => Ok(details(uid, status)),
			StatusStep::TransportError => Err(OrderBookError::Transport("connection reset".into())),
		}
	}
}

pub fn details(uid: &str, status: &str) -> OrderDetails {
	OrderDetails {
		uid: uid.to_string(),
		status: OrderStatus::from_wire(status),
		creation_date: None,
		sell_token: Some(WETH),
		buy_token: Some(USDT),
		sell_amount: None,
		buy_amount: None,
		fee_amount: None,
		valid_to: None,
		executed_sell_amount: None,
		executed_buy_amount: None,
		executed_fee_amount: None,
		tx_hash: None,
	}
}

pub fn far_future() -> u32 {
	u32::MAX - 1
}

/// A WETH to USDT quote as the service would return it for `requested`.
pub fn quote_for(requested: U256, valid_to: u32) -> Quote {
	let fee = U256::from(128_356_101_534_568u64);
	Quote {
		sell_token: WETH,
		buy_token: USDT,
		receiver: Some(ANVIL_ADDRESS),
		sell_amount: requested.saturating_sub(fee),
		buy_amount: U256::from(25_123_456u64),
		fee_amount: fee,
		valid_to,
		app_data: EMPTY_APP_DATA.to_string(),
		app_data_hash: B256::ZERO,
		kind: OrderKind::Sell,
		partially_fillable: false,
		sell_token_balance: TokenBalance::Erc20,
		buy_token_balance: TokenBalance::Erc20,
		from: ANVIL_ADDRESS,
		quote_id: Some(7),
		requested_sell_amount: requested,
	}
}
