//! Builder for constructing swap pipelines.
//!
//! Composes a [`SwapPipeline`] from the validated configuration and one factory
//! per external collaborator, so the binary wires real RPC and HTTP clients
//! while tests substitute in-memory ones.

use crate::engine::{event_bus::EventBus, PipelineSettings, SwapPipeline};
use std::sync::Arc;
use std::time::Duration;
use swap_account::{AccountError, AccountInterface, AccountService};
use swap_config::Config;
use swap_delivery::{DeliveryError, DeliveryInterface, DeliveryService};
use swap_orderbook::{OrderBookError, OrderBookInterface, OrderBookService};
use swap_types::SecretString;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BuilderError {
	#[error("Configuration error: {0}")]
	Config(String),
}

/// Factory functions for the pipeline's collaborators.
pub struct SwapFactories<AF, DF, OF> {
	/// Builds the wallet from the private key.
	pub account_factory: AF,
	/// Builds the RPC client from `(rpc_url, chain_id, private_key)`.
	pub delivery_factory: DF,
	/// Builds the order book client from `(api_url, request_timeout)`.
	pub orderbook_factory: OF,
}

pub struct SwapBuilder {
	config: Config,
}

impl SwapBuilder {
	pub fn new(config: Config) -> Self {
		Self { config }
	}

	pub fn build<AF, DF, OF>(
		self,
		factories: SwapFactories<AF, DF, OF>,
	) -> Result<SwapPipeline, BuilderError>
	where
		AF: Fn(&SecretString) -> Result<Box<dyn AccountInterface>, AccountError>,
		DF: Fn(&str, u64, &SecretString) -> Result<Box<dyn DeliveryInterface>, DeliveryError>,
		OF: Fn(&str, Duration) -> Result<Box<dyn OrderBookInterface>, OrderBookError>,
	{
		let config = &self.config;

		let account = (factories.account_factory)(&config.account.private_key).map_err(|e| {
			tracing::error!(component = "account", error = %e, "Failed to create account");
			BuilderError::Config(format!("Failed to create account: {}", e))
		})?;
		tracing::info!(component = "account", implementation = "local", "Loaded");

		let delivery = (factories.delivery_factory)(
			&config.network.rpc_url,
			config.network.chain_id,
			&config.account.private_key,
		)
		.map_err(|e| {
			tracing::error!(component = "delivery", error = %e, "Failed to create delivery");
			BuilderError::Config(format!("Failed to create delivery: {}", e))
		})?;
		tracing::info!(
			component = "delivery",
			chain_id = config.network.chain_id,
			"Loaded"
		);

		let orderbook = (factories.orderbook_factory)(
			&config.orderbook.api_url,
			Duration::from_secs(config.orderbook.request_timeout_seconds),
		)
		.map_err(|e| {
			tracing::error!(component = "orderbook", error = %e, "Failed to create order book client");
			BuilderError::Config(format!("Failed to create order book client: {}", e))
		})?;
		tracing::info!(component = "orderbook", api_url = %config.orderbook.api_url, "Loaded");

		Ok(SwapPipeline::new(
			Arc::new(AccountService::new(account)),
			Arc::new(DeliveryService::new(
				delivery,
				config.network.min_confirmations,
				Duration::from_secs(config.network.confirmation_timeout_seconds),
			)),
			Arc::new(OrderBookService::new(orderbook)),
			EventBus::new(1000),
			PipelineSettings::from(config),
		))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::test_support::{ApprovalBehavior, FakeBook, FakeChain, ANVIL_KEY};
	use std::str::FromStr;
	use std::sync::Mutex;
	use swap_account::implementations::local::create_account;
	use swap_types::U256;

	fn config() -> Config {
		Config::from_str(&format!(
			r#"
[account]
private_key = "{}"

[network]
chain_id = 1
rpc_url = "http://localhost:8545"

[orderbook]
api_url = "http://localhost:8080"
request_timeout_seconds = 7

[swap]
sell_token = "0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2"
buy_token = "0xdAC17F958D2ee523a2206206994597C13D831ec7"
sell_amount = "10000000000000000"
"#,
			ANVIL_KEY
		))
		.unwrap()
	}

	#[tokio::test]
	async fn test_factories_receive_config_values() {
		let seen = Mutex::new(Vec::new());
		let factories = SwapFactories {
			account_factory: create_account,
			delivery_factory: |rpc_url: &str, chain_id: u64, _key: &SecretString| {
				seen.lock().unwrap().push(format!("{}@{}", rpc_url, chain_id));
				let (chain, _) = FakeChain::new(chain_id, U256::ZERO, ApprovalBehavior::Succeeds);
				Ok(Box::new(chain) as Box<dyn DeliveryInterface>)
			},
			orderbook_factory: |api_url: &str, timeout: Duration| {
				seen.lock().unwrap().push(format!("{}/{}s", api_url, timeout.as_secs()));
				let (book, _) = FakeBook::new(None, vec![]);
				Ok(Box::new(book) as Box<dyn OrderBookInterface>)
			},
		};

		let pipeline = SwapBuilder::new(config()).build(factories).unwrap();

		assert_eq!(
			*seen.lock().unwrap(),
			vec![
				"http://localhost:8545@1".to_string(),
				"http://localhost:8080/7s".to_string()
			]
		);
		let details = pipeline.status("0x01").await.unwrap();
		assert_eq!(details.uid, "0x01");
	}

	#[test]
	fn test_factory_failure_is_config_error() {
		let factories = SwapFactories {
			account_factory: create_account,
			delivery_factory: |_: &str, _: u64, _: &SecretString| {
				Err::<Box<dyn DeliveryInterface>, _>(DeliveryError::Network(
					"connection refused".into(),
				))
			},
			orderbook_factory: |_: &str, _: Duration| {
				let (book, _) = FakeBook::new(None, vec![]);
				Ok(Box::new(book) as Box<dyn OrderBookInterface>)
			},
		};

		let err = SwapBuilder::new(config()).build(factories).err().unwrap();
		assert!(matches!(err, BuilderError::Config(msg) if msg.contains("connection refused")));
	}
}
