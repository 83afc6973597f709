//! Configuration module for the swap client.
//!
//! Loads the run configuration from TOML, resolving `${VAR}` and
//! `${VAR:-default}` references against the environment so that the wallet key
//! and RPC endpoint never have to be written to disk. The resulting [`Config`]
//! is validated once, before any network call is made.
//!
//! A run file may pull shared sections from other files with
//! `include = ["mainnet.toml"]`; see the loader module for the rules.

mod loader;

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use swap_types::utils::serde_helpers::u256_decimal;
use swap_types::{constants, Address, FeePolicy, SecretString, U256};
use thiserror::Error;

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error that occurs during file I/O operations.
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	/// Error that occurs when parsing TOML configuration.
	#[error("Configuration error: {0}")]
	Parse(String),
	/// Error that occurs when configuration validation fails.
	#[error("Validation error: {0}")]
	Validation(String),
}

impl From<toml::de::Error> for ConfigError {
	fn from(err: toml::de::Error) -> Self {
		// Extract just the message without the huge input dump
		ConfigError::Parse(err.message().to_string())
	}
}

/// Complete configuration of a swap run.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
	/// Wallet key material.
	pub account: AccountConfig,
	/// Blockchain RPC endpoint and confirmation policy.
	pub network: NetworkConfig,
	/// Order book API endpoint and protocol addresses.
	#[serde(default)]
	pub orderbook: OrderBookConfig,
	/// The trade to perform.
	pub swap: SwapConfig,
	/// Order construction policy.
	#[serde(default)]
	pub order: OrderConfig,
	/// Status polling policy.
	#[serde(default)]
	pub monitor: MonitorConfig,
}

/// Wallet configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AccountConfig {
	/// Hex-encoded secp256k1 private key, usually `${PRIVATE_KEY}`.
	pub private_key: SecretString,
}

/// Blockchain network configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NetworkConfig {
	/// Chain the RPC endpoint must report. Defaults to mainnet.
	#[serde(default = "default_chain_id")]
	pub chain_id: u64,
	/// HTTP(S) JSON-RPC endpoint, usually `${RPC_URL}`.
	pub rpc_url: String,
	/// Confirmations to wait for on the approval transaction.
	#[serde(default = "default_confirmations")]
	pub min_confirmations: u64,
	/// Upper bound on the approval confirmation wait.
	#[serde(default = "default_confirmation_timeout")]
	pub confirmation_timeout_seconds: u64,
}

fn default_chain_id() -> u64 {
	constants::MAINNET_CHAIN_ID
}

fn default_confirmations() -> u64 {
	1
}

fn default_confirmation_timeout() -> u64 {
	600
}

/// Order book API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OrderBookConfig {
	/// Base URL, e.g. `https://api.cow.fi/mainnet`.
	#[serde(default = "default_orderbook_url")]
	pub api_url: String,
	/// Per-request HTTP timeout.
	#[serde(default = "default_request_timeout")]
	pub request_timeout_seconds: u64,
	/// Spender that receives the ERC-20 approval.
	#[serde(default = "default_vault_relayer")]
	pub vault_relayer: Address,
	/// Verifying contract of the order signing domain.
	#[serde(default = "default_settlement_contract")]
	pub settlement_contract: Address,
}

impl Default for OrderBookConfig {
	fn default() -> Self {
		Self {
			api_url: default_orderbook_url(),
			request_timeout_seconds: default_request_timeout(),
			vault_relayer: default_vault_relayer(),
			settlement_contract: default_settlement_contract(),
		}
	}
}

fn default_orderbook_url() -> String {
	constants::DEFAULT_ORDERBOOK_URL.to_string()
}

fn default_request_timeout() -> u64 {
	30
}

fn default_vault_relayer() -> Address {
	constants::GPV2_VAULT_RELAYER
}

fn default_settlement_contract() -> Address {
	constants::GPV2_SETTLEMENT
}

/// The trade to perform.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SwapConfig {
	pub sell_token: Address,
	pub buy_token: Address,
	/// Raw sell amount in token units, as a decimal string.
	#[serde(with = "u256_decimal")]
	pub sell_amount: U256,
	/// Recipient of the bought tokens. Defaults to the wallet address.
	#[serde(default)]
	pub receiver: Option<Address>,
}

/// Order construction policy.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct OrderConfig {
	#[serde(default)]
	pub fee_policy: FeePolicy,
}

/// Status polling policy.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MonitorConfig {
	/// How long to poll before the final status fetch.
	#[serde(default = "default_monitor_timeout")]
	pub timeout_seconds: u64,
	/// Spacing between status polls.
	#[serde(default = "default_poll_interval")]
	pub poll_interval_seconds: u64,
	/// Retries of a failed status fetch before monitoring gives up.
	/// Zero stops on the first failure.
	#[serde(default = "default_max_retries")]
	pub max_retries: u32,
	/// First retry delay; doubles on each further retry.
	#[serde(default = "default_initial_backoff")]
	pub retry_initial_backoff_ms: u64,
	/// Cap on the retry delay.
	#[serde(default = "default_max_backoff")]
	pub retry_max_backoff_ms: u64,
}

impl Default for MonitorConfig {
	fn default() -> Self {
		Self {
			timeout_seconds: default_monitor_timeout(),
			poll_interval_seconds: default_poll_interval(),
			max_retries: default_max_retries(),
			retry_initial_backoff_ms: default_initial_backoff(),
			retry_max_backoff_ms: default_max_backoff(),
		}
	}
}

fn default_monitor_timeout() -> u64 {
	600 // 10 minutes
}

fn default_poll_interval() -> u64 {
	30
}

fn default_max_retries() -> u32 {
	3
}

fn default_initial_backoff() -> u64 {
	1_000
}

fn default_max_backoff() -> u64 {
	30_000
}

/// Resolves environment variables in a string.
///
/// Replaces ${VAR_NAME} with the value of the environment variable VAR_NAME.
/// Supports default values with ${VAR_NAME:-default_value}.
///
/// Input strings are limited to 1MB.
pub(crate) fn resolve_env_vars(input: &str) -> Result<String, ConfigError> {
	const MAX_INPUT_SIZE: usize = 1024 * 1024;
	if input.len() > MAX_INPUT_SIZE {
		return Err(ConfigError::Validation(format!(
			"Configuration file too large: {} bytes (max: {} bytes)",
			input.len(),
			MAX_INPUT_SIZE
		)));
	}

	let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]{0,127})(?::-([^}]{0,256}))?\}")
		.map_err(|e| ConfigError::Parse(format!("Regex error: {}", e)))?;

	let mut result = input.to_string();
	let mut replacements = Vec::new();

	for cap in re.captures_iter(input) {
		let (Some(full_match), Some(var_name)) = (cap.get(0), cap.get(1)) else {
			continue;
		};
		let var_name = var_name.as_str();
		let default_value = cap.get(2).map(|m| m.as_str());

		let value = match std::env::var(var_name) {
			Ok(v) => v,
			Err(_) => match default_value {
				Some(default) => default.to_string(),
				None => {
					return Err(ConfigError::Validation(format!(
						"Environment variable '{}' not found",
						var_name
					)));
				},
			},
		};

		replacements.push((full_match.start(), full_match.end(), value));
	}

	// Apply replacements in reverse order to maintain positions
	for (start, end, value) in replacements.iter().rev() {
		result.replace_range(start..end, value);
	}

	Ok(result)
}

impl Config {
	/// Loads configuration from a file, following `include` directives.
	pub async fn from_file(path: &str) -> Result<Self, ConfigError> {
		loader::load(Path::new(path)).await
	}

	/// Validates the configuration before any core call.
	///
	/// - Private key and RPC URL are present and well-formed
	/// - The trade is non-degenerate (nonzero amount, distinct tokens)
	/// - Confirmation and polling bounds are sane
	fn validate(&self) -> Result<(), ConfigError> {
		if self.account.private_key.is_empty() {
			return Err(ConfigError::Validation("Private key cannot be empty".into()));
		}
		if !self.account.private_key.is_hex_key() {
			return Err(ConfigError::Validation(
				"Private key must be 32 bytes of hex".into(),
			));
		}

		validate_http_url("network.rpc_url", &self.network.rpc_url)?;
		if self.network.chain_id == 0 {
			return Err(ConfigError::Validation("chain_id must be nonzero".into()));
		}
		if self.network.min_confirmations == 0 {
			return Err(ConfigError::Validation(
				"min_confirmations must be at least 1".into(),
			));
		}
		if self.network.min_confirmations > 100 {
			return Err(ConfigError::Validation(
				"min_confirmations cannot exceed 100".into(),
			));
		}
		if self.network.confirmation_timeout_seconds == 0 {
			return Err(ConfigError::Validation(
				"confirmation_timeout_seconds must be greater than 0".into(),
			));
		}

		validate_http_url("orderbook.api_url", &self.orderbook.api_url)?;
		if self.orderbook.request_timeout_seconds == 0 {
			return Err(ConfigError::Validation(
				"orderbook.request_timeout_seconds must be greater than 0".into(),
			));
		}

		if self.swap.sell_amount.is_zero() {
			return Err(ConfigError::Validation(
				"swap.sell_amount must be greater than 0".into(),
			));
		}
		if self.swap.sell_token == self.swap.buy_token {
			return Err(ConfigError::Validation(
				"swap.sell_token and swap.buy_token must differ".into(),
			));
		}

		if self.monitor.poll_interval_seconds == 0 {
			return Err(ConfigError::Validation(
				"monitor.poll_interval_seconds must be greater than 0".into(),
			));
		}
		if self.monitor.poll_interval_seconds > self.monitor.timeout_seconds {
			return Err(ConfigError::Validation(format!(
				"monitor.poll_interval_seconds ({}) cannot exceed monitor.timeout_seconds ({})",
				self.monitor.poll_interval_seconds, self.monitor.timeout_seconds
			)));
		}
		if self.monitor.retry_initial_backoff_ms > self.monitor.retry_max_backoff_ms {
			return Err(ConfigError::Validation(
				"monitor.retry_initial_backoff_ms cannot exceed monitor.retry_max_backoff_ms"
					.into(),
			));
		}

		Ok(())
	}
}

fn validate_http_url(field: &str, url: &str) -> Result<(), ConfigError> {
	let url = url.trim();
	if url.is_empty() {
		return Err(ConfigError::Validation(format!("{} cannot be empty", field)));
	}
	let rest = url
		.strip_prefix("https://")
		.or_else(|| url.strip_prefix("http://"))
		.ok_or_else(|| {
			ConfigError::Validation(format!("{} must be an http(s) URL: {}", field, url))
		})?;
	if rest.is_empty() || rest.starts_with('/') {
		return Err(ConfigError::Validation(format!(
			"{} is missing a host: {}",
			field, url
		)));
	}
	Ok(())
}

/// Parses configuration from a TOML string.
///
/// Environment variables are resolved and the configuration is validated after
/// parsing.
impl FromStr for Config {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let resolved = resolve_env_vars(s)?;
		let config: Config = toml::from_str(&resolved)?;
		config.validate()?;
		Ok(config)
	}
}
