//! Protocol constants for the GPv2 order book on Ethereum mainnet.
//!
//! These values are deployment facts of the protocol, not tunables. The
//! addresses can still be overridden from configuration so that the client can
//! be pointed at a fork or a different deployment.

use alloy_primitives::{address, Address};

/// Chain id of Ethereum mainnet.
pub const MAINNET_CHAIN_ID: u64 = 1;

/// GPv2VaultRelayer: the spender that pulls sell tokens during settlement.
///
/// ERC-20 approvals must be granted to this contract, not to the settlement
/// contract itself.
pub const GPV2_VAULT_RELAYER: Address = address!("C92E8bdf79f0507f65a392b0ab4667716BFE0110");

/// GPv2Settlement: the verifying contract of the order signing domain.
pub const GPV2_SETTLEMENT: Address = address!("9008D19f58AAbD9eD0D60971565AA8510560ab41");

/// EIP-712 domain name of the order signing domain.
pub const DOMAIN_NAME: &str = "Gnosis Protocol";

/// EIP-712 domain version of the order signing domain.
pub const DOMAIN_VERSION: &str = "v2";

/// Gas limit attached to the ERC-20 `approve` transaction.
pub const APPROVAL_GAS_LIMIT: u64 = 100_000;

/// Public order book API for mainnet.
pub const DEFAULT_ORDERBOOK_URL: &str = "https://api.cow.fi/mainnet";

/// App data attached to orders when the quote does not carry any (32 zero bytes).
pub const EMPTY_APP_DATA: &str =
	"0x0000000000000000000000000000000000000000000000000000000000000000";

/// Order explorer; the order uid is appended.
pub const ORDER_EXPLORER_URL: &str = "https://explorer.cow.fi/orders/";

/// Block explorer for settlement transactions; the hash is appended.
pub const TX_EXPLORER_URL: &str = "https://etherscan.io/tx/";
