//! Serde adapters for token amounts.
//!
//! The order book transmits amounts as decimal strings. `U256`'s own serde
//! implementation uses hex, so these modules are applied with `#[serde(with)]`
//! wherever an amount crosses the wire or appears in an event.

/// `U256` as a decimal string. Deserialization also accepts `0x` hex and JSON numbers.
pub mod u256_decimal {
	use alloy_primitives::U256;
	use serde::{de, Deserialize, Deserializer, Serializer};
	use std::str::FromStr;

	pub fn serialize<S>(value: &U256, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_str(&value.to_string())
	}

	pub fn deserialize<'de, D>(deserializer: D) -> Result<U256, D::Error>
	where
		D: Deserializer<'de>,
	{
		#[derive(Deserialize)]
		#[serde(untagged)]
		enum Raw {
			Text(String),
			Number(u64),
		}

		match Raw::deserialize(deserializer)? {
			Raw::Text(s) => parse(&s).map_err(de::Error::custom),
			Raw::Number(n) => Ok(U256::from(n)),
		}
	}

	pub(super) fn parse(s: &str) -> Result<U256, String> {
		U256::from_str(s.trim()).map_err(|e| format!("invalid amount '{}': {}", s, e))
	}
}

/// `Option<U256>` as an optional decimal string.
pub mod u256_decimal_opt {
	use alloy_primitives::U256;
	use serde::{de, Deserialize, Deserializer, Serializer};

	pub fn serialize<S>(value: &Option<U256>, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		match value {
			Some(v) => serializer.serialize_some(&v.to_string()),
			None => serializer.serialize_none(),
		}
	}

	pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<U256>, D::Error>
	where
		D: Deserializer<'de>,
	{
		Option::<String>::deserialize(deserializer)?
			.map(|s| super::u256_decimal::parse(&s).map_err(de::Error::custom))
			.transpose()
	}
}
