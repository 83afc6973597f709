//! Redacting string wrapper for the wallet private key.
//!
//! `SecretString` zeroes its buffer on drop and never renders its contents
//! through `Debug`, `Display` or `Serialize`, so a configuration struct holding
//! the key can be logged safely.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use zeroize::Zeroizing;

const REDACTED: &str = "***REDACTED***";

#[derive(Clone)]
pub struct SecretString(Zeroizing<String>);

impl SecretString {
	pub fn new(s: String) -> Self {
		Self(Zeroizing::new(s))
	}

	/// Exposes the secret to a closure, limiting the scope where it is visible.
	pub fn with_exposed<F, R>(&self, f: F) -> R
	where
		F: FnOnce(&str) -> R,
	{
		f(&self.0)
	}

	pub fn is_empty(&self) -> bool {
		self.0.trim().is_empty()
	}

	/// Returns true if the value is a 32-byte hex string, with or without `0x`.
	pub fn is_hex_key(&self) -> bool {
		self.with_exposed(|s| {
			let s = s.trim();
			let digits = s
				.strip_prefix("0x")
				.or_else(|| s.strip_prefix("0X"))
				.unwrap_or(s);
			digits.len() == 64 && digits.chars().all(|c| c.is_ascii_hexdigit())
		})
	}
}

impl fmt::Debug for SecretString {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "SecretString({})", REDACTED)
	}
}

impl fmt::Display for SecretString {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(REDACTED)
	}
}

impl From<String> for SecretString {
	fn from(s: String) -> Self {
		Self::new(s)
	}
}

impl From<&str> for SecretString {
	fn from(s: &str) -> Self {
		Self::new(s.to_string())
	}
}

impl PartialEq for SecretString {
	fn eq(&self, other: &Self) -> bool {
		self.0.as_str() == other.0.as_str()
	}
}

impl Eq for SecretString {}

impl Serialize for SecretString {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_str(REDACTED)
	}
}

impl<'de> Deserialize<'de> for SecretString {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		String::deserialize(deserializer).map(SecretString::new)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

	#[test]
	fn test_key_never_rendered() {
		let secret = SecretString::from(KEY);
		assert_eq!(format!("{:?}", secret), "SecretString(***REDACTED***)");
		assert_eq!(format!("{}", secret), REDACTED);
		let json = serde_json::to_string(&secret).unwrap();
		assert!(!json.contains("ac0974"));
	}

	#[test]
	fn test_hex_key_detection() {
		assert!(SecretString::from(KEY).is_hex_key());
		assert!(SecretString::from(&KEY[2..]).is_hex_key());
		assert!(!SecretString::from("0x1234").is_hex_key());
		assert!(!SecretString::from("not-a-key").is_hex_key());
		assert!(SecretString::from("   ").is_empty());
	}

	#[test]
	fn test_with_exposed() {
		let secret = SecretString::from("value");
		assert_eq!(secret.with_exposed(|s| s.len()), 5);
	}
}
