//! String formatting utilities.
//!
//! Hex prefix handling, id truncation for logs and timestamp display.

use chrono::{DateTime, Utc};

/// Truncates an order uid or hash for display: first 10 characters followed by "..".
pub fn truncate_id(id: &str) -> String {
	match id.char_indices().nth(10) {
		Some((end, _)) => format!("{}..", &id[..end]),
		None => id.to_string(),
	}
}

/// Adds "0x" prefix to a hex string if it doesn't already have one.
pub fn with_0x_prefix(hex_str: &str) -> String {
	if hex_str.to_lowercase().starts_with("0x") {
		hex_str.to_string()
	} else {
		format!("0x{}", hex_str)
	}
}

/// Unix seconds as a UTC date-time.
pub fn unix_to_utc(secs: u32) -> Option<DateTime<Utc>> {
	DateTime::from_timestamp(i64::from(secs), 0)
}

/// Renders an order or quote `validTo` as a UTC date with the raw seconds.
pub fn format_valid_to(valid_to: u32) -> String {
	match unix_to_utc(valid_to) {
		Some(at) => format!("{} ({})", at.format("%Y-%m-%d %H:%M:%S UTC"), valid_to),
		None => valid_to.to_string(),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_truncate_id() {
		assert_eq!(truncate_id("0x12345678"), "0x12345678");
		assert_eq!(truncate_id("0xc5bba5c14a150e11"), "0xc5bba5c1..");
	}

	#[test]
	fn test_truncate_id_counts_characters_not_bytes() {
		assert_eq!(truncate_id("0x€€€€€€€€"), "0x€€€€€€€€");
		assert_eq!(truncate_id("0x€€€€€€€€€€"), "0x€€€€€€€€..");
	}

	#[test]
	fn test_with_0x_prefix() {
		assert_eq!(with_0x_prefix("abcd"), "0xabcd");
		assert_eq!(with_0x_prefix("0xabcd"), "0xabcd");
		assert_eq!(with_0x_prefix("0Xabcd"), "0Xabcd");
	}

	#[test]
	fn test_format_valid_to() {
		assert_eq!(
			format_valid_to(1_700_000_000),
			"2023-11-14 22:13:20 UTC (1700000000)"
		);
		assert_eq!(
			format_valid_to(u32::MAX),
			"2106-02-07 06:28:15 UTC (4294967295)"
		);
	}
}
