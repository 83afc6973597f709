//! Utility functions for formatting and serialization.

pub mod formatting;
pub mod serde_helpers;

pub use formatting::{format_valid_to, truncate_id, unix_to_utc, with_0x_prefix};

/// Current unix timestamp in seconds, or 0 if the system clock is before the epoch.
pub fn current_timestamp() -> u64 {
	std::time::SystemTime::now()
		.duration_since(std::time::UNIX_EPOCH)
		.map(|d| d.as_secs())
		.unwrap_or(0)
}
