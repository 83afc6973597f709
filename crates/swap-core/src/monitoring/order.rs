//! Order status monitoring.
//!
//! Polls the order book every `poll_interval` until the order reaches a
//! terminal status, the timeout elapses, a status fetch fails for good, or the
//! cancellation token fires. When the timeout elapses, one last fetch decides
//! between a late terminal status and `TimedOut`.

use crate::engine::event_bus::EventBus;
use backoff::{ExponentialBackoff, ExponentialBackoffBuilder};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use swap_config::MonitorConfig;
use swap_orderbook::{OrderBookError, OrderBookService};
use swap_types::{truncate_id, MonitorOutcome, OrderDetails, SwapEvent};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::instrument;

/// A status fetch that kept failing after the allowed retries.
#[derive(Debug, Error)]
#[error("Status fetch failed after {attempts} attempt(s): {source}")]
pub struct StatusFetchError {
	pub attempts: u32,
	pub source: OrderBookError,
}

/// Retry policy for transient status fetch failures.
///
/// `max_retries = 0` gives up on the first failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusRetryPolicy {
	pub max_retries: u32,
	pub initial_backoff: Duration,
	pub max_backoff: Duration,
}

impl StatusRetryPolicy {
	pub fn no_retry() -> Self {
		Self {
			max_retries: 0,
			initial_backoff: Duration::from_secs(1),
			max_backoff: Duration::from_secs(1),
		}
	}

	fn backoff(&self) -> ExponentialBackoff {
		ExponentialBackoffBuilder::new()
			.with_initial_interval(self.initial_backoff)
			.with_max_interval(self.max_backoff)
			.with_max_elapsed_time(None)
			.build()
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorSettings {
	pub timeout: Duration,
	pub poll_interval: Duration,
	pub retry: StatusRetryPolicy,
}

impl From<&MonitorConfig> for MonitorSettings {
	fn from(config: &MonitorConfig) -> Self {
		Self {
			timeout: Duration::from_secs(config.timeout_seconds),
			poll_interval: Duration::from_secs(config.poll_interval_seconds),
			retry: StatusRetryPolicy {
				max_retries: config.max_retries,
				initial_backoff: Duration::from_millis(config.retry_initial_backoff_ms),
				max_backoff: Duration::from_millis(config.retry_max_backoff_ms),
			},
		}
	}
}

/// Result of one monitoring run.
#[derive(Debug, Clone)]
pub struct MonitorReport {
	pub order_id: String,
	pub outcome: MonitorOutcome,
	/// The last successfully fetched order state.
	pub last_details: Option<OrderDetails>,
	/// Number of status requests sent, retries included.
	pub fetches: u32,
	/// Why monitoring stopped early, for `Errored`.
	pub error: Option<String>,
}

pub struct OrderMonitor {
	orderbook: Arc<OrderBookService>,
	event_bus: EventBus,
	settings: MonitorSettings,
}

impl OrderMonitor {
	pub fn new(
		orderbook: Arc<OrderBookService>,
		event_bus: EventBus,
		settings: MonitorSettings,
	) -> Self {
		Self {
			orderbook,
			event_bus,
			settings,
		}
	}

	/// Monitors `order_id` until it settles, fails, times out or is cancelled.
	#[instrument(skip_all, fields(order_id = %truncate_id(order_id)))]
	pub async fn monitor(&self, order_id: &str, cancel: &CancellationToken) -> MonitorReport {
		let fetches = AtomicU32::new(0);
		let start_time = tokio::time::Instant::now();
		let mut last_details = None;

		tracing::info!(
			timeout_secs = self.settings.timeout.as_secs(),
			poll_interval_secs = self.settings.poll_interval.as_secs(),
			"Monitoring order"
		);

		while start_time.elapsed() < self.settings.timeout {
			match self.fetch_status(order_id, &fetches).await {
				Ok(details) => {
					self.publish_status(&details);
					if let Some(outcome) = MonitorOutcome::from_status(&details.status) {
						return self.finish(order_id, outcome, Some(details), &fetches, None);
					}
					last_details = Some(details);
				},
				Err(e) => {
					tracing::error!(error = %e, "Stopped monitoring");
					return self.finish(
						order_id,
						MonitorOutcome::Errored,
						last_details,
						&fetches,
						Some(e.to_string()),
					);
				},
			}

			// The last sleep stops at the deadline so the final fetch is not late.
			let remaining = self.settings.timeout.saturating_sub(start_time.elapsed());
			tokio::select! {
				_ = cancel.cancelled() => {
					tracing::warn!("Monitoring interrupted");
					return self.finish(order_id, MonitorOutcome::Interrupted, last_details, &fetches, None);
				}
				_ = tokio::time::sleep(self.settings.poll_interval.min(remaining)) => {}
			}
		}

		tracing::warn!(
			elapsed_secs = start_time.elapsed().as_secs(),
			"Monitoring timeout reached"
		);

		match self.fetch_status(order_id, &fetches).await {
			Ok(details) => {
				self.publish_status(&details);
				let outcome =
					MonitorOutcome::from_status(&details.status).unwrap_or(MonitorOutcome::TimedOut);
				self.finish(order_id, outcome, Some(details), &fetches, None)
			},
			Err(e) => self.finish(
				order_id,
				MonitorOutcome::Errored,
				last_details,
				&fetches,
				Some(e.to_string()),
			),
		}
	}

	/// Fetches the order once, retrying transient failures per the retry policy.
	async fn fetch_status(
		&self,
		order_id: &str,
		fetches: &AtomicU32,
	) -> Result<OrderDetails, StatusFetchError> {
		let attempts = AtomicU32::new(0);
		let attempts_ref = &attempts;
		let orderbook = &self.orderbook;
		let max_retries = self.settings.retry.max_retries;

		let result = backoff::future::retry(self.settings.retry.backoff(), move || async move {
			let attempt = attempts_ref.fetch_add(1, Ordering::SeqCst) + 1;
			fetches.fetch_add(1, Ordering::SeqCst);
			match orderbook.order(order_id).await {
				Ok(details) => Ok(details),
				Err(e) if e.is_transient() && attempt <= max_retries => {
					tracing::warn!(attempt, error = %e, "Status fetch failed, retrying");
					Err(backoff::Error::transient(e))
				},
				Err(e) => Err(backoff::Error::permanent(e)),
			}
		})
		.await;

		result.map_err(|source| StatusFetchError {
			attempts: attempts.load(Ordering::SeqCst),
			source,
		})
	}

	fn publish_status(&self, details: &OrderDetails) {
		tracing::info!(status = %details.status, "Order status");
		self.event_bus
			.publish(SwapEvent::StatusUpdate {
				status: details.status.clone(),
			})
			.ok();
	}

	fn finish(
		&self,
		order_id: &str,
		outcome: MonitorOutcome,
		last_details: Option<OrderDetails>,
		fetches: &AtomicU32,
		error: Option<String>,
	) -> MonitorReport {
		let event = match outcome {
			MonitorOutcome::TimedOut => SwapEvent::MonitorTimeout,
			outcome => SwapEvent::MonitorTerminal { outcome },
		};
		self.event_bus.publish(event).ok();

		let fetches = fetches.load(Ordering::SeqCst);
		tracing::info!(%outcome, fetches, "Monitoring finished");

		MonitorReport {
			order_id: order_id.to_string(),
			outcome,
			last_details,
			fetches,
			error,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::test_support::{FakeBook, StatusStep};
	use swap_types::OrderStatus;
	use StatusStep::{Status, TransportError};

	const UID: &str = "0xabababababababababababababab";

	fn settings(timeout: u64, poll_interval: u64, max_retries: u32) -> MonitorSettings {
		MonitorSettings {
			timeout: Duration::from_secs(timeout),
			poll_interval: Duration::from_secs(poll_interval),
			retry: StatusRetryPolicy {
				max_retries,
				initial_backoff: Duration::from_millis(500),
				max_backoff: Duration::from_secs(5),
			},
		}
	}

	fn monitor(
		statuses: Vec<StatusStep>,
		settings: MonitorSettings,
	) -> (
		OrderMonitor,
		Arc<crate::test_support::BookState>,
		tokio::sync::broadcast::Receiver<SwapEvent>,
	) {
		let (orderbook, book) = FakeBook::service(statuses);
		let bus = EventBus::new(256);
		let rx = bus.subscribe();
		(OrderMonitor::new(orderbook, bus, settings), book, rx)
	}

	fn drain(rx: &mut tokio::sync::broadcast::Receiver<SwapEvent>) -> Vec<SwapEvent> {
		let mut events = Vec::new();
		while let Ok(event) = rx.try_recv() {
			events.push(event);
		}
		events
	}

	#[tokio::test(start_paused = true)]
	async fn test_fulfilled_after_three_fetches() {
		let (monitor, book, mut rx) = monitor(
			vec![Status("open"), Status("open"), Status("fulfilled")],
			settings(600, 30, 0),
		);

		let report = monitor.monitor(UID, &CancellationToken::new()).await;

		assert_eq!(report.outcome, MonitorOutcome::Fulfilled);
		assert_eq!(report.fetches, 3);
		assert_eq!(book.status_count(), 3);
		assert_eq!(
			drain(&mut rx),
			vec![
				SwapEvent::StatusUpdate {
					status: OrderStatus::Pending
				},
				SwapEvent::StatusUpdate {
					status: OrderStatus::Pending
				},
				SwapEvent::StatusUpdate {
					status: OrderStatus::Fulfilled
				},
				SwapEvent::MonitorTerminal {
					outcome: MonitorOutcome::Fulfilled
				},
			]
		);
	}

	#[tokio::test(start_paused = true)]
	async fn test_cancelled_and_expired_are_terminal() {
		for (wire, outcome) in [
			("cancelled", MonitorOutcome::Cancelled),
			("expired", MonitorOutcome::Expired),
		] {
			let (monitor, book, _rx) = monitor(vec![Status(wire)], settings(600, 30, 0));
			let report = monitor.monitor(UID, &CancellationToken::new()).await;
			assert_eq!(report.outcome, outcome);
			assert_eq!(book.status_count(), 1);
		}
	}

	#[tokio::test(start_paused = true)]
	async fn test_timeout_polls_then_one_final_fetch() {
		let (monitor, book, mut rx) = monitor(vec![], settings(600, 30, 0));
		let started = tokio::time::Instant::now();

		let report = monitor.monitor(UID, &CancellationToken::new()).await;

		assert_eq!(report.outcome, MonitorOutcome::TimedOut);
		// ceil(600 / 30) polls plus the final fetch.
		assert_eq!(book.status_count(), 21);
		assert_eq!(report.fetches, 21);
		assert!(started.elapsed() >= Duration::from_secs(600));
		assert_eq!(report.last_details.unwrap().status, OrderStatus::Pending);

		let events = drain(&mut rx);
		assert_eq!(events.len(), 22);
		assert_eq!(events.last(), Some(&SwapEvent::MonitorTimeout));
	}

	#[tokio::test(start_paused = true)]
	async fn test_timeout_not_multiple_of_interval() {
		let (monitor, book, _rx) = monitor(vec![], settings(100, 30, 0));
		let started = tokio::time::Instant::now();

		let report = monitor.monitor(UID, &CancellationToken::new()).await;

		assert_eq!(report.outcome, MonitorOutcome::TimedOut);
		assert_eq!(book.status_count(), 4 + 1);
		// Polls at 0, 30, 60 and 90s; the final fetch happens at the deadline, not at 120s.
		let elapsed = started.elapsed();
		assert!(elapsed >= Duration::from_secs(100));
		assert!(elapsed < Duration::from_secs(120));
	}

	#[tokio::test(start_paused = true)]
	async fn test_final_fetch_reports_late_fill() {
		let (monitor, book, mut rx) = monitor(
			vec![Status("open"), Status("open"), Status("fulfilled")],
			settings(45, 30, 0),
		);

		let report = monitor.monitor(UID, &CancellationToken::new()).await;

		assert_eq!(report.outcome, MonitorOutcome::Fulfilled);
		assert_eq!(book.status_count(), 3);
		assert_eq!(
			drain(&mut rx).last(),
			Some(&SwapEvent::MonitorTerminal {
				outcome: MonitorOutcome::Fulfilled
			})
		);
	}

	#[tokio::test(start_paused = true)]
	async fn test_fetch_error_without_retries() {
		let (monitor, book, mut rx) = monitor(
			vec![Status("open"), TransportError, Status("fulfilled")],
			settings(600, 30, 0),
		);

		let report = monitor.monitor(UID, &CancellationToken::new()).await;

		assert_eq!(report.outcome, MonitorOutcome::Errored);
		assert_eq!(book.status_count(), 2);
		assert!(report.error.unwrap().contains("connection reset"));
		assert_eq!(
			drain(&mut rx).last(),
			Some(&SwapEvent::MonitorTerminal {
				outcome: MonitorOutcome::Errored
			})
		);
	}

	#[tokio::test(start_paused = true)]
	async fn test_transient_errors_are_retried() {
		let (monitor, book, _rx) = monitor(
			vec![TransportError, TransportError, Status("open"), Status("fulfilled")],
			settings(600, 30, 3),
		);

		let report = monitor.monitor(UID, &CancellationToken::new()).await;

		assert_eq!(report.outcome, MonitorOutcome::Fulfilled);
		assert_eq!(book.status_count(), 4);
	}

	#[tokio::test(start_paused = true)]
	async fn test_retries_exhausted() {
		let (monitor, book, _rx) = monitor(
			vec![TransportError, TransportError, TransportError, Status("fulfilled")],
			settings(600, 30, 2),
		);

		let report = monitor.monitor(UID, &CancellationToken::new()).await;

		assert_eq!(report.outcome, MonitorOutcome::Errored);
		assert_eq!(book.status_count(), 3);
		assert!(report.error.unwrap().contains("3 attempt"));
	}

	#[tokio::test(start_paused = true)]
	async fn test_unknown_status_keeps_polling() {
		let (monitor, book, _rx) = monitor(
			vec![Status("somethingNew"), Status("fulfilled")],
			settings(600, 30, 0),
		);

		let report = monitor.monitor(UID, &CancellationToken::new()).await;

		assert_eq!(report.outcome, MonitorOutcome::Fulfilled);
		assert_eq!(book.status_count(), 2);
	}

	#[tokio::test(start_paused = true)]
	async fn test_cancellation_interrupts_sleep() {
		let (monitor, book, mut rx) = monitor(vec![], settings(600, 30, 0));
		let token = CancellationToken::new();
		let canceller = {
			let token = token.clone();
			async move {
				tokio::time::sleep(Duration::from_secs(45)).await;
				token.cancel();
			}
		};

		let (report, _) = tokio::join!(monitor.monitor(UID, &token), canceller);

		assert_eq!(report.outcome, MonitorOutcome::Interrupted);
		assert_eq!(book.status_count(), 2);
		assert_eq!(
			drain(&mut rx).last(),
			Some(&SwapEvent::MonitorTerminal {
				outcome: MonitorOutcome::Interrupted
			})
		);
	}

	#[test]
	fn test_settings_from_config() {
		let config = MonitorConfig {
			timeout_seconds: 600,
			poll_interval_seconds: 30,
			max_retries: 3,
			retry_initial_backoff_ms: 1000,
			retry_max_backoff_ms: 30000,
		};
		let settings = MonitorSettings::from(&config);
		assert_eq!(settings.timeout, Duration::from_secs(600));
		assert_eq!(settings.poll_interval, Duration::from_secs(30));
		assert_eq!(settings.retry.max_retries, 3);
		assert_eq!(settings.retry.max_backoff, Duration::from_secs(30));
	}
}
