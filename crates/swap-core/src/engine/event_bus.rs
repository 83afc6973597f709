//! Broadcast channel carrying swap lifecycle events.
//!
//! Every stage publishes onto the same bus; any number of subscribers (the CLI
//! event printer, tests) observe the events in publication order.

use swap_types::SwapEvent;
use tokio::sync::broadcast;

/// Cloneable handle to the event channel.
#[derive(Clone)]
pub struct EventBus {
	sender: broadcast::Sender<SwapEvent>,
}

impl EventBus {
	/// Creates a bus that buffers up to `capacity` events per lagging subscriber.
	pub fn new(capacity: usize) -> Self {
		let (sender, _) = broadcast::channel(capacity);
		Self { sender }
	}

	pub fn subscribe(&self) -> broadcast::Receiver<SwapEvent> {
		self.sender.subscribe()
	}

	/// Publishes an event. Fails only when nobody is subscribed.
	pub fn publish(&self, event: SwapEvent) -> Result<(), broadcast::error::SendError<SwapEvent>> {
		tracing::debug!(?event, "Publishing event");
		self.sender.send(event).map(|_| ())
	}
}
