//! Order lifecycle core for the swap client.
//!
//! Chains the lifecycle stages (quote, allowance, build, sign, submit and
//! monitor) into a [`SwapPipeline`], publishes progress on an [`EventBus`] and
//! provides the [`SwapBuilder`] that wires the pipeline from configuration.

pub mod builder;
pub mod engine;
pub mod monitoring;
pub mod stages;

#[cfg(test)]
mod test_support;

pub use builder::{BuilderError, SwapBuilder, SwapFactories};
pub use engine::event_bus::EventBus;
pub use engine::{
	InterruptHandle, PipelineSettings, SwapError, SwapPipeline, SwapReport, SwapRequest,
};
pub use monitoring::{MonitorReport, MonitorSettings, OrderMonitor, StatusRetryPolicy};
