//! Monitoring of submitted orders.
//!
//! Tracks an order from submission until the order book reports a terminal
//! status, publishing one status event per poll.

pub mod order;

pub use order::{MonitorReport, MonitorSettings, OrderMonitor, StatusFetchError, StatusRetryPolicy};
