//! Typed stages of a swap, in execution order after the network check.

pub mod allowance;
pub mod build;
pub mod quote;
pub mod sign;
pub mod submit;

pub use allowance::{AllowanceError, AllowanceManager};
pub use build::OrderBuilder;
pub use quote::{QuoteError, QuoteService};
pub use sign::{OrderSigner, SigningError};
pub use submit::{OrderSubmitter, SubmissionError};
