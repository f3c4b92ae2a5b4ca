//! Resilience patterns for the platform's services:
//! - **Retry**: bounded attempts with exponential backoff and jitter,
//!   gated by a caller-supplied retryability predicate
//! - **Timeout**: time limits on external calls
//!
//! The store layer is the main consumer here: transient storage
//! unavailability is retried a small fixed number of times and then
//! surfaced, while permanent errors fail on the first attempt.

pub mod retry;
pub mod timeout;

pub use retry::{with_retry, RetryConfig};
pub use timeout::{with_timeout, TimeoutError};
