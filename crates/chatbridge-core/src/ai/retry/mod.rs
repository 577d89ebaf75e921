//! Retry support for provider calls
//!
//! Nothing in the dispatch path retries on its own; callers opt in.

pub mod backoff;

pub use backoff::{parse_retry_after, with_retry, IsRetryable, RetryConfig};
