//! Background scheduling.
//!
//! Explicit lifecycle management throughout: join handles are tracked,
//! cancellation is cooperative, and stop waits with a timeout.

pub mod retry_scheduler;

pub use retry_scheduler::{RetryScheduler, RetrySchedulerConfig};
