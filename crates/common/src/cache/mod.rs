//! Caching utilities.

pub mod ttl;

pub use ttl::{Clock, SystemClock, TtlCache};
