//! Order synchronization engine.

pub mod engine;
pub mod ports;

pub use engine::OrderSyncEngine;
