//! Local-to-remote entity mapping.

pub mod ports;
pub mod service;

pub use service::MappingService;
