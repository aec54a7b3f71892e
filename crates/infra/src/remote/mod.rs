//! Remote accounting service access.

pub mod client;

pub use client::RemoteClient;
