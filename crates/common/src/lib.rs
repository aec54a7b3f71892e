//! # LedgerSync Common
//!
//! Reusable building blocks shared across the LedgerSync crates:
//!
//! - `auth`: OAuth2 client, credential store, and token manager
//! - `cache`: thread-safe TTL cache
//! - `crypto`: AES-256-GCM encryption primitives
//! - `storage`: narrow key/value settings-store abstraction
//!
//! This crate has no dependency on the other LedgerSync crates.

pub mod auth;
pub mod cache;
pub mod crypto;
pub mod error;
pub mod storage;

pub use error::{CommonError, CommonResult};
