//! Cryptographic primitives.

pub mod encryption;

pub use encryption::{EncryptedData, EncryptionService};
