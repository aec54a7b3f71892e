//! Key/value settings-store abstraction.
//!
//! The host platform owns the real persistence mechanics; this module only
//! defines the narrow interface the sync core consumes, plus an in-memory
//! implementation used in tests and wiring examples.

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::error::CommonResult;

/// Narrow interface over the host's persistent key/value settings.
pub trait SettingsStore: Send + Sync {
    /// Read a value, `None` when the key has never been written.
    fn get(&self, key: &str) -> CommonResult<Option<String>>;

    /// Write a value, overwriting any previous one atomically.
    fn set(&self, key: &str, value: &str) -> CommonResult<()>;

    /// Remove a key; removing a missing key is not an error.
    fn remove(&self, key: &str) -> CommonResult<()>;
}

/// In-memory settings store.
#[derive(Debug, Default)]
pub struct MemorySettingsStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemorySettingsStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsStore for MemorySettingsStore {
    fn get(&self, key: &str) -> CommonResult<Option<String>> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> CommonResult<()> {
        self.entries.write().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> CommonResult<()> {
        self.entries.write().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_get_remove_round_trip() {
        let store = MemorySettingsStore::new();
        assert_eq!(store.get("k").unwrap(), None);

        store.set("k", "v1").unwrap();
        assert_eq!(store.get("k").unwrap(), Some("v1".to_string()));

        store.set("k", "v2").unwrap();
        assert_eq!(store.get("k").unwrap(), Some("v2".to_string()));

        store.remove("k").unwrap();
        assert_eq!(store.get("k").unwrap(), None);
    }
}
