//! Thread-safe TTL cache.
//!
//! An explicit cache abstraction (key, value, TTL): populated on miss by
//! the caller, invalidated explicitly on refresh actions. Entries expire
//! lazily on access.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

use parking_lot::RwLock;

/// Clock abstraction so expiry can be tested deterministically.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Clock backed by [`Instant::now`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    inserted_at: Instant,
}

/// Generic thread-safe cache with per-cache TTL expiration.
///
/// # Type Parameters
/// - `K`: Key type (must be `Eq + Hash + Clone`)
/// - `V`: Value type (must be `Clone`)
/// - `C`: Clock type for time-based operations (defaults to `SystemClock`)
pub struct TtlCache<K, V, C = SystemClock>
where
    K: Eq + Hash + Clone,
    V: Clone,
    C: Clock,
{
    entries: RwLock<HashMap<K, CacheEntry<V>>>,
    ttl: Duration,
    clock: C,
}

impl<K, V> TtlCache<K, V, SystemClock>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Create a new cache with the given TTL using the system clock.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, SystemClock)
    }
}

impl<K, V, C> TtlCache<K, V, C>
where
    K: Eq + Hash + Clone,
    V: Clone,
    C: Clock,
{
    /// Create a new cache with a custom clock (useful for testing).
    pub fn with_clock(ttl: Duration, clock: C) -> Self {
        Self { entries: RwLock::new(HashMap::new()), ttl, clock }
    }

    /// Get a value if present and not expired.
    pub fn get(&self, key: &K) -> Option<V> {
        let now = self.clock.now();

        {
            let entries = self.entries.read();
            let entry = entries.get(key)?;
            if now.duration_since(entry.inserted_at) < self.ttl {
                return Some(entry.value.clone());
            }
        }

        // Expired; drop it so the map does not grow unbounded.
        self.entries.write().remove(key);
        None
    }

    /// Insert a value, resetting its TTL.
    pub fn insert(&self, key: K, value: V) {
        let entry = CacheEntry { value, inserted_at: self.clock.now() };
        self.entries.write().insert(key, entry);
    }

    /// Remove a single key.
    pub fn invalidate(&self, key: &K) {
        self.entries.write().remove(key);
    }

    /// Remove everything.
    pub fn clear(&self) {
        self.entries.write().clear();
    }

    /// Number of entries currently stored, including not-yet-evicted
    /// expired ones.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// True when the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use parking_lot::Mutex;

    use super::*;

    /// Clock whose current instant is advanced by hand.
    #[derive(Clone)]
    struct ManualClock {
        now: Arc<Mutex<Instant>>,
    }

    impl ManualClock {
        fn new() -> Self {
            Self { now: Arc::new(Mutex::new(Instant::now())) }
        }

        fn advance(&self, by: Duration) {
            let mut now = self.now.lock();
            *now += by;
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> Instant {
            *self.now.lock()
        }
    }

    #[test]
    fn get_returns_fresh_values() {
        let cache: TtlCache<&str, i32> = TtlCache::new(Duration::from_secs(60));
        cache.insert("k", 42);
        assert_eq!(cache.get(&"k"), Some(42));
    }

    #[test]
    fn values_expire_after_ttl() {
        let clock = ManualClock::new();
        let cache: TtlCache<&str, i32, _> =
            TtlCache::with_clock(Duration::from_secs(60), clock.clone());

        cache.insert("k", 1);
        clock.advance(Duration::from_secs(59));
        assert_eq!(cache.get(&"k"), Some(1));

        clock.advance(Duration::from_secs(2));
        assert_eq!(cache.get(&"k"), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn insert_resets_ttl() {
        let clock = ManualClock::new();
        let cache: TtlCache<&str, i32, _> =
            TtlCache::with_clock(Duration::from_secs(10), clock.clone());

        cache.insert("k", 1);
        clock.advance(Duration::from_secs(8));
        cache.insert("k", 2);
        clock.advance(Duration::from_secs(8));
        assert_eq!(cache.get(&"k"), Some(2));
    }

    #[test]
    fn invalidate_and_clear_drop_entries() {
        let cache: TtlCache<&str, i32> = TtlCache::new(Duration::from_secs(60));
        cache.insert("a", 1);
        cache.insert("b", 2);

        cache.invalidate(&"a");
        assert_eq!(cache.get(&"a"), None);
        assert_eq!(cache.get(&"b"), Some(2));

        cache.clear();
        assert!(cache.is_empty());
    }
}
