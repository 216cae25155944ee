//! In-memory byte cache owned by each provider.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Raw document bytes keyed by normalized locator.
///
/// Entries live until [`Cache::reset`] is called; there is no expiry and
/// no size bound. Lookups hand out owned copies, so clearing the cache
/// never affects bytes a caller already holds.
#[derive(Debug, Default)]
pub struct Cache {
    entries: RwLock<HashMap<String, Vec<u8>>>,
}

impl Cache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up cached bytes without touching any backing store.
    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.read().get(key).cloned()
    }

    /// Store bytes for `key`, replacing any previous entry.
    pub fn set(&self, key: impl Into<String>, bytes: Vec<u8>) {
        self.write().insert(key.into(), bytes);
    }

    /// True if `key` has an entry.
    pub fn contains(&self, key: &str) -> bool {
        self.read().contains_key(key)
    }

    /// Drop every entry.
    pub fn reset(&self) {
        self.write().clear();
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// True when nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    // The map only ever holds complete entries, so a panic in another
    // thread cannot leave it inconsistent; keep serving after poisoning.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Vec<u8>>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Vec<u8>>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn get_missing_returns_none() {
        let cache = Cache::new();
        assert_eq!(cache.get("file:///a.json"), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn set_then_get() {
        let cache = Cache::new();
        cache.set("file:///a.json", b"{}".to_vec());
        assert_eq!(cache.get("file:///a.json"), Some(b"{}".to_vec()));
        assert!(cache.contains("file:///a.json"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn set_overwrites() {
        let cache = Cache::new();
        cache.set("k", b"1".to_vec());
        cache.set("k", b"2".to_vec());
        assert_eq!(cache.get("k"), Some(b"2".to_vec()));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn reset_clears_but_keeps_returned_bytes() {
        let cache = Cache::new();
        cache.set("k", b"[1,2]".to_vec());
        let held = cache.get("k").unwrap();

        cache.reset();

        assert!(cache.is_empty());
        assert_eq!(cache.get("k"), None);
        assert_eq!(held, b"[1,2]".to_vec());
    }

    #[test]
    fn concurrent_writers_do_not_corrupt() {
        let cache = Arc::new(Cache::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || {
                    for j in 0..50 {
                        cache.set(format!("k{}", j % 10), vec![i as u8]);
                        let _ = cache.get("k0");
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(cache.len(), 10);
        assert_eq!(cache.get("k0").map(|b| b.len()), Some(1));
    }
}
