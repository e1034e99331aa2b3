//! Bounded memoization of derived keys.
//!
//! PBKDF2 at deployed round counts is far too expensive to repeat on every
//! scan pass over the same chat, so derived keys are cached. The cache is an
//! optimization, never a security boundary: it must not be relied on to limit
//! key lifetime.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;
use zeroize::Zeroize;

use crate::kdf::{derive_key, DerivedKey};
use crate::types::{KeyPurpose, KEY_CACHE_CAPACITY};

/// Cache entry. Keyed by (purpose, salt, passphrase); the iteration count is
/// deliberately not part of the key, so schemes sharing a salt reuse whichever
/// key was derived first for that salt.
struct CacheEntry {
    purpose: KeyPurpose,
    salt: String,
    passphrase: String,
    key: Arc<DerivedKey>,
}

impl CacheEntry {
    fn matches(&self, purpose: KeyPurpose, salt: &str, passphrase: &str) -> bool {
        self.purpose == purpose && self.salt == salt && self.passphrase == passphrase
    }
}

impl Drop for CacheEntry {
    fn drop(&mut self) {
        self.passphrase.zeroize();
    }
}

/// Passphrase derivation with a bounded, insertion-order-evicting key cache.
///
/// A hit returns the identical [`DerivedKey`] handle without re-deriving. On a
/// miss at capacity, the single oldest-inserted entry is evicted first; hits do
/// not refresh an entry's position (FIFO, not LRU). Construct one per engine;
/// this is never a hidden global.
pub struct KeyDerivation {
    capacity: usize,
    entries: Mutex<VecDeque<CacheEntry>>,
    derivations: AtomicU64,
}

impl KeyDerivation {
    pub fn new() -> Self {
        Self::with_capacity(KEY_CACHE_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
            derivations: AtomicU64::new(0),
        }
    }

    /// Memoized [`derive_key`].
    ///
    /// Concurrent misses for the same triple may both pay for PBKDF2, but both
    /// observe the handle that landed in the cache first.
    pub fn derive(
        &self,
        passphrase: &str,
        salt: &str,
        purpose: KeyPurpose,
        iterations: u32,
    ) -> Arc<DerivedKey> {
        if let Some(key) = self.lookup(purpose, salt, passphrase) {
            return key;
        }

        // Derive outside the lock: PBKDF2 runs for hundreds of thousands of
        // rounds and must not block concurrent cache hits.
        self.derivations.fetch_add(1, Ordering::Relaxed);
        let key = Arc::new(derive_key(passphrase, salt, purpose, iterations));

        let mut entries = self.entries.lock();
        // A racing scan pass may have inserted the same triple meanwhile;
        // keep the resident handle so hits stay identical.
        if let Some(entry) = entries
            .iter()
            .find(|e| e.matches(purpose, salt, passphrase))
        {
            return entry.key.clone();
        }
        if entries.len() >= self.capacity {
            entries.pop_front();
            debug!(capacity = self.capacity, "key cache full, evicted oldest entry");
        }
        entries.push_back(CacheEntry {
            purpose,
            salt: salt.to_string(),
            passphrase: passphrase.to_string(),
            key: key.clone(),
        });
        key
    }

    fn lookup(&self, purpose: KeyPurpose, salt: &str, passphrase: &str) -> Option<Arc<DerivedKey>> {
        let entries = self.entries.lock();
        entries
            .iter()
            .find(|e| e.matches(purpose, salt, passphrase))
            .map(|e| e.key.clone())
    }

    /// Number of PBKDF2 runs performed so far. Key handles are opaque, so this
    /// counter is the observation point for cache behavior.
    pub fn derivation_count(&self) -> u64 {
        self.derivations.load(Ordering::Relaxed)
    }

    /// Number of currently cached keys.
    pub fn cached_keys(&self) -> usize {
        self.entries.lock().len()
    }
}

impl Default for KeyDerivation {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FAST_ITERS: u32 = 16;

    #[test]
    fn hit_returns_identical_handle() {
        let kd = KeyDerivation::new();
        let a = kd.derive("pass", "salt", KeyPurpose::Decrypt, FAST_ITERS);
        let b = kd.derive("pass", "salt", KeyPurpose::Decrypt, FAST_ITERS);
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(kd.derivation_count(), 1);
    }

    #[test]
    fn purpose_is_part_of_the_cache_key() {
        let kd = KeyDerivation::new();
        kd.derive("pass", "salt", KeyPurpose::Encrypt, FAST_ITERS);
        kd.derive("pass", "salt", KeyPurpose::Decrypt, FAST_ITERS);
        assert_eq!(kd.derivation_count(), 2);
        assert_eq!(kd.cached_keys(), 2);
    }

    #[test]
    fn iteration_count_is_not_part_of_the_cache_key() {
        let kd = KeyDerivation::new();
        let a = kd.derive("pass", "salt", KeyPurpose::Decrypt, FAST_ITERS);
        let b = kd.derive("pass", "salt", KeyPurpose::Decrypt, FAST_ITERS + 100);
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(kd.derivation_count(), 1);
    }

    #[test]
    fn evicts_oldest_inserted_at_capacity() {
        let kd = KeyDerivation::new();
        for i in 0..=KEY_CACHE_CAPACITY {
            kd.derive(&format!("pass-{}", i), "salt", KeyPurpose::Decrypt, FAST_ITERS);
        }
        assert_eq!(kd.cached_keys(), KEY_CACHE_CAPACITY);
        assert_eq!(kd.derivation_count(), (KEY_CACHE_CAPACITY + 1) as u64);

        // The first-inserted entry is gone: asking for it re-derives.
        kd.derive("pass-0", "salt", KeyPurpose::Decrypt, FAST_ITERS);
        assert_eq!(kd.derivation_count(), (KEY_CACHE_CAPACITY + 2) as u64);

        // The most recent entries are still resident.
        let count = kd.derivation_count();
        kd.derive(
            &format!("pass-{}", KEY_CACHE_CAPACITY),
            "salt",
            KeyPurpose::Decrypt,
            FAST_ITERS,
        );
        assert_eq!(kd.derivation_count(), count);
    }

    #[test]
    fn eviction_is_fifo_not_lru() {
        let kd = KeyDerivation::with_capacity(2);
        kd.derive("a", "salt", KeyPurpose::Decrypt, FAST_ITERS);
        kd.derive("b", "salt", KeyPurpose::Decrypt, FAST_ITERS);
        // Hit "a"; under LRU this would protect it. Under FIFO it does not.
        kd.derive("a", "salt", KeyPurpose::Decrypt, FAST_ITERS);
        kd.derive("c", "salt", KeyPurpose::Decrypt, FAST_ITERS);
        assert_eq!(kd.derivation_count(), 3);

        // "a" was evicted despite the recent hit; "c" is still resident.
        kd.derive("c", "salt", KeyPurpose::Decrypt, FAST_ITERS);
        assert_eq!(kd.derivation_count(), 3);
        kd.derive("a", "salt", KeyPurpose::Decrypt, FAST_ITERS);
        assert_eq!(kd.derivation_count(), 4);
    }
}
