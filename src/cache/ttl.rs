//! Generic in-memory cache with per-entry absolute expiry.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

struct Entry<V> {
  value: V,
  expires_at: Instant,
}

/// Key/value store where every entry expires independently.
///
/// An expired entry is indistinguishable from one that was never set; expiry
/// is the only eviction (no size bound, no LRU). Clones share the underlying
/// store, so a single cache can serve many concurrent readers and writers.
/// Writes are last-write-wins.
pub struct TtlCache<K, V> {
  entries: Arc<Mutex<HashMap<K, Entry<V>>>>,
}

impl<K: Eq + Hash, V: Clone> TtlCache<K, V> {
  pub fn new() -> Self {
    Self {
      entries: Arc::new(Mutex::new(HashMap::new())),
    }
  }

  fn lock(&self) -> MutexGuard<'_, HashMap<K, Entry<V>>> {
    // A poisoned lock only means a writer panicked mid-insert; the map
    // itself is still usable.
    self.entries.lock().unwrap_or_else(PoisonError::into_inner)
  }

  /// Get the value for `key` if present and not yet expired.
  ///
  /// An entry past its expiry is dropped and reported as absent.
  pub fn get(&self, key: &K) -> Option<V> {
    let mut entries = self.lock();
    match entries.get(key) {
      Some(entry) if entry.expires_at > Instant::now() => Some(entry.value.clone()),
      Some(_) => {
        entries.remove(key);
        None
      }
      None => None,
    }
  }

  /// Store `value` under `key`, expiring `ttl` from now.
  ///
  /// Unconditionally replaces any previous entry for the key.
  pub fn set(&self, key: K, value: V, ttl: Duration) {
    let entry = Entry {
      value,
      expires_at: Instant::now() + ttl,
    };
    self.lock().insert(key, entry);
  }

  /// Explicit hit/miss variant of [`get`](Self::get): `(true, Some(value))`
  /// on a hit, `(false, None)` on a miss or an expired entry.
  #[allow(dead_code)]
  pub fn try_get(&self, key: &K) -> (bool, Option<V>) {
    let value = self.get(key);
    (value.is_some(), value)
  }
}

impl<K, V> Clone for TtlCache<K, V> {
  fn clone(&self) -> Self {
    Self {
      entries: Arc::clone(&self.entries),
    }
  }
}

impl<K: Eq + Hash, V: Clone> Default for TtlCache<K, V> {
  fn default() -> Self {
    Self::new()
  }
}
