//! Mark-and-sweep cache for per-frame derived objects.
//!
//! Each display pass touches the entries it needs with [`UsageCache::get`] or
//! [`UsageCache::mark_used`], then calls [`UsageCache::sweep`] exactly once.
//! The sweep disposes every entry that was not touched since the previous
//! sweep.
//!
//! # Epochs
//!
//! The cache keeps an epoch counter that advances on every sweep. Touching an
//! entry stamps it with the current epoch; a sweep removes entries stamped
//! with an older one. An entry created or fetched during a pass therefore
//! survives that pass's sweep even if `mark_used` was never called for it.
//!
//! ```
//! use genome_tiles::usage_cache::UsageCache;
//!
//! let mut cache: UsageCache<&str, u32> = UsageCache::new();
//! cache.get("a", || 1);
//! cache.get("b", || 2);
//! cache.sweep(|_, _| {});
//!
//! cache.mark_used(&"a");
//! let mut disposed = Vec::new();
//! cache.sweep(|key, _| disposed.push(key));
//! assert_eq!(disposed, vec!["b"]);
//! ```

use std::collections::HashMap;
use std::hash::Hash;

struct Entry<V> {
    value: V,
    last_marked: u64,
}

/// Key-value store with usage-based eviction.
pub struct UsageCache<K, V> {
    entries: HashMap<K, Entry<V>>,
    epoch: u64,
}

impl<K, V> UsageCache<K, V>
where
    K: Eq + Hash + Clone,
{
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            epoch: 0,
        }
    }

    /// Returns the entry for `key`, creating it with `factory` if absent.
    ///
    /// `factory` runs at most once per key between evictions. The entry is
    /// stamped as used for the current epoch.
    pub fn get<F>(&mut self, key: K, factory: F) -> &mut V
    where
        F: FnOnce() -> V,
    {
        let epoch = self.epoch;
        let entry = self.entries.entry(key).or_insert_with(|| Entry {
            value: factory(),
            last_marked: epoch,
        });
        entry.last_marked = epoch;
        &mut entry.value
    }

    /// Marks `key` as alive for the current pass.
    ///
    /// Returns false if the key is not in the cache.
    pub fn mark_used(&mut self, key: &K) -> bool {
        match self.entries.get_mut(key) {
            Some(entry) => {
                entry.last_marked = self.epoch;
                true
            }
            None => false,
        }
    }

    /// Removes and disposes every entry not used since the previous sweep.
    ///
    /// Each removed entry is handed to `dispose` exactly once. Returns the
    /// number of disposed entries.
    pub fn sweep<D>(&mut self, mut dispose: D) -> usize
    where
        D: FnMut(K, V),
    {
        let epoch = self.epoch;
        let stale: Vec<K> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.last_marked < epoch)
            .map(|(key, _)| key.clone())
            .collect();

        for key in &stale {
            if let Some(entry) = self.entries.remove(key) {
                dispose(key.clone(), entry.value);
            }
        }

        self.epoch += 1;
        stale.len()
    }

    /// Disposes every entry immediately, regardless of usage.
    pub fn remove_all<D>(&mut self, mut dispose: D) -> usize
    where
        D: FnMut(K, V),
    {
        let count = self.entries.len();
        for (key, entry) in self.entries.drain() {
            dispose(key, entry.value);
        }
        count
    }

    /// Looks up an entry without touching its usage stamp.
    pub fn peek(&self, key: &K) -> Option<&V> {
        self.entries.get(key).map(|entry| &entry.value)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of sweeps performed so far.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.entries.iter().map(|(key, entry)| (key, &entry.value))
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut V> {
        self.entries.values_mut().map(|entry| &mut entry.value)
    }
}

impl<K, V> Default for UsageCache<K, V>
where
    K: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}
