//! Central registry mapping cache names to typed cache instances.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use super::{CachePolicy, TypedCache};

/// Process-wide registry of named caches.
///
/// Two callers asking for the same name and types share one cache; the
/// first caller's policy wins.
#[derive(Clone, Default)]
pub struct CacheRegistry {
    caches: Arc<RwLock<HashMap<String, Entry>>>,
}

struct Entry {
    cache: Box<dyn Any + Send + Sync>,
    type_id: TypeId,
    type_name: &'static str,
}

impl CacheRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch an existing cache or create one with the given policy.
    ///
    /// # Panics
    /// Panics if a cache with this name exists under different key/value
    /// types; that is a wiring bug, not a runtime condition.
    pub fn get_or_create<K, V>(&self, name: &str, policy: CachePolicy) -> TypedCache<K, V>
    where
        K: Hash + Eq + Send + Sync + 'static,
        V: Clone + Send + Sync + 'static,
    {
        let expected = TypeId::of::<TypedCache<K, V>>();

        {
            let caches = self.caches.read();
            if let Some(entry) = caches.get(name) {
                if entry.type_id != expected {
                    panic!(
                        "cache '{}' already registered as {}, requested {}",
                        name,
                        entry.type_name,
                        std::any::type_name::<TypedCache<K, V>>()
                    );
                }
                return entry
                    .cache
                    .downcast_ref::<TypedCache<K, V>>()
                    .unwrap()
                    .clone();
            }
        }

        let mut caches = self.caches.write();
        // Re-check under the write lock; another task may have raced us.
        if let Some(entry) = caches.get(name) {
            return entry
                .cache
                .downcast_ref::<TypedCache<K, V>>()
                .unwrap()
                .clone();
        }

        debug!(cache = name, "creating cache");
        let cache = TypedCache::new(name, policy);
        caches.insert(
            name.to_string(),
            Entry {
                cache: Box::new(cache.clone()),
                type_id: expected,
                type_name: std::any::type_name::<TypedCache<K, V>>(),
            },
        );
        cache
    }

    pub fn len(&self) -> usize {
        self.caches.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.caches.read().is_empty()
    }
}

impl std::fmt::Debug for CacheRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let caches = self.caches.read();
        f.debug_struct("CacheRegistry")
            .field("caches", &caches.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_name_shares_cache() {
        let registry = CacheRegistry::new();
        let a: TypedCache<i64, String> = registry.get_or_create("t", CachePolicy::default());
        let b: TypedCache<i64, String> = registry.get_or_create("t", CachePolicy::default());

        a.insert(1, "one".to_string());
        assert_eq!(b.get(&1), Some("one".to_string()));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    #[should_panic(expected = "already registered")]
    fn type_mismatch_panics() {
        let registry = CacheRegistry::new();
        let _a: TypedCache<i64, String> = registry.get_or_create("t", CachePolicy::default());
        let _b: TypedCache<i64, u64> = registry.get_or_create("t", CachePolicy::default());
    }
}
