//! Generated resource classes (`<package>.R`, `R.<type>`, `R.<type>.<name>`).
//!
//! Entries are synthesized the first time they are looked up and memoized in
//! a sharded cache. Each shard is guarded by its own `RwLock`, so readers of
//! unrelated keys never contend and a key is inserted at most once.

use std::fmt;
use std::hash::{BuildHasher, Hash, Hasher};
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::{FxBuildHasher, FxHashMap};
use smol_str::SmolStr;

use super::types::{ClassInfo, FieldInfo};

/// Android resource types that get a nested class under `R`.
pub const RESOURCE_TYPES: &[&str] = &[
    "anim",
    "animator",
    "array",
    "attr",
    "bool",
    "color",
    "dimen",
    "drawable",
    "font",
    "fraction",
    "id",
    "integer",
    "interpolator",
    "layout",
    "menu",
    "mipmap",
    "navigation",
    "plurals",
    "raw",
    "string",
    "style",
    "styleable",
    "transition",
    "xml",
];

pub fn is_resource_type(name: &str) -> bool {
    RESOURCE_TYPES.contains(&name)
}

const SHARDS: usize = 16;

/// A memoized synthesized entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResourceEntry {
    /// `pkg.R` or `pkg.R.<type>`.
    Class(Arc<ClassInfo>),
    /// `pkg.R.<type>.<name>`.
    Constant(Arc<FieldInfo>),
}

/// Sharded, insert-once cache keyed by dotted qualified name.
pub struct ResourceCache {
    shards: [RwLock<FxHashMap<SmolStr, ResourceEntry>>; SHARDS],
}

impl Default for ResourceCache {
    fn default() -> Self {
        Self {
            shards: std::array::from_fn(|_| RwLock::new(FxHashMap::default())),
        }
    }
}

impl ResourceCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn shard(&self, key: &str) -> &RwLock<FxHashMap<SmolStr, ResourceEntry>> {
        let mut hasher = FxBuildHasher.build_hasher();
        key.hash(&mut hasher);
        &self.shards[(hasher.finish() as usize) % SHARDS]
    }

    /// Cached entry for `key`, creating it with `make` on first use.
    ///
    /// `make` runs at most once per key even under concurrent lookups; a
    /// `None` from `make` is not cached. It runs under the shard's write
    /// lock, so lookups of other keys in the same shard wait for it; keep it
    /// cheap.
    pub fn get_or_insert_with(
        &self,
        key: &str,
        make: impl FnOnce() -> Option<ResourceEntry>,
    ) -> Option<ResourceEntry> {
        let shard = self.shard(key);

        // Fast path: read lock
        if let Some(entry) = shard.read().get(key) {
            return Some(entry.clone());
        }

        let mut map = shard.write();
        // Double-check after acquiring the write lock
        if let Some(entry) = map.get(key) {
            return Some(entry.clone());
        }
        let entry = make()?;
        tracing::trace!(key, "synthesized resource entry");
        map.insert(SmolStr::new(key), entry.clone());
        Some(entry)
    }

    pub fn get(&self, key: &str) -> Option<ResourceEntry> {
        self.shard(key).read().get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.shards.iter().map(|shard| shard.read().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for ResourceCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceCache")
            .field("count", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::classpath::types::JavaType;
    use crate::hir::symbols::Symbol;

    fn constant(name: &str) -> ResourceEntry {
        ResourceEntry::Constant(Arc::new(FieldInfo {
            name: SmolStr::new(name),
            ty: JavaType::primitive("int"),
            is_static: true,
            symbol: Symbol::placeholder(&[name], true),
        }))
    }

    #[test]
    fn test_factory_runs_once() {
        let cache = ResourceCache::new();
        let calls = AtomicUsize::new(0);
        for _ in 0..3 {
            let entry = cache.get_or_insert_with("a.R.layout.item", || {
                calls.fetch_add(1, Ordering::SeqCst);
                Some(constant("item"))
            });
            assert!(entry.is_some());
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_none_is_not_cached() {
        let cache = ResourceCache::new();
        assert!(cache.get_or_insert_with("a.R.bogus", || None).is_none());
        assert!(cache.is_empty());
        assert!(cache.get("a.R.bogus").is_none());
    }

    #[test]
    fn test_concurrent_inserts_share_one_entry() {
        let cache = ResourceCache::new();
        let calls = AtomicUsize::new(0);
        std::thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| {
                    cache.get_or_insert_with("a.R.string.title", || {
                        calls.fetch_add(1, Ordering::SeqCst);
                        Some(constant("title"))
                    })
                });
            }
        });
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_resource_types() {
        assert!(is_resource_type("layout"));
        assert!(is_resource_type("styleable"));
        assert!(!is_resource_type("widget"));
        assert_eq!(RESOURCE_TYPES.len(), 24);
    }
}
