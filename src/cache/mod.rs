use crate::common::{CACHE_WILDCARD, DEFAULT_RESULT_TTL};
use crate::document::Value;
use crate::errors::DocketResult;
use dashmap::DashMap;
use std::time::{Duration, Instant};

/// A cached result paired with its creation time.
///
/// Valid while `now - cached_at < ttl`; the TTL is supplied per lookup, so
/// the same entry can be considered live by one call site and stale by
/// another with a tighter bound.
#[derive(Clone)]
struct CacheEntry {
    value: Value,
    cached_at: Instant,
}

impl CacheEntry {
    fn is_live(&self, ttl: Duration) -> bool {
        self.cached_at.elapsed() < ttl
    }
}

/// TTL-bounded cache of computed read results, keyed by operation signature.
///
/// This is the only tier where staleness is permitted, bounded by the TTL
/// and by explicit invalidation. There is no automatic dependency tracking:
/// callers that mutate underlying data are responsible for invalidating the
/// affected keys or prefixes.
///
/// The cache is an explicit object with a plain construction/teardown
/// lifecycle; it holds no process-wide state. Entry replacement is atomic
/// (sharded map), so racing computations for one key end in last-write-wins
/// and never a torn entry.
///
/// # Examples
///
/// ```rust
/// use docket::cache::ResultCache;
/// use docket::common::DEFAULT_RESULT_TTL;
/// use docket::document::Value;
///
/// let cache = ResultCache::new();
/// let value = cache.get_or_compute("designs_getAll", DEFAULT_RESULT_TTL, || {
///     Ok(Value::from("computed"))
/// })?;
/// assert_eq!(value, Value::from("computed"));
///
/// // after a mutation, drop every per-design entry but not "designs_getAll"
/// cache.invalidate(Some("design_*"));
/// # Ok::<(), docket::errors::DocketError>(())
/// ```
#[derive(Default)]
pub struct ResultCache {
    entries: DashMap<String, CacheEntry>,
}

impl ResultCache {
    /// Creates a new empty result cache.
    pub fn new() -> Self {
        ResultCache {
            entries: DashMap::new(),
        }
    }

    /// Returns the live entry for `key`, or computes, stores, and returns a
    /// fresh one.
    ///
    /// An entry is live while its age is below `ttl`; an expired entry is
    /// never returned, irrespective of whether the underlying data changed.
    /// A failed `compute` propagates its error and caches nothing, so a
    /// poisoned entry can never be served later.
    pub fn get_or_compute<F>(&self, key: &str, ttl: Duration, compute: F) -> DocketResult<Value>
    where
        F: FnOnce() -> DocketResult<Value>,
    {
        if let Some(entry) = self.entries.get(key) {
            if entry.is_live(ttl) {
                log::debug!("Result cache hit for '{}'", key);
                return Ok(entry.value.clone());
            }
        }
        // guard dropped before computing: compute may take arbitrarily long
        // or re-enter the cache under another key
        log::debug!("Result cache miss for '{}', computing", key);
        let value = compute()?;
        self.entries.insert(
            key.to_string(),
            CacheEntry {
                value: value.clone(),
                cached_at: Instant::now(),
            },
        );
        Ok(value)
    }

    /// Same as [get_or_compute] with the default five-minute TTL.
    ///
    /// [get_or_compute]: ResultCache::get_or_compute
    pub fn get_or_compute_default<F>(&self, key: &str, compute: F) -> DocketResult<Value>
    where
        F: FnOnce() -> DocketResult<Value>,
    {
        self.get_or_compute(key, DEFAULT_RESULT_TTL, compute)
    }

    /// Returns the entry for `key` if it is live under the given TTL.
    pub fn get(&self, key: &str, ttl: Duration) -> Option<Value> {
        self.entries
            .get(key)
            .filter(|entry| entry.is_live(ttl))
            .map(|entry| entry.value.clone())
    }

    /// Removes entries by key, prefix pattern, or entirely.
    ///
    /// * `None` clears every entry.
    /// * A key ending in the wildcard marker `*` removes every entry whose
    ///   key starts with the prefix before the marker (prefix match, not
    ///   substring match).
    /// * Any other key removes exactly that entry.
    pub fn invalidate(&self, key: Option<&str>) {
        match key {
            None => {
                log::debug!("Result cache cleared");
                self.entries.clear();
            }
            Some(pattern) if pattern.ends_with(CACHE_WILDCARD) => {
                let prefix = &pattern[..pattern.len() - CACHE_WILDCARD.len_utf8()];
                self.entries.retain(|key, _| !key.starts_with(prefix));
                log::debug!("Result cache invalidated prefix '{}'", prefix);
            }
            Some(exact) => {
                self.entries.remove(exact);
                log::debug!("Result cache invalidated key '{}'", exact);
            }
        }
    }

    /// Number of entries currently stored, live or expired.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{DocketError, ErrorKind};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;

    const TTL: Duration = Duration::from_millis(50);

    #[test]
    fn test_compute_on_miss_then_serve_from_cache() {
        let cache = ResultCache::new();
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let value = cache
                .get_or_compute("k", TTL, || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(Value::Int(7))
                })
                .unwrap();
            assert_eq!(value, Value::Int(7));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_expired_entry_recomputed() {
        let cache = ResultCache::new();

        let first = cache
            .get_or_compute("k", TTL, || Ok(Value::Int(1)))
            .unwrap();
        assert_eq!(first, Value::Int(1));

        thread::sleep(TTL + Duration::from_millis(10));

        let second = cache
            .get_or_compute("k", TTL, || Ok(Value::Int(2)))
            .unwrap();
        assert_eq!(second, Value::Int(2));
    }

    #[test]
    fn test_live_entry_served_unchanged_before_ttl() {
        let cache = ResultCache::new();
        cache
            .get_or_compute("k", Duration::from_secs(5), || Ok(Value::Int(1)))
            .unwrap();

        // underlying data "changes", but the live entry wins
        let value = cache
            .get_or_compute("k", Duration::from_secs(5), || Ok(Value::Int(99)))
            .unwrap();
        assert_eq!(value, Value::Int(1));
    }

    #[test]
    fn test_failed_compute_not_cached() {
        let cache = ResultCache::new();

        let result = cache.get_or_compute("k", TTL, || {
            Err(DocketError::new("boom", ErrorKind::StorageError))
        });
        assert!(result.is_err());
        assert!(cache.is_empty());

        // a later successful compute fills the entry normally
        let value = cache.get_or_compute("k", TTL, || Ok(Value::Int(3))).unwrap();
        assert_eq!(value, Value::Int(3));
    }

    #[test]
    fn test_invalidate_exact_key() {
        let cache = ResultCache::new();
        cache.get_or_compute("a", TTL, || Ok(Value::Int(1))).unwrap();
        cache.get_or_compute("b", TTL, || Ok(Value::Int(2))).unwrap();

        cache.invalidate(Some("a"));
        assert!(cache.get("a", TTL).is_none());
        assert_eq!(cache.get("b", TTL), Some(Value::Int(2)));
    }

    #[test]
    fn test_invalidate_prefix_not_substring() {
        let cache = ResultCache::new();
        cache
            .get_or_compute("design_1", TTL, || Ok(Value::from("A")))
            .unwrap();
        cache
            .get_or_compute("design_2", TTL, || Ok(Value::from("B")))
            .unwrap();
        cache
            .get_or_compute("designs_getAll", TTL, || Ok(Value::from("C")))
            .unwrap();

        cache.invalidate(Some("design_*"));

        assert!(cache.get("design_1", TTL).is_none());
        assert!(cache.get("design_2", TTL).is_none());
        assert_eq!(cache.get("designs_getAll", TTL), Some(Value::from("C")));
    }

    #[test]
    fn test_invalidate_all() {
        let cache = ResultCache::new();
        cache.get_or_compute("a", TTL, || Ok(Value::Int(1))).unwrap();
        cache.get_or_compute("b", TTL, || Ok(Value::Int(2))).unwrap();

        cache.invalidate(None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_concurrent_get_or_compute_never_torn() {
        use std::sync::Arc;

        let cache = Arc::new(ResultCache::new());
        let mut handles = vec![];
        for i in 0..8 {
            let cache = cache.clone();
            handles.push(thread::spawn(move || {
                cache
                    .get_or_compute("shared", Duration::from_secs(5), || {
                        Ok(Value::Array(vec![Value::Int(i), Value::Int(i)]))
                    })
                    .unwrap()
            }));
        }
        for handle in handles {
            let value = handle.join().unwrap();
            // last-write-wins is fine, a torn entry is not: both elements
            // must come from the same computation
            let items = value.as_array().unwrap().clone();
            assert_eq!(items[0], items[1]);
        }
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_default_ttl_path() {
        let cache = ResultCache::new();
        let value = cache
            .get_or_compute_default("k", || Ok(Value::Bool(true)))
            .unwrap();
        assert_eq!(value, Value::Bool(true));
        assert_eq!(cache.get("k", DEFAULT_RESULT_TTL), Some(Value::Bool(true)));
    }
}
