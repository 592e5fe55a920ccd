use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::collections::HashMap;
use std::sync::Arc;

/// A handle to a named read-write lock.
///
/// Handles are cheap to clone and all handles for the same name share the
/// same underlying lock.
#[derive(Clone)]
pub struct LockHandle {
    lock: Arc<RwLock<()>>,
}

impl LockHandle {
    /// Acquires the read side. Readers run concurrently with each other but
    /// block while a writer holds the lock.
    pub fn read(&self) -> RwLockReadGuard<'_, ()> {
        self.lock.read()
    }

    /// Acquires the write side exclusively.
    pub fn write(&self) -> RwLockWriteGuard<'_, ()> {
        self.lock.write()
    }
}

/// Registry of named read-write locks, one per collection.
///
/// Every mutating store operation holds the write side of its collection's
/// lock from the read-for-mutation through the point where both the backing
/// medium and the mirror cache have been updated. Guards release on drop, so
/// every exit path (including error returns) releases the lock.
///
/// # Examples
///
/// ```
/// use docket::common::LockRegistry;
/// let locks = LockRegistry::new();
/// let handle = locks.get_lock("designs");
/// {
///     let _guard = handle.write();
///     // exclusive critical section for "designs"
/// }
/// ```
#[derive(Clone)]
pub struct LockRegistry {
    locks: Arc<RwLock<HashMap<String, Arc<RwLock<()>>>>>,
}

impl LockRegistry {
    /// Creates a new empty lock registry.
    pub fn new() -> Self {
        LockRegistry {
            locks: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Gets the lock for the given name, creating it on first use.
    ///
    /// # Arguments
    ///
    /// * `name` - The name of the lock, usually a collection name
    pub fn get_lock(&self, name: &str) -> LockHandle {
        let lock = {
            let mut locks = self.locks.write();
            locks
                .entry(name.to_string())
                .or_insert_with(|| Arc::new(RwLock::new(())))
                .clone()
        };
        LockHandle { lock }
    }

    /// Removes a lock from the registry.
    ///
    /// Outstanding handles keep the underlying lock alive; only the
    /// registry entry is dropped.
    pub fn remove_lock(&self, name: &str) -> bool {
        let mut locks = self.locks.write();
        locks.remove(name).is_some()
    }

    /// Returns the number of locks currently registered.
    pub fn lock_count(&self) -> usize {
        let locks = self.locks.read();
        locks.len()
    }
}

impl Default for LockRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    #[test]
    fn test_new_registry_is_empty() {
        let locks = LockRegistry::new();
        assert_eq!(locks.lock_count(), 0);
    }

    #[test]
    fn test_get_lock_registers_once() {
        let locks = LockRegistry::new();
        let _a = locks.get_lock("designs");
        let _b = locks.get_lock("designs");
        assert_eq!(locks.lock_count(), 1);
    }

    #[test]
    fn test_handles_share_one_lock() {
        let locks = LockRegistry::new();
        let a = locks.get_lock("designs");
        let b = locks.get_lock("designs");
        let _write = a.write();
        // same lock, so try_read through the other handle must fail
        assert!(b.lock.try_read().is_none());
    }

    #[test]
    fn test_concurrent_readers() {
        let locks = Arc::new(LockRegistry::new());
        let counter = Arc::new(AtomicUsize::new(0));

        let mut handles = vec![];
        for _ in 0..4 {
            let locks = locks.clone();
            let counter = counter.clone();
            handles.push(thread::spawn(move || {
                let handle = locks.get_lock("designs");
                let _guard = handle.read();
                counter.fetch_add(1, Ordering::SeqCst);
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(counter.load(Ordering::SeqCst), 4);
        assert_eq!(locks.lock_count(), 1);
    }

    #[test]
    fn test_remove_lock() {
        let locks = LockRegistry::new();
        let _handle = locks.get_lock("designs");
        assert!(locks.remove_lock("designs"));
        assert!(!locks.remove_lock("designs"));
        assert_eq!(locks.lock_count(), 0);
    }
}
