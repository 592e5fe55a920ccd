pub mod constants;
pub mod lock;

pub use constants::*;
pub use lock::{LockHandle, LockRegistry};

use parking_lot::RwLock;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Shared mutable state wrapped in a read-write lock.
pub type Atomic<T> = Arc<RwLock<T>>;

#[inline]
pub fn atomic<T>(t: T) -> Atomic<T> {
    Arc::new(RwLock::new(t))
}

/// Returns the current time as milliseconds since the Unix epoch, or 0 when
/// the system clock is unreadable.
#[inline]
pub fn epoch_millis_or_zero() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_epoch_millis_or_zero() {
        let now = epoch_millis_or_zero();
        assert!(now > 0);
    }

    #[test]
    fn test_atomic_read_write() {
        let shared = atomic(41);
        {
            let mut guard = shared.write();
            *guard += 1;
        }
        assert_eq!(*shared.read(), 42);
    }
}
