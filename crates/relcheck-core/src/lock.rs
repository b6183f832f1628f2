use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Non-blocking exclusion for update checks.
///
/// Clones share the same flag. A second caller never waits: `try_acquire`
/// returns `None` while a guard is alive.
#[derive(Debug, Clone, Default)]
pub struct CheckLock {
    held: Arc<AtomicBool>,
}

impl CheckLock {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn try_acquire(&self) -> Option<CheckGuard> {
        self.held
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .ok()
            .map(|_| CheckGuard {
                held: Arc::clone(&self.held),
            })
    }

    #[must_use]
    pub fn is_held(&self) -> bool {
        self.held.load(Ordering::Acquire)
    }
}

/// Releases the lock when dropped.
#[derive(Debug)]
pub struct CheckGuard {
    held: Arc<AtomicBool>,
}

impl Drop for CheckGuard {
    fn drop(&mut self) {
        self.held.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::CheckLock;

    #[test]
    fn second_acquire_fails_while_guard_is_alive() {
        let lock = CheckLock::new();
        let guard = lock.try_acquire().expect("first acquire should succeed");

        assert!(lock.try_acquire().is_none());
        assert!(lock.clone().try_acquire().is_none());

        drop(guard);
        assert!(lock.try_acquire().is_some());
    }

    #[test]
    fn independent_locks_do_not_interfere() {
        let first = CheckLock::new();
        let second = CheckLock::new();

        let _guard = first.try_acquire().expect("first lock should be free");
        assert!(second.try_acquire().is_some());
    }

    #[test]
    fn guard_releases_on_panic_unwind() {
        let lock = CheckLock::new();
        let shared = lock.clone();

        let result = std::thread::spawn(move || {
            let _guard = shared.try_acquire().expect("lock should be free");
            panic!("check blew up");
        })
        .join();

        assert!(result.is_err());
        assert!(!lock.is_held());
    }
}
