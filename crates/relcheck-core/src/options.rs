use std::sync::Mutex;

use chrono::{DateTime, Utc};

pub const AUTO_CHECK_KEY: &str = "App/Auto/Check For Updates";
pub const NEXT_CHECK_KEY: &str = "Version/Next Check";

/// Typed access to the two persisted update-check settings.
pub trait OptionsStore: Send + Sync {
    fn auto_check_enabled(&self) -> bool;
    fn set_auto_check_enabled(&self, enabled: bool);
    fn next_check(&self) -> DateTime<Utc>;
    fn set_next_check(&self, at: DateTime<Utc>);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct MemoryState {
    auto_check: bool,
    next_check: DateTime<Utc>,
    auto_check_writes: usize,
    next_check_writes: usize,
}

/// In-process store for tests and for embedders that persist options
/// themselves.
#[derive(Debug)]
pub struct MemoryOptions {
    state: Mutex<MemoryState>,
}

impl Default for MemoryOptions {
    fn default() -> Self {
        Self::new(true, DateTime::<Utc>::UNIX_EPOCH)
    }
}

impl MemoryOptions {
    #[must_use]
    pub fn new(auto_check: bool, next_check: DateTime<Utc>) -> Self {
        Self {
            state: Mutex::new(MemoryState {
                auto_check,
                next_check,
                auto_check_writes: 0,
                next_check_writes: 0,
            }),
        }
    }

    fn state(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    #[must_use]
    pub fn auto_check_writes(&self) -> usize {
        self.state().auto_check_writes
    }

    #[must_use]
    pub fn next_check_writes(&self) -> usize {
        self.state().next_check_writes
    }
}

impl OptionsStore for MemoryOptions {
    fn auto_check_enabled(&self) -> bool {
        self.state().auto_check
    }

    fn set_auto_check_enabled(&self, enabled: bool) {
        let mut state = self.state();
        state.auto_check = enabled;
        state.auto_check_writes += 1;
    }

    fn next_check(&self) -> DateTime<Utc> {
        self.state().next_check
    }

    fn set_next_check(&self, at: DateTime<Utc>) {
        let mut state = self.state();
        state.next_check = at;
        state.next_check_writes += 1;
    }
}
