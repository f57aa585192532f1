//! Generation fencing for query state
//!
//! Each query type owns a [`FencedState`]: the current generation and the
//! state it guards live behind one lock, so bumping, checking and committing
//! never interleave with a concurrent reset.

use super::models::SearchState;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Monotonic fencing token for one query type
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Generation(u64);

impl Generation {
    pub fn value(self) -> u64 {
        self.0
    }

    fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

impl std::fmt::Display for Generation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

struct Slot<T> {
    current: Generation,
    state: SearchState<T>,
}

/// Search state guarded by a generation counter
pub struct FencedState<T> {
    slot: Mutex<Slot<T>>,
}

impl<T: Default + Clone> FencedState<T> {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(Slot {
                current: Generation::default(),
                state: SearchState::idle(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Slot<T>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start a new request: bump the generation and enter loading
    pub fn begin(&self) -> Generation {
        let mut slot = self.lock();
        slot.current = slot.current.next();
        slot.state.begin();
        slot.current
    }

    /// Apply `f` to the state only if `generation` is still current
    pub fn commit_if_current<F>(&self, generation: Generation, f: F) -> bool
    where
        F: FnOnce(&mut SearchState<T>),
    {
        let mut slot = self.lock();
        if slot.current != generation {
            return false;
        }
        f(&mut slot.state);
        true
    }

    /// Overwrite the state without touching the generation
    pub fn set(&self, state: SearchState<T>) {
        self.lock().state = state;
    }

    /// Invalidate every in-flight generation and return to idle
    pub fn reset(&self) -> Generation {
        let mut slot = self.lock();
        slot.current = slot.current.next();
        slot.state = SearchState::idle();
        slot.current
    }

    pub fn current(&self) -> Generation {
        self.lock().current
    }

    pub fn snapshot(&self) -> SearchState<T> {
        self.lock().state.clone()
    }
}

impl<T: Default + Clone> Default for FencedState<T> {
    fn default() -> Self {
        Self::new()
    }
}
