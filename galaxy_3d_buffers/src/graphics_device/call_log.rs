/// Shared record of native calls issued to an emulated device
///
/// Cloning a CallLog shares the underlying list, so a test can keep a handle
/// while the emulated API is moved into a backend.

use std::sync::{Arc, Mutex, PoisonError};

#[derive(Debug)]
pub struct CallLog<C> {
    calls: Arc<Mutex<Vec<C>>>,
}

impl<C> Clone for CallLog<C> {
    fn clone(&self) -> Self {
        Self { calls: Arc::clone(&self.calls) }
    }
}

impl<C> Default for CallLog<C> {
    fn default() -> Self {
        Self { calls: Arc::new(Mutex::new(Vec::new())) }
    }
}

impl<C: Clone> CallLog<C> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, call: C) {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).push(call);
    }

    /// Copy of every call recorded so far
    pub fn calls(&self) -> Vec<C> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Number of recorded calls matching `predicate`
    pub fn count(&self, predicate: impl Fn(&C) -> bool) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|c| predicate(c))
            .count()
    }

    pub fn len(&self) -> usize {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }
}
