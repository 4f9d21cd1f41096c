//! Failure sets shared between concurrent crawl tasks

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Set of units that failed during the current pass
///
/// Cloning yields another handle to the same set. Tasks only insert; the
/// retry controller drains the set between passes, after every task of the
/// previous pass has been joined.
#[derive(Debug)]
pub struct FailureSet<T: Ord> {
    inner: Arc<Mutex<BTreeSet<T>>>,
}

impl<T: Ord> Clone for FailureSet<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Ord> Default for FailureSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Ord> FailureSet<T> {
    /// Creates an empty failure set
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(BTreeSet::new())),
        }
    }

    fn lock(&self) -> MutexGuard<'_, BTreeSet<T>> {
        // Insert and drain leave the set consistent even if a holder panicked
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Records a failed unit; returns false if it was already present
    pub fn insert(&self, unit: T) -> bool {
        self.lock().insert(unit)
    }

    /// Removes and returns every unit, leaving the set empty for the next pass
    pub fn drain(&self) -> Vec<T> {
        std::mem::take(&mut *self.lock()).into_iter().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn contains(&self, unit: &T) -> bool {
        self.lock().contains(unit)
    }
}

impl<T: Ord + Clone> FailureSet<T> {
    /// Copies the current contents in sorted order without clearing them
    pub fn snapshot(&self) -> Vec<T> {
        self.lock().iter().cloned().collect()
    }
}
