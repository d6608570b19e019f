//! Serialization of work on a shared destination, and cooperative
//! cancellation.

use std::collections::HashMap;
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Path-keyed mutual exclusion.
///
/// Two records that land on the same destination must not interleave
/// their existence check and creation. Each destination gets its own
/// mutex; distinct destinations never contend. An entry lives only while
/// some [`Slot`] for its path is alive.
///
/// # Examples
///
/// ```
/// use symkeep::engine::PathLocks;
/// use std::path::Path;
///
/// let locks = PathLocks::new();
/// let slot = locks.slot(Path::new("/tmp/link"));
/// let _guard = slot.lock().unwrap();
/// // exclusive access to /tmp/link
/// ```
#[derive(Debug, Default)]
pub struct PathLocks {
    slots: Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>,
}

impl PathLocks {
    /// Create an empty lock table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The mutex guarding `path`. Lock it for the duration of the work.
    #[must_use]
    pub fn slot(&self, path: &Path) -> Slot<'_> {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        let mutex = Arc::clone(slots.entry(path.to_path_buf()).or_default());
        Slot {
            locks: self,
            path: path.to_path_buf(),
            mutex,
        }
    }

    /// Number of paths with a live slot.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Whether no slot is live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A handle on one path's mutex.
///
/// Dropping the last handle for a path removes its entry from the table.
#[derive(Debug)]
pub struct Slot<'a> {
    locks: &'a PathLocks,
    path: PathBuf,
    mutex: Arc<Mutex<()>>,
}

impl Deref for Slot<'_> {
    type Target = Mutex<()>;

    fn deref(&self) -> &Mutex<()> {
        &self.mutex
    }
}

impl Drop for Slot<'_> {
    fn drop(&mut self) {
        let mut slots = self.locks.slots.lock().unwrap_or_else(PoisonError::into_inner);
        // The table's reference and this one: nobody else is waiting.
        if Arc::strong_count(&self.mutex) == 2 {
            slots.remove(&self.path);
        }
    }
}

/// A shared flag checked at every stage boundary.
///
/// Cloning shares the flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// A token that is not cancelled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_same_path_shares_slot() {
        let locks = PathLocks::new();
        let a = locks.slot(Path::new("/x/l"));
        let b = locks.slot(Path::new("/x/l"));
        let c = locks.slot(Path::new("/x/m"));
        assert!(std::ptr::eq::<Mutex<()>>(&*a, &*b));
        assert!(!std::ptr::eq::<Mutex<()>>(&*a, &*c));
        assert_eq!(locks.len(), 2);
    }

    #[test]
    fn test_released_slots_leave_the_table() {
        let locks = PathLocks::new();
        let a = locks.slot(Path::new("/x/l"));
        let b = locks.slot(Path::new("/x/l"));
        drop(a);
        assert_eq!(locks.len(), 1);
        {
            let _guard = b.lock().unwrap();
        }
        drop(b);
        assert!(locks.is_empty());

        for i in 0..100 {
            let slot = locks.slot(&PathBuf::from(format!("/batch/{i}")));
            let _guard = slot.lock().unwrap();
        }
        assert!(locks.is_empty());
    }

    #[test]
    fn test_slot_serializes_threads() {
        let locks = PathLocks::new();
        let counter = Mutex::new(Vec::new());
        thread::scope(|scope| {
            for i in 0..8 {
                let locks = &locks;
                let counter = &counter;
                scope.spawn(move || {
                    let slot = locks.slot(Path::new("/shared"));
                    let _guard = slot.lock().unwrap();
                    let mut seen = counter.lock().unwrap();
                    seen.push(i);
                });
            }
        });
        assert_eq!(counter.lock().unwrap().len(), 8);
        assert!(locks.is_empty());
    }

    #[test]
    fn test_cancel_token_shared() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());
        token.cancel();
        assert!(clone.is_cancelled());
    }
}
