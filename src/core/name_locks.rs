use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::Path;

use parking_lot::{Mutex, MutexGuard};

const STRIPES: usize = 64;

/// Striped locks serializing namespace changes that touch the same path.
///
/// A path always hashes to the same stripe, so a remove, a create and a
/// rename of one name cannot interleave their disk operation and their table
/// update. Unrelated names mostly land on different stripes.
pub struct NameLocks {
    stripes: Vec<Mutex<()>>,
}

/// Holds one or two stripes until dropped
pub struct NameGuard<'a> {
    _first: MutexGuard<'a, ()>,
    _second: Option<MutexGuard<'a, ()>>,
}

impl NameLocks {
    pub fn new() -> Self {
        Self {
            stripes: (0..STRIPES).map(|_| Mutex::new(())).collect(),
        }
    }

    fn stripe(&self, path: &Path) -> usize {
        let mut hasher = DefaultHasher::new();
        path.hash(&mut hasher);
        (hasher.finish() as usize) % self.stripes.len()
    }

    pub fn lock(&self, path: &Path) -> NameGuard<'_> {
        NameGuard {
            _first: self.stripes[self.stripe(path)].lock(),
            _second: None,
        }
    }

    /// Lock the stripes of both paths, lowest index first.
    pub fn lock_pair(&self, a: &Path, b: &Path) -> NameGuard<'_> {
        let (a, b) = (self.stripe(a), self.stripe(b));
        let (low, high) = (a.min(b), a.max(b));
        let first = self.stripes[low].lock();
        let second = (high != low).then(|| self.stripes[high].lock());
        NameGuard {
            _first: first,
            _second: second,
        }
    }
}

impl Default for NameLocks {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use threadpool::ThreadPool;

    #[test]
    fn test_same_path_is_exclusive() {
        let locks = Arc::new(NameLocks::new());
        let inside = Arc::new(AtomicUsize::new(0));
        let pool = ThreadPool::new(4);
        for _ in 0..4 {
            let locks = locks.clone();
            let inside = inside.clone();
            pool.execute(move || {
                for _ in 0..200 {
                    let _guard = locks.lock(Path::new("/srv/x"));
                    assert_eq!(inside.fetch_add(1, Ordering::SeqCst), 0);
                    inside.fetch_sub(1, Ordering::SeqCst);
                }
            });
        }
        pool.join();
        assert_eq!(pool.panic_count(), 0);
    }

    #[test]
    fn test_pair_in_both_orders_does_not_deadlock() {
        let locks = Arc::new(NameLocks::new());
        let pool = ThreadPool::new(2);
        for reversed in [false, true] {
            let locks = locks.clone();
            pool.execute(move || {
                let (a, b) = (Path::new("/srv/a"), Path::new("/srv/b"));
                for _ in 0..500 {
                    let _guard = if reversed {
                        locks.lock_pair(b, a)
                    } else {
                        locks.lock_pair(a, b)
                    };
                }
            });
        }
        pool.join();
        assert_eq!(pool.panic_count(), 0);
    }

    #[test]
    fn test_pair_of_same_path() {
        let locks = NameLocks::new();
        let path = Path::new("/srv/a");
        let guard = locks.lock_pair(path, path);
        drop(guard);
        let _guard = locks.lock(path);
    }
}
