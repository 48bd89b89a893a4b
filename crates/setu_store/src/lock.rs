//! Lock bookkeeping for the image directory.

use setu_core::LockScope;
use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Held for the duration of a single-file operation.
pub(crate) enum FileGuard<'a> {
    /// Global scope: the whole directory.
    Directory { _dir: RwLockWriteGuard<'a, ()> },
    /// Per-file scope: shared directory access plus this file exclusively.
    File {
        _dir: RwLockReadGuard<'a, ()>,
        _file: OwnedMutexGuard<()>,
    },
}

/// Exclusive claim on one file name, held by a request from download until
/// the file is gone. Separate from the locks taken by individual operations.
pub struct Lease {
    _name: OwnedMutexGuard<()>,
}

/// One async mutex per name, created on demand.
#[derive(Default)]
pub(crate) struct NameLocks {
    names: StdMutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl NameLocks {
    pub(crate) async fn lock(&self, name: &str) -> OwnedMutexGuard<()> {
        self.mutex(name).lock_owned().await
    }

    pub(crate) async fn lease(&self, name: &str) -> Lease {
        Lease {
            _name: self.lock(name).await,
        }
    }

    fn mutex(&self, name: &str) -> Arc<Mutex<()>> {
        let mut names = self.names.lock().unwrap_or_else(|e| e.into_inner());
        // Entries only the map still references have no holder and no waiter.
        names.retain(|_, m| Arc::strong_count(m) > 1);
        names
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    #[cfg(test)]
    fn tracked(&self) -> usize {
        self.names.lock().unwrap().len()
    }
}

pub(crate) struct DirLocks {
    scope: LockScope,
    dir: RwLock<()>,
    files: NameLocks,
}

impl DirLocks {
    pub(crate) fn new(scope: LockScope) -> Self {
        Self {
            scope,
            dir: RwLock::new(()),
            files: NameLocks::default(),
        }
    }

    /// Exclusive access to the whole directory (scans, purge).
    pub(crate) async fn lock_dir(&self) -> RwLockWriteGuard<'_, ()> {
        self.dir.write().await
    }

    pub(crate) async fn lock_file(&self, name: &str) -> FileGuard<'_> {
        match self.scope {
            LockScope::Global => FileGuard::Directory {
                _dir: self.dir.write().await,
            },
            LockScope::PerFile => {
                let dir = self.dir.read().await;
                let file = self.files.lock(name).await;
                FileGuard::File {
                    _dir: dir,
                    _file: file,
                }
            }
        }
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_file_is_exclusive() {
        let locks = Arc::new(DirLocks::new(LockScope::PerFile));
        let guard = locks.lock_file("a.png").await;

        let l2 = locks.clone();
        let waiter = tokio::spawn(async move {
            let _g = l2.lock_file("a.png").await;
        });
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!waiter.is_finished());

        drop(guard);
        waiter.await.unwrap();
    }

    #[tokio::test]
    async fn test_different_files_do_not_block() {
        let locks = DirLocks::new(LockScope::PerFile);
        let _a = locks.lock_file("a.png").await;
        let b = tokio::time::timeout(Duration::from_millis(100), locks.lock_file("b.png")).await;
        assert!(b.is_ok());
    }

    #[tokio::test]
    async fn test_global_scope_blocks_everything() {
        let locks = DirLocks::new(LockScope::Global);
        let _a = locks.lock_file("a.png").await;
        let b = tokio::time::timeout(Duration::from_millis(100), locks.lock_file("b.png")).await;
        assert!(b.is_err());
    }

    #[tokio::test]
    async fn test_dir_lock_waits_for_file_ops() {
        let locks = DirLocks::new(LockScope::PerFile);
        let _a = locks.lock_file("a.png").await;
        let d = tokio::time::timeout(Duration::from_millis(100), locks.lock_dir()).await;
        assert!(d.is_err());
    }

    #[tokio::test]
    async fn test_idle_entries_are_pruned() {
        let locks = DirLocks::new(LockScope::PerFile);
        for i in 0..10 {
            let _g = locks.lock_file(&format!("{}.png", i)).await;
        }
        let _g = locks.lock_file("last.png").await;
        assert_eq!(locks.files.tracked(), 1);
    }

    #[tokio::test]
    async fn test_lease_is_exclusive_per_name() {
        let leases = Arc::new(NameLocks::default());
        let lease = leases.lease("a.png").await;

        let other = tokio::time::timeout(Duration::from_millis(100), leases.lease("b.png")).await;
        assert!(other.is_ok());

        let l2 = leases.clone();
        let waiter = tokio::spawn(async move {
            let _lease = l2.lease("a.png").await;
        });
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!waiter.is_finished());

        drop(lease);
        waiter.await.unwrap();
    }
}
