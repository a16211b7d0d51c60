//! Per-issue sync locks
//!
//! Serializes the lookup-then-write of a sync for one GitHub issue so two
//! deliveries for the same unlinked issue cannot both create it. Distinct
//! issues never contend.
//!
//! Entries are held weakly: a lock lives only while a guard or a waiter
//! holds it, and dead entries are pruned on every acquire.

use crate::model::SourceId;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

#[derive(Debug, Default)]
pub struct SourceLocks {
    entries: Mutex<HashMap<SourceId, Weak<AsyncMutex<()>>>>,
}

impl SourceLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `id`
    pub async fn acquire(&self, id: &SourceId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
            entries.retain(|_, weak| weak.strong_count() > 0);

            match entries.get(id).and_then(Weak::upgrade) {
                Some(lock) => lock,
                None => {
                    let lock = Arc::new(AsyncMutex::new(()));
                    entries.insert(id.clone(), Arc::downgrade(&lock));
                    lock
                }
            }
        };

        lock.lock_owned().await
    }

    /// Number of live lock entries
    pub fn len(&self) -> usize {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.values().filter(|weak| weak.strong_count() > 0).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
