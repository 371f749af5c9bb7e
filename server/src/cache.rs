//! Time-bounded cache of the current buyer snapshot.

use obsidian_engine::RecordStore;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

struct Entry {
    loaded_at: Instant,
    store: Arc<RecordStore>,
}

/// Holds at most one snapshot. Readers share it through an `Arc`, so a
/// reload never disturbs a request that is still using the old one.
pub struct SnapshotCache {
    ttl: Duration,
    slot: RwLock<Option<Entry>>,
}

impl SnapshotCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slot: RwLock::new(None),
        }
    }

    pub fn new_shared(ttl: Duration) -> Arc<Self> {
        Arc::new(Self::new(ttl))
    }

    /// The cached snapshot, if it is younger than the TTL.
    pub async fn get(&self) -> Option<Arc<RecordStore>> {
        let slot = self.slot.read().await;
        slot.as_ref()
            .filter(|entry| entry.loaded_at.elapsed() < self.ttl)
            .map(|entry| Arc::clone(&entry.store))
    }

    /// Replace the cached snapshot.
    pub async fn put(&self, store: RecordStore) -> Arc<RecordStore> {
        let store = Arc::new(store);
        *self.slot.write().await = Some(Entry {
            loaded_at: Instant::now(),
            store: Arc::clone(&store),
        });
        store
    }

    pub async fn invalidate(&self) {
        self.slot.write().await.take();
    }
}
