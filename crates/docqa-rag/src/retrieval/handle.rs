//! Shared ownership of the active index

use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::{Mutex, MutexGuard};

use super::index::VectorIndex;

/// Owner of the currently active index.
///
/// A query clones the current `Arc` once and keeps using that snapshot
/// for its whole lifetime, so results within one query are never mixed
/// across index generations. A rebuild prepares a complete replacement
/// off to the side and swaps it in atomically; readers during a rebuild
/// keep seeing the last-known-good index and never block. Rebuilds
/// themselves are mutually exclusive.
#[derive(Default)]
pub struct IndexHandle {
    current: RwLock<Option<Arc<VectorIndex>>>,
    rebuild_lock: Mutex<()>,
}

impl IndexHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Active index, if one has been built or loaded
    pub fn current(&self) -> Option<Arc<VectorIndex>> {
        self.current.read().clone()
    }

    /// Atomically replace the active index
    pub fn replace(&self, index: Arc<VectorIndex>) {
        *self.current.write() = Some(index);
    }

    /// Acquire the exclusive rebuild guard. Held across the entire
    /// load-chunk-embed-persist sequence; `replace` is called only
    /// while holding it.
    pub async fn begin_rebuild(&self) -> MutexGuard<'_, ()> {
        self.rebuild_lock.lock().await
    }
}
