//! The index that queries are currently served from.

use super::{IndexSource, VectorIndex};
use std::sync::{Arc, PoisonError, RwLock};

/// Shared slot holding the active index.
///
/// Readers take a cheap [`Arc`] snapshot and search it without holding the
/// lock, so a replacement never blocks or tears an in-flight query.
#[derive(Default)]
pub struct ActiveIndex {
    current: RwLock<Option<Arc<VectorIndex>>>,
}

impl ActiveIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current index, if one has been loaded.
    pub fn snapshot(&self) -> Option<Arc<VectorIndex>> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Swap in a new index, dropping the previous one.
    pub fn replace(&self, index: VectorIndex) -> Arc<VectorIndex> {
        let index = Arc::new(index);
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        *current = Some(Arc::clone(&index));
        index
    }

    pub fn is_loaded(&self) -> bool {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    pub fn source(&self) -> Option<IndexSource> {
        self.snapshot().map(|index| index.source().clone())
    }
}
