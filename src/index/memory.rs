//! In-memory index store.
//!
//! Nothing survives a restart.

use super::{IndexStore, VectorIndex};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::{PoisonError, RwLock};

/// Index store that keeps a copy of the last saved index in memory.
#[derive(Default)]
pub struct MemoryIndexStore {
    saved: RwLock<Option<VectorIndex>>,
}

impl MemoryIndexStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl IndexStore for MemoryIndexStore {
    async fn save(&self, index: &VectorIndex) -> Result<()> {
        let mut saved = self.saved.write().unwrap_or_else(PoisonError::into_inner);
        *saved = Some(index.clone());
        Ok(())
    }

    async fn load(&self) -> Result<Option<VectorIndex>> {
        let saved = self.saved.read().unwrap_or_else(PoisonError::into_inner);
        Ok(saved.clone())
    }

    async fn clear(&self) -> Result<()> {
        let mut saved = self.saved.write().unwrap_or_else(PoisonError::into_inner);
        *saved = None;
        Ok(())
    }
}
