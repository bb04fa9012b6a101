//! Process-wide holder of the artifact pair being served

use super::adapter::InferenceAdapter;
use crate::error::Result;
use crate::export::{artifact, ArtifactPair, ArtifactPaths};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::info;

/// Readers take a cheap `Arc` clone and predict without holding the lock;
/// a retrain replaces the whole pair in one pointer swap.
#[derive(Debug)]
pub struct ModelSlot {
    current: RwLock<Arc<ArtifactPair>>,
}

impl ModelSlot {
    pub fn new(pair: ArtifactPair) -> Self {
        Self {
            current: RwLock::new(Arc::new(pair)),
        }
    }

    /// Load a pair from disk; fails rather than serving a default model
    pub fn load(paths: &ArtifactPaths) -> Result<Self> {
        artifact::load(paths).map(Self::new)
    }

    pub fn current(&self) -> Arc<ArtifactPair> {
        Arc::clone(&self.current.read())
    }

    /// Adapter bound to the pair current at call time
    pub fn adapter(&self) -> InferenceAdapter {
        InferenceAdapter::new(self.current())
    }

    /// Install `pair` and return the one it replaced. In-flight predictions
    /// keep using the pair they started with.
    pub fn swap(&self, pair: ArtifactPair) -> Arc<ArtifactPair> {
        let next = Arc::new(pair);
        let previous = std::mem::replace(&mut *self.current.write(), next);
        info!(
            from = %previous.metadata().version,
            to = %self.current.read().metadata().version,
            "Swapped serving artifact"
        );
        previous
    }
}
