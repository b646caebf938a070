//! Serialized-document cache.
//!
//! The JSON served at `openapi.json` is rebuilt only when the document's
//! generation moved since the last build. Readers never take the write lock;
//! a stale entry is replaced on the next read.

use std::sync::Arc;

use apidoc::{DocError, OpenApiDoc};
use arc_swap::ArcSwapOption;
use axum::body::Bytes;
use parking_lot::RwLock;

/// One serialized build of the document.
#[derive(Debug)]
pub struct CachedDoc {
    pub generation: u64,
    pub json: Bytes,
}

#[derive(Default)]
pub struct DocCache {
    inner: ArcSwapOption<CachedDoc>,
}

impl DocCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current serialized document, rebuilding if `doc` changed.
    pub fn get_or_build(&self, doc: &RwLock<OpenApiDoc>) -> Result<Arc<CachedDoc>, DocError> {
        let doc = doc.read();
        let generation = doc.generation();

        if let Some(cached) = self.inner.load_full() {
            if cached.generation == generation {
                return Ok(cached);
            }
        }

        tracing::debug!(generation, "Rebuilding cached OpenAPI document");
        let fresh = Arc::new(CachedDoc {
            generation,
            json: Bytes::from(doc.to_json()?),
        });
        self.inner.store(Some(Arc::clone(&fresh)));
        Ok(fresh)
    }

    /// Generation of the cached build, if any.
    pub fn cached_generation(&self) -> Option<u64> {
        self.inner.load_full().map(|c| c.generation)
    }

    pub fn invalidate(&self) {
        self.inner.store(None);
    }
}
