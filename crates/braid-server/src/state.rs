//! Server state
//!
//! TigerStyle: One cheaply-clonable handle over everything a request needs.
//! No shared mutable routing state: all routing state lives in the store.

use crate::facts::FactExtractor;
use braid_core::RoutingPolicy;
use braid_embed::EmbeddingService;
use braid_store::BranchStore;
use std::sync::Arc;
use std::time::Instant;

/// Server-wide shared state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    store: Arc<dyn BranchStore>,
    embeddings: Arc<dyn EmbeddingService>,
    facts: Arc<dyn FactExtractor>,
    policy: RoutingPolicy,
    start_time: Instant,
}

impl AppState {
    pub fn new(
        store: Arc<dyn BranchStore>,
        embeddings: Arc<dyn EmbeddingService>,
        facts: Arc<dyn FactExtractor>,
        policy: RoutingPolicy,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                store,
                embeddings,
                facts,
                policy,
                start_time: Instant::now(),
            }),
        }
    }

    pub fn store(&self) -> &Arc<dyn BranchStore> {
        &self.inner.store
    }

    pub fn embeddings(&self) -> &Arc<dyn EmbeddingService> {
        &self.inner.embeddings
    }

    pub fn facts(&self) -> &Arc<dyn FactExtractor> {
        &self.inner.facts
    }

    /// The server-level policy; per-request overrides are merged on top by
    /// the pipeline.
    pub fn policy(&self) -> &RoutingPolicy {
        &self.inner.policy
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.inner.start_time.elapsed().as_secs()
    }
}
