//! Shared asset catalog snapshot for the search and commit endpoints.
//!
//! The catalog is loaded from every origin pool on first use and served until
//! its TTL expires or a write invalidates it. Each reload bumps the version so
//! the derived search corpus is rebuilt exactly once per snapshot.

use std::sync::Arc;
use std::time::{Duration, Instant};

use custodia_core::catalog::AssetCatalog;
use custodia_core::search::{CorpusCache, SearchCorpus};
use custodia_core::store::{CustodyStore, StoreError};
use tokio::sync::RwLock;

/// A loaded catalog together with its search corpus.
#[derive(Debug, Clone)]
pub struct CatalogSnapshot {
    pub catalog: Arc<AssetCatalog>,
    pub corpus: Arc<SearchCorpus>,
    loaded_at: Instant,
}

#[derive(Debug, Default)]
struct Slot {
    current: Option<CatalogSnapshot>,
    corpus: CorpusCache,
    version: u64,
}

#[derive(Debug)]
pub struct CatalogCache {
    ttl: Duration,
    slot: RwLock<Slot>,
}

impl CatalogCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slot: RwLock::new(Slot::default()),
        }
    }

    fn fresh(&self, slot: &Slot) -> Option<CatalogSnapshot> {
        slot.current
            .as_ref()
            .filter(|s| s.loaded_at.elapsed() < self.ttl)
            .cloned()
    }

    /// Current snapshot, reloading from `store` when missing or stale.
    pub async fn snapshot<S>(&self, store: &S) -> Result<CatalogSnapshot, StoreError>
    where
        S: CustodyStore + ?Sized,
    {
        if let Some(snapshot) = self.fresh(&*self.slot.read().await) {
            return Ok(snapshot);
        }

        let mut slot = self.slot.write().await;
        // Another request may have reloaded while we waited for the lock.
        if let Some(snapshot) = self.fresh(&slot) {
            return Ok(snapshot);
        }

        let version = slot.version + 1;
        let catalog = store.load_catalog(version).await?;
        let corpus = slot.corpus.get_or_build(&catalog);
        let snapshot = CatalogSnapshot {
            catalog: Arc::new(catalog),
            corpus,
            loaded_at: Instant::now(),
        };
        tracing::debug!(
            version,
            assets = snapshot.catalog.len(),
            "Asset catalog loaded"
        );

        slot.version = version;
        slot.current = Some(snapshot.clone());
        Ok(snapshot)
    }

    /// Drop the current snapshot; the next read reloads it.
    pub async fn invalidate(&self) {
        let mut slot = self.slot.write().await;
        slot.current = None;
        slot.corpus.invalidate();
    }
}
