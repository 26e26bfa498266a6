//! Shared state for the MCP server: the active catalog and recently opened ones.

use crate::cache::CatalogCache;
use crate::error::Result;
use crate::fingerprint::fingerprint_search_dir;
use crate::search::Catalog;
use anyhow::Context;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// Maximum number of parsed catalogs to keep in memory.
const LRU_CACHE_SIZE: NonZeroUsize = NonZeroUsize::new(16).unwrap();

/// A catalog together with the fingerprint it was built from.
type LoadedCatalog = (u64, Arc<Catalog>);

/// Shared state for catalog loading and caching.
///
/// This is the central coordination point for:
/// - The catalog tool calls query by default
/// - An LRU of parsed catalogs keyed by search directory
/// - The optional on-disk catalog cache
pub struct DocState {
    /// Catalog selected by the last `open_index`
    current: RwLock<Option<Arc<Catalog>>>,

    /// LRU cache of parsed catalogs
    loaded: Mutex<LruCache<PathBuf, LoadedCatalog>>,

    /// On-disk cache (disabled when `None`)
    disk_cache: Option<CatalogCache>,
}

impl std::fmt::Debug for DocState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocState")
            .field("disk_cache", &self.disk_cache)
            .finish_non_exhaustive()
    }
}

impl DocState {
    /// Create a new DocState with an optional on-disk cache.
    pub fn new(disk_cache: Option<CatalogCache>) -> Self {
        Self {
            current: RwLock::new(None),
            loaded: Mutex::new(LruCache::new(LRU_CACHE_SIZE)),
            disk_cache,
        }
    }

    /// Get the active catalog.
    pub async fn current(&self) -> Option<Arc<Catalog>> {
        self.current.read().await.clone()
    }

    /// Load the catalog at `path` and make it the active one.
    pub async fn open(&self, path: &Path) -> Result<Arc<Catalog>> {
        let catalog = self.load(path).await?;
        *self.current.write().await = Some(catalog.clone());
        Ok(catalog)
    }

    /// Load the catalog at `path` without changing the active one.
    ///
    /// Checks, in order, the in-memory LRU, the on-disk cache and finally
    /// parses the scripts. Every hit is validated against a fresh fingerprint.
    pub async fn load(&self, path: &Path) -> Result<Arc<Catalog>> {
        let path = path.to_path_buf();
        let (search_dir, fingerprint) = tokio::task::spawn_blocking(move || -> Result<_> {
            let search_dir = Catalog::locate(&path)?;
            let search_dir = std::fs::canonicalize(&search_dir)
                .with_context(|| format!("Failed to canonicalize {}", search_dir.display()))?;
            let fingerprint = fingerprint_search_dir(&search_dir)
                .with_context(|| format!("Failed to fingerprint {}", search_dir.display()))?;
            Ok((search_dir, fingerprint))
        })
        .await
        .context("Fingerprint task panicked")??;

        // 1. In-memory LRU
        {
            let mut loaded = self.loaded.lock().await;
            let hit = loaded
                .get(&search_dir)
                .map(|(cached_fingerprint, catalog)| (*cached_fingerprint, catalog.clone()));
            match hit {
                Some((cached_fingerprint, catalog)) if cached_fingerprint == fingerprint => {
                    tracing::debug!("Cache hit for {}", search_dir.display());
                    return Ok(catalog);
                }
                Some(_) => {
                    tracing::debug!("Dropping stale catalog for {}", search_dir.display());
                    loaded.pop(&search_dir);
                }
                None => {}
            }
        }

        // 2. On-disk cache
        if let Some(disk_cache) = &self.disk_cache
            && let Some(catalog) = disk_cache.load(&search_dir, fingerprint).await
        {
            return Ok(self.remember(search_dir, fingerprint, catalog).await);
        }

        // 3. Parse
        let dir = search_dir.clone();
        let catalog = tokio::task::spawn_blocking(move || Catalog::load(&dir))
            .await
            .context("Catalog loading task panicked")??;

        if let Some(disk_cache) = &self.disk_cache {
            disk_cache.store(&search_dir, fingerprint, &catalog).await;
        }

        Ok(self.remember(search_dir, fingerprint, catalog).await)
    }

    async fn remember(&self, search_dir: PathBuf, fingerprint: u64, catalog: Catalog) -> Arc<Catalog> {
        let catalog = Arc::new(catalog);
        self.loaded
            .lock()
            .await
            .put(search_dir, (fingerprint, catalog.clone()));
        catalog
    }

    /// Number of catalogs held in memory.
    pub async fn loaded_count(&self) -> usize {
        self.loaded.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::{check, let_assert};
    use tempfile::TempDir;

    fn site(content: &str) -> TempDir {
        let temp = TempDir::new().expect("temp dir");
        let search = temp.path().join("search");
        std::fs::create_dir_all(&search).expect("create search dir");
        std::fs::write(search.join("all_0.js"), content).expect("write");
        temp
    }

    const RUN: &str = "var searchData=[['run',['run',['../classbfl_1_1FilteringAlgorithm.html#a00',1,'bfl::FilteringAlgorithm::run()']]]];";
    const RESET: &str = "var searchData=[['reset',['reset',['../classbfl_1_1FilteringAlgorithm.html#a24',1,'bfl::FilteringAlgorithm']]]];";

    #[tokio::test(flavor = "multi_thread")]
    async fn test_open_sets_current() {
        let temp = site(RUN);
        let state = DocState::new(None);
        check!(state.current().await.is_none());

        let_assert!(Ok(catalog) = state.open(temp.path()).await);
        let_assert!(Some(current) = state.current().await);
        check!(Arc::ptr_eq(&catalog, &current));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_second_load_hits_memory() {
        let temp = site(RUN);
        let state = DocState::new(None);

        let_assert!(Ok(first) = state.load(temp.path()).await);
        let_assert!(Ok(second) = state.load(&temp.path().join("search")).await);
        check!(Arc::ptr_eq(&first, &second));
        check!(state.loaded_count().await == 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_regenerated_docs_are_reloaded() {
        let temp = site(RUN);
        let state = DocState::new(None);

        let_assert!(Ok(first) = state.load(temp.path()).await);
        std::fs::write(temp.path().join("search").join("all_0.js"), RESET).expect("write");
        let_assert!(Ok(second) = state.load(temp.path()).await);

        check!(!Arc::ptr_eq(&first, &second));
        check!(second.default_section().and_then(|s| s.index.get("reset")).is_some());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_disk_cache_round_trip() {
        let temp = site(RUN);
        let cache_dir = TempDir::new().expect("temp dir");

        let first = DocState::new(Some(CatalogCache::new(cache_dir.path())));
        let_assert!(Ok(parsed) = first.load(temp.path()).await);

        let second = DocState::new(Some(CatalogCache::new(cache_dir.path())));
        let_assert!(Ok(cached) = second.load(temp.path()).await);
        check!(*parsed == *cached);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_missing_path_is_an_error() {
        let temp = TempDir::new().expect("temp dir");
        let state = DocState::new(None);
        check!(state.open(&temp.path().join("missing")).await.is_err());
        check!(state.current().await.is_none());
    }
}
