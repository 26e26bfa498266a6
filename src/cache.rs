//! On-disk cache of parsed catalogs.
//!
//! Each search directory gets one postcard file named after its path. The
//! file stores the fingerprint it was built from; a different fingerprint
//! means the documentation was regenerated and the entry is discarded.

use crate::fingerprint::path_key;
use crate::search::Catalog;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

/// Directory name below the platform cache dir.
const CACHE_DIR_NAME: &str = "doxygen-search-mcp";

/// Distinguishes temp files of concurrent stores within one process.
static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

#[derive(Serialize, Deserialize)]
struct CachedCatalog {
    fingerprint: u64,
    catalog: Catalog,
}

/// Location of cached catalogs.
#[derive(Debug, Clone)]
pub struct CatalogCache {
    dir: PathBuf,
}

impl CatalogCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The cache under the platform cache directory, if one exists.
    pub fn platform_default() -> Option<Self> {
        dirs::cache_dir().map(|dir| Self::new(dir.join(CACHE_DIR_NAME)))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn entry_path(&self, search_dir: &Path) -> PathBuf {
        self.dir.join(format!("{}.bin", path_key(search_dir)))
    }

    /// Loads the cached catalog for `search_dir` if it matches `fingerprint`.
    pub async fn load(&self, search_dir: &Path, fingerprint: u64) -> Option<Catalog> {
        let path = self.entry_path(search_dir);
        let bytes = tokio::fs::read(&path).await.ok()?;

        // Deserialize in spawn_blocking since it's CPU intensive
        let cached = tokio::task::spawn_blocking(move || {
            postcard::from_bytes::<CachedCatalog>(&bytes)
        })
        .await
        .ok()?;

        match cached {
            Ok(cached) if cached.fingerprint == fingerprint => {
                tracing::debug!("Using cached catalog for {}", search_dir.display());
                Some(cached.catalog)
            }
            Ok(_) => {
                tracing::info!(
                    "Cache stale, will rebuild catalog (file: {})",
                    path.display()
                );
                let _ = tokio::fs::remove_file(&path).await;
                None
            }
            Err(e) => {
                tracing::warn!("Failed to deserialize cached catalog at {}: {}", path.display(), e);
                let _ = tokio::fs::remove_file(&path).await;
                None
            }
        }
    }

    /// Stores a catalog. Failures are logged and otherwise ignored.
    ///
    /// The entry is written to a temp file and renamed into place, so readers
    /// never observe a partial file.
    pub async fn store(&self, search_dir: &Path, fingerprint: u64, catalog: &Catalog) {
        let path = self.entry_path(search_dir);
        let cached = CachedCatalog {
            fingerprint,
            catalog: catalog.clone(),
        };

        let bytes = match tokio::task::spawn_blocking(move || postcard::to_stdvec(&cached)).await {
            Ok(Ok(bytes)) => bytes,
            Ok(Err(e)) => {
                tracing::warn!("Failed to serialize catalog for {}: {}", search_dir.display(), e);
                return;
            }
            Err(e) => {
                tracing::warn!("Catalog serialization task failed: {}", e);
                return;
            }
        };

        if let Err(e) = tokio::fs::create_dir_all(&self.dir).await {
            tracing::warn!("Failed to create cache dir {}: {}", self.dir.display(), e);
            return;
        }

        let temp_path = path.with_extension(format!(
            "{}-{}.tmp",
            std::process::id(),
            TEMP_COUNTER.fetch_add(1, Ordering::Relaxed)
        ));
        if let Err(e) = tokio::fs::write(&temp_path, bytes).await {
            tracing::warn!("Failed to write catalog cache to {}: {}", temp_path.display(), e);
            let _ = tokio::fs::remove_file(&temp_path).await;
            return;
        }
        match tokio::fs::rename(&temp_path, &path).await {
            Ok(()) => tracing::debug!("Cached catalog to {}", path.display()),
            Err(e) => {
                tracing::warn!("Failed to move catalog cache into {}: {}", path.display(), e);
                let _ = tokio::fs::remove_file(&temp_path).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::{check, let_assert};
    use tempfile::TempDir;

    fn catalog(root: &Path) -> Catalog {
        let search = root.join("search");
        std::fs::create_dir_all(&search).expect("create search dir");
        std::fs::write(
            search.join("all_0.js"),
            "var searchData=[['reset',['reset',['../classbfl_1_1FilteringAlgorithm.html#a24',1,'bfl::FilteringAlgorithm']]]];",
        )
        .expect("write");
        Catalog::load(root).expect("load catalog")
    }

    #[tokio::test]
    async fn test_store_then_load() {
        let site = TempDir::new().expect("temp dir");
        let cache_dir = TempDir::new().expect("temp dir");
        let cache = CatalogCache::new(cache_dir.path());
        let catalog = catalog(site.path());

        cache.store(catalog.search_dir(), 42, &catalog).await;
        let_assert!(Some(loaded) = cache.load(catalog.search_dir(), 42).await);
        check!(loaded == catalog);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_concurrent_stores_leave_one_complete_entry() {
        let site = TempDir::new().expect("temp dir");
        let cache_dir = TempDir::new().expect("temp dir");
        let cache = CatalogCache::new(cache_dir.path());
        let catalog = catalog(site.path());

        let stores = (0..8).map(|_| {
            let cache = cache.clone();
            let catalog = catalog.clone();
            tokio::spawn(async move { cache.store(catalog.search_dir(), 7, &catalog).await })
        });
        for store in stores.collect::<Vec<_>>() {
            store.await.expect("store task");
        }

        let files: Vec<_> = std::fs::read_dir(cache.dir())
            .expect("read cache dir")
            .map(|entry| entry.expect("dir entry").path())
            .collect();
        let_assert!([file] = files.as_slice());
        check!(file.extension().is_some_and(|ext| ext == "bin"));

        let_assert!(Some(loaded) = cache.load(catalog.search_dir(), 7).await);
        check!(loaded == catalog);
    }

    #[tokio::test]
    async fn test_stale_fingerprint_is_discarded() {
        let site = TempDir::new().expect("temp dir");
        let cache_dir = TempDir::new().expect("temp dir");
        let cache = CatalogCache::new(cache_dir.path());
        let catalog = catalog(site.path());

        cache.store(catalog.search_dir(), 1, &catalog).await;
        check!(cache.load(catalog.search_dir(), 2).await.is_none());
        // The stale entry is removed, so even the old fingerprint misses now
        check!(cache.load(catalog.search_dir(), 1).await.is_none());
    }

    #[tokio::test]
    async fn test_corrupt_entry_is_a_miss() {
        let site = TempDir::new().expect("temp dir");
        let cache_dir = TempDir::new().expect("temp dir");
        let cache = CatalogCache::new(cache_dir.path());
        let catalog = catalog(site.path());

        std::fs::write(cache.entry_path(catalog.search_dir()), b"\xff\xff\xff").expect("write");
        check!(cache.load(catalog.search_dir(), 0).await.is_none());
    }
}
