//! Shared test fixtures and utilities for integration tests.
//!
//! # Test Isolation Strategy
//!
//! Tests use isolated documentation sites to prevent cache interference. Each test gets:
//! - A fresh temporary directory with the fixture `html/search/` files copied in
//! - Its own `DocState` with an empty in-memory LRU
//! - A private on-disk cache directory (cold cache state)
//!
//! # Available Fixtures
//!
//! - `isolated_site`: A copied fixture site with nothing opened yet
//!
//! Call `IsolatedSite::open()` at the start of a test to make the copy the
//! active index.

use doxygen_search_mcp::{CatalogCache, DocState};
use rstest::fixture;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// Returns the fixture documentation site shipped with the tests.
pub fn fixture_html() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/html")
}

/// A temporary directory for test isolation.
///
/// Cleaned up automatically when dropped.
#[allow(dead_code)] // Methods used across different integration test crates
pub struct TempWorkspace {
    _temp: TempDir,
    root: PathBuf,
}

#[allow(dead_code)] // Methods used across different integration test crates
impl TempWorkspace {
    /// Creates a new empty temporary workspace.
    pub fn new() -> Self {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let root = temp.path().to_path_buf();
        Self { _temp: temp, root }
    }

    /// Returns the root path of this workspace.
    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Creates a file with the given content within this workspace.
    ///
    /// Parent directories are created automatically if they don't exist.
    ///
    /// # Panics
    /// Panics if file creation fails.
    pub fn create_file(&self, path: &str, content: &str) {
        let full_path = self.root.join(path);
        if let Some(parent) = full_path.parent() {
            std::fs::create_dir_all(parent).unwrap_or_else(|e| {
                panic!("Failed to create parent directory for '{}': {}", path, e)
            });
        }
        std::fs::write(&full_path, content)
            .unwrap_or_else(|e| panic!("Failed to write file '{}': {}", path, e));
    }

    /// Copies every file of a real directory into `dest_relative`.
    ///
    /// # Panics
    /// Panics if copying fails.
    pub fn copy_dir(&self, source: &Path, dest_relative: &str) {
        let dest = self.root.join(dest_relative);
        std::fs::create_dir_all(&dest)
            .unwrap_or_else(|e| panic!("Failed to create '{}': {}", dest_relative, e));
        for entry in std::fs::read_dir(source).expect("Failed to read fixture directory") {
            let entry = entry.expect("Failed to read fixture entry");
            std::fs::copy(entry.path(), dest.join(entry.file_name())).unwrap_or_else(|e| {
                panic!("Failed to copy '{}': {}", entry.path().display(), e)
            });
        }
    }
}

impl Default for TempWorkspace {
    fn default() -> Self {
        Self::new()
    }
}

/// An isolated documentation site for MCP server testing.
///
/// Composes [`TempWorkspace`] with a fresh `DocState` and private cache dir.
#[allow(dead_code)] // Fields used across different integration test crates
pub struct IsolatedSite {
    workspace: TempWorkspace,
    cache: TempWorkspace,
    pub state: Arc<DocState>,
}

#[allow(dead_code)] // Methods used across different integration test crates
impl IsolatedSite {
    pub fn new() -> Self {
        doxygen_search_mcp::tracing::init(false);

        let workspace = TempWorkspace::new();
        workspace.copy_dir(&fixture_html().join("search"), "html/search");

        let cache = TempWorkspace::new();
        let state = Arc::new(DocState::new(Some(CatalogCache::new(cache.path()))));

        Self {
            workspace,
            cache,
            state,
        }
    }

    /// The copied HTML root.
    pub fn html(&self) -> PathBuf {
        self.workspace.path().join("html")
    }

    /// The copied `search/` directory.
    pub fn search_dir(&self) -> PathBuf {
        self.html().join("search")
    }

    /// Overwrites or adds a search script.
    pub fn write_search_file(&self, name: &str, content: &str) {
        self.workspace
            .create_file(&format!("html/search/{}", name), content);
    }

    pub fn cache_dir(&self) -> &Path {
        self.cache.path()
    }

    /// Opens the copied site as the active index.
    ///
    /// # Panics
    /// Panics if the fixture site fails to load.
    pub async fn open(&self) {
        self.state
            .open(&self.html())
            .await
            .expect("Failed to open fixture site");
    }
}

impl Default for IsolatedSite {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture providing a fresh site with no index opened.
#[fixture]
pub fn isolated_site() -> IsolatedSite {
    IsolatedSite::new()
}
