//! Content fingerprints for search directories.

use crate::search::section_files;
use crate::search::SECTION_DATA_FILE;
use std::fs;
use std::path::Path;
use xxhash_rust::xxh3::{Xxh3, xxh3_64};

/// Bumped whenever the cached catalog layout changes.
const CACHE_FORMAT_VERSION: u32 = 1;

/// Hashes the names and contents of every search script in `search_dir`.
///
/// Files are visited in name order so the fingerprint only changes when the
/// index itself does.
pub fn fingerprint_search_dir(search_dir: &Path) -> std::io::Result<u64> {
    let mut files: Vec<_> = section_files(search_dir)
        .map_err(std::io::Error::other)?
        .into_iter()
        .map(|(_, _, path)| path)
        .collect();
    let section_data = search_dir.join(SECTION_DATA_FILE);
    if section_data.is_file() {
        files.push(section_data);
    }
    files.sort();

    let mut hasher = Xxh3::new();
    hasher.update(&CACHE_FORMAT_VERSION.to_le_bytes());
    for path in files {
        if let Some(name) = path.file_name() {
            hasher.update(name.as_encoded_bytes());
        }
        let content = fs::read(&path)?;
        hasher.update(&(content.len() as u64).to_le_bytes());
        hasher.update(&content);
    }

    Ok(hasher.digest())
}

/// Stable file-name-safe key for a search directory path.
pub fn path_key(path: &Path) -> String {
    format!("{:016x}", xxh3_64(path.as_os_str().as_encoded_bytes()))
}
