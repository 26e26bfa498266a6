//! Loading a whole Doxygen `search/` directory.
//!
//! Doxygen splits its index by section (`all`, `classes`, `functions`, ...)
//! and by initial character, writing one `<section>_<n>.js` file per pair.
//! A [`Catalog`] merges each section's files back into one [`SearchIndex`].

use super::index::{IndexBuilder, MatchMode, ParseReport, SearchIndex};
use super::model::SearchEntry;
use super::script::{SectionInfo, Script, capitalize, parse_section_data, read_search_data};
use crate::error::LoadError;
use ahash::AHashMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// Name of the search directory below the HTML root.
pub const SEARCH_DIR: &str = "search";

/// Section metadata file written by Doxygen 1.8.x and later.
pub const SECTION_DATA_FILE: &str = "searchdata.js";

/// Section searched when none is named.
pub const DEFAULT_SECTION: &str = "all";

static SECTION_FILE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<section>[a-z]+)_(?P<id>[0-9a-f]+)\.js$").expect("valid section file regex")
});

/// One search category with its merged table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub info: SectionInfo,
    pub index: SearchIndex,
    /// Number of files merged into `index`.
    pub files: usize,
    pub report: ParseReport,
}

/// Every section of one documentation site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    search_dir: PathBuf,
    sections: Vec<Section>,
}

impl Catalog {
    /// Finds the search directory for `path`, which may be the HTML root or
    /// the `search/` directory itself.
    pub fn locate(path: &Path) -> Result<PathBuf, LoadError> {
        if !path.is_dir() {
            return Err(LoadError::NotFound {
                path: path.to_path_buf(),
            });
        }
        if looks_like_search_dir(path) {
            return Ok(path.to_path_buf());
        }

        let nested = path.join(SEARCH_DIR);
        if nested.is_dir() {
            return Ok(nested);
        }

        Err(LoadError::NotFound { path: nested })
    }

    /// Reads and merges every section file below `path`.
    pub fn load(path: &Path) -> Result<Self, LoadError> {
        let search_dir = Self::locate(path)?;
        let start = std::time::Instant::now();

        let mut files: AHashMap<String, Vec<(u64, PathBuf)>> = AHashMap::new();
        for (section, id, file) in section_files(&search_dir)? {
            files.entry(section).or_default().push((id, file));
        }
        if files.is_empty() {
            return Err(LoadError::Empty { path: search_dir });
        }

        let mut infos = read_section_infos(&search_dir)?;
        // Sections with files but no metadata go last, alphabetically
        let mut unlisted: Vec<_> = files
            .keys()
            .filter(|name| !infos.iter().any(|info| &info.name == *name))
            .cloned()
            .collect();
        unlisted.sort();
        let next_id = infos.iter().map(|info| info.id.saturating_add(1)).max().unwrap_or(0);
        for (offset, name) in (0u32..).zip(unlisted) {
            infos.push(SectionInfo {
                id: next_id.saturating_add(offset),
                label: capitalize(&name),
                name,
                initials: String::new(),
            });
        }

        let mut sections = Vec::with_capacity(infos.len());
        for info in infos {
            let mut section_files = files.remove(&info.name).unwrap_or_default();
            section_files.sort_by_key(|(id, _)| *id);
            sections.push(load_section(info, &section_files)?);
        }

        let catalog = Self {
            search_dir,
            sections,
        };
        tracing::info!(
            "Loaded search index from {}: {} sections, {} entries in {:?}",
            catalog.search_dir.display(),
            catalog.sections.len(),
            catalog.entry_count(),
            start.elapsed()
        );

        Ok(catalog)
    }

    pub fn search_dir(&self) -> &Path {
        &self.search_dir
    }

    /// The HTML root that anchors are relative to.
    pub fn html_root(&self) -> &Path {
        self.search_dir.parent().unwrap_or(self.search_dir.as_path())
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Looks a section up by file prefix or label, case-insensitively.
    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections.iter().find(|section| {
            section.info.name.eq_ignore_ascii_case(name) || section.info.label.eq_ignore_ascii_case(name)
        })
    }

    /// The `all` section when present, otherwise the first one.
    pub fn default_section(&self) -> Option<&Section> {
        self.section(DEFAULT_SECTION).or_else(|| self.sections.first())
    }

    /// Searches one section; `None` if the section does not exist.
    pub fn search(
        &self,
        query: &str,
        section: Option<&str>,
        mode: MatchMode,
    ) -> Option<Vec<&SearchEntry>> {
        let section = match section {
            Some(name) => self.section(name)?,
            None => self.default_section()?,
        };
        Some(section.index.lookup(query, mode))
    }

    pub fn entry_count(&self) -> usize {
        self.sections.iter().map(|section| section.index.len()).sum()
    }
}

fn looks_like_search_dir(path: &Path) -> bool {
    path.join(SECTION_DATA_FILE).is_file()
        || std::fs::read_dir(path).is_ok_and(|entries| {
            entries
                .filter_map(Result::ok)
                .any(|entry| entry.file_name().to_str().is_some_and(|name| SECTION_FILE.is_match(name)))
        })
}

/// Lists `(section, id, path)` for every section file in the directory.
pub(crate) fn section_files(search_dir: &Path) -> Result<Vec<(String, u64, PathBuf)>, LoadError> {
    let io_error = |source| LoadError::Io {
        path: search_dir.to_path_buf(),
        source,
    };

    let mut found = Vec::new();
    for entry in std::fs::read_dir(search_dir).map_err(io_error)? {
        let entry = entry.map_err(io_error)?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        let Some(captures) = SECTION_FILE.captures(name) else {
            continue;
        };
        let Ok(id) = u64::from_str_radix(&captures["id"], 16) else {
            tracing::debug!("Ignoring search file with oversized id: {}", name);
            continue;
        };
        found.push((captures["section"].to_string(), id, entry.path()));
    }

    Ok(found)
}

fn read_section_infos(search_dir: &Path) -> Result<Vec<SectionInfo>, LoadError> {
    let path = search_dir.join(SECTION_DATA_FILE);
    if !path.is_file() {
        tracing::debug!(
            "No {} in {}, inferring sections from file names",
            SECTION_DATA_FILE,
            search_dir.display()
        );
        return Ok(vec![]);
    }

    let source = read_source(&path)?;
    parse_section_data(&source).map_err(|source| LoadError::Parse { path, source })
}

fn load_section(info: SectionInfo, files: &[(u64, PathBuf)]) -> Result<Section, LoadError> {
    let mut builder = IndexBuilder::default();

    for (_, path) in files {
        let source = read_source(path)?;
        let script = Script::parse(&source).map_err(|source| LoadError::Parse {
            path: path.clone(),
            source: source.into(),
        })?;
        read_search_data(&script, &mut builder).map_err(|source| LoadError::Parse {
            path: path.clone(),
            source,
        })?;
    }

    let (index, report) = builder.finish();
    if report.skipped > 0 {
        tracing::warn!(
            "Section '{}': skipped {} malformed entries",
            info.name,
            report.skipped
        );
    }
    tracing::debug!(
        "Section '{}': {} files, {} entries",
        info.name,
        files.len(),
        index.len()
    );

    Ok(Section {
        info,
        index,
        files: files.len(),
        report,
    })
}

fn read_source(path: &Path) -> Result<String, LoadError> {
    std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}
