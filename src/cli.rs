//! Command-line interface.

use crate::error::Result;
use crate::search::{Catalog, MatchMode, Section, write_search_data};
use crate::state::DocState;
use crate::tools::search::{SearchRequest, handle_search};
use anyhow::{Context, anyhow, bail};
use clap::{Parser, Subcommand, ValueEnum};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

#[derive(Debug, Parser)]
#[command(name = "doxygen-search-mcp", version)]
#[command(about = "Query Doxygen documentation search indexes", long_about = None)]
pub struct Cli {
    /// Doxygen HTML output directory, or its search/ subdirectory
    #[arg(short, long, env = "DOXYGEN_SEARCH_DOCS", global = true)]
    pub docs: Option<PathBuf>,

    /// Neither read nor write the on-disk catalog cache
    #[arg(long, env = "DOXYGEN_SEARCH_NO_CACHE", global = true)]
    pub no_cache: bool,

    /// Write logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Serve MCP tools over stdio (the default)
    Serve,
    /// Look a symbol up in the index
    Search {
        query: String,
        #[arg(short, long)]
        section: Option<String>,
        /// Match only at the start of keys
        #[arg(short, long)]
        prefix: bool,
        #[arg(short = 'n', long, default_value = "25")]
        limit: usize,
        /// Print matching entries as JSON
        #[arg(long)]
        json: bool,
    },
    /// Write one section back out
    Export {
        #[arg(short, long, default_value = "all")]
        section: String,
        #[arg(short, long, value_enum, default_value_t = ExportFormat::Js)]
        format: ExportFormat,
    },
    /// Load every section and report malformed entries
    Check,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    /// Doxygen `searchData` script
    Js,
    /// JSON object keyed by search key
    Json,
}

/// The docs directory, or an error naming both ways to set it.
pub fn require_docs(docs: Option<&Path>) -> Result<&Path> {
    docs.ok_or_else(|| anyhow!("No documentation directory. Pass --docs or set DOXYGEN_SEARCH_DOCS."))
}

pub async fn run_search(
    state: &DocState,
    docs: &Path,
    query: String,
    section: Option<String>,
    prefix: bool,
    limit: usize,
    json: bool,
) -> Result<String> {
    let catalog = state.open(docs).await?;
    let mode = if prefix { MatchMode::Prefix } else { MatchMode::Substring };

    if json {
        let entries = catalog
            .search(&query, section.as_deref(), mode)
            .ok_or_else(|| anyhow!("Section '{}' not found", section.as_deref().unwrap_or_default()))?;
        let entries: Vec<_> = entries.into_iter().take(limit).collect();
        return serde_json::to_string_pretty(&entries).context("Failed to serialize results");
    }

    let request = SearchRequest {
        query,
        section,
        mode: Some(mode),
        limit: Some(limit),
    };
    handle_search(state, request).await.map_err(|e| anyhow!(e))
}

pub async fn run_export(state: &DocState, docs: &Path, section: &str, format: ExportFormat) -> Result<String> {
    let catalog = state.load(docs).await?;
    let section = find_section(&catalog, section)?;

    match format {
        ExportFormat::Js => Ok(write_search_data(&section.index)),
        ExportFormat::Json => {
            serde_json::to_string_pretty(&section.index).context("Failed to serialize section")
        }
    }
}

pub async fn run_check(state: &DocState, docs: &Path) -> Result<String> {
    let catalog = state.load(docs).await?;
    let mut output = format!("{}\n", catalog.search_dir().display());
    let mut skipped = 0;

    for section in catalog.sections() {
        let report = section.report;
        skipped += report.skipped;
        let _ = writeln!(
            output,
            "  {:<12} {:>3} files {:>6} keys {:>6} skipped {:>6} merged",
            section.info.name,
            section.files,
            section.index.len(),
            report.skipped,
            report.merged
        );
    }

    if skipped > 0 {
        bail!("{}{} malformed entries skipped", output, skipped);
    }
    Ok(output)
}

fn find_section<'a>(catalog: &'a Catalog, name: &str) -> Result<&'a Section> {
    catalog.section(name).ok_or_else(|| {
        let names: Vec<_> = catalog.sections().iter().map(|s| s.info.name.as_str()).collect();
        anyhow!("Section '{}' not found. Available sections: {}", name, names.join(", "))
    })
}
