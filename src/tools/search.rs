//! Search handler for looking symbols up in a Doxygen index.

use crate::search::{Catalog, MatchMode, SearchEntry, Section, suggest};
use crate::state::DocState;
use rmcp::schemars;
use serde::Deserialize;
use std::fmt::Write as _;
use std::path::Path;

/// Maximum number of "did you mean" keys listed when nothing matches.
const MAX_SUGGESTIONS: usize = 5;

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SearchRequest {
    /// Symbol name or fragment to look for (case-insensitive)
    pub query: String,
    /// Section to search, e.g. "all", "classes", "functions" (default: "all")
    #[serde(default)]
    pub section: Option<String>,
    /// "substring" matches anywhere in the key, "prefix" only at its start (default: "substring")
    #[serde(default)]
    pub mode: Option<MatchMode>,
    /// Maximum number of keys to return (default: 20, at least 1)
    #[serde(default = "default_limit")]
    pub limit: Option<usize>,
}

fn default_limit() -> Option<usize> {
    Some(20)
}

/// Execute a lookup against the active search index.
pub async fn handle_search(state: &DocState, request: SearchRequest) -> Result<String, String> {
    let catalog = state
        .current()
        .await
        .ok_or_else(|| "No search index open. Use open_index with a Doxygen HTML directory first.".to_string())?;

    let section = match request.section.as_deref() {
        Some(name) => catalog.section(name).ok_or_else(|| unknown_section(&catalog, name))?,
        None => catalog
            .default_section()
            .ok_or_else(|| "The open search index has no sections.".to_string())?,
    };

    let mode = request.mode.unwrap_or_default();
    let results = section.index.lookup(&request.query, mode);

    if results.is_empty() {
        return Ok(format_no_results(section, &request.query));
    }

    let limit = request.limit.unwrap_or(20).max(1);
    Ok(format_search_results(
        &results,
        limit,
        &request.query,
        section,
        catalog.html_root(),
    ))
}

fn unknown_section(catalog: &Catalog, name: &str) -> String {
    let available: Vec<_> = catalog
        .sections()
        .iter()
        .map(|section| section.info.name.as_str())
        .collect();
    format!(
        "Section '{}' not found. Available sections: {}",
        name,
        available.join(", ")
    )
}

fn format_no_results(section: &Section, query: &str) -> String {
    let mut msg = format!(
        "No results found for '{}' in section '{}'.\n\n",
        query, section.info.name
    );

    let suggestions = suggest(&section.index, query, MAX_SUGGESTIONS);
    if suggestions.is_empty() {
        msg.push_str("Search tips:\n");
        msg.push_str("• Try a shorter fragment of the symbol name\n");
        msg.push_str("• Search the 'all' section to include files and members\n");
        if query.contains("::") {
            msg.push_str("• Note: Keys are single names, not qualified paths\n");
        }
    } else {
        msg.push_str("Did you mean one of these?\n\n");
        for suggestion in suggestions {
            let _ = writeln!(msg, "• `{}`", suggestion.decoded);
        }
    }

    msg
}

/// Format search results into a readable string output.
fn format_search_results(
    results: &[&SearchEntry],
    limit: usize,
    query: &str,
    section: &Section,
    html_root: &Path,
) -> String {
    let mut output = format!(
        "Search results for '{}' in '{}' ({} keys):\n\n",
        query,
        section.info.name,
        results.len()
    );

    for (idx, entry) in results.iter().take(limit).enumerate() {
        let _ = writeln!(output, "{}. `{}`", idx + 1, entry.display_label());

        for occurrence in &entry.occurrences {
            let (kind, _) = occurrence.anchor.page();
            let scope = occurrence.display_scope();
            let title = if scope.is_empty() {
                entry.display_label()
            } else {
                scope
            };
            let _ = writeln!(
                output,
                "   - {} ({}) {}",
                title,
                kind,
                occurrence.anchor.resolve(html_root)
            );
        }
        output.push('\n');
    }

    if results.len() > limit {
        let _ = writeln!(
            output,
            "... and {} more keys. Narrow the query or raise the limit.",
            results.len() - limit
        );
    }

    output
}
