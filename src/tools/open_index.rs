use crate::search::Catalog;
use crate::state::DocState;
use rmcp::schemars;
use serde::Deserialize;
use std::borrow::Cow;
use std::fmt::Write as _;
use std::path::PathBuf;

/// Parameters for open_index tool
#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct OpenIndexRequest {
    /// Path to the Doxygen HTML output directory or its `search/` subdirectory
    pub path: String,
}

/// Load a documentation search index and make it the active one.
pub async fn handle_open_index(state: &DocState, request: OpenIndexRequest) -> Result<String, String> {
    let path = PathBuf::from(expand_tilde(&request.path).as_ref());

    let catalog = state
        .open(&path)
        .await
        .map_err(|e| format!("Failed to open search index: {:#}", e))?;

    Ok(format_response(&catalog))
}

/// Format a user-friendly summary of a loaded catalog.
pub fn format_response(catalog: &Catalog) -> String {
    let mut response = format!(
        "Search index opened: {}\n\nSections ({}):\n",
        catalog.search_dir().display(),
        catalog.sections().len()
    );

    for section in catalog.sections() {
        let _ = write!(
            response,
            "  - {} ({}): {} keys, {} occurrences",
            section.info.label,
            section.info.name,
            section.index.len(),
            section.index.occurrence_count()
        );
        if section.report.skipped > 0 {
            let _ = write!(response, ", {} malformed entries skipped", section.report.skipped);
        }
        response.push('\n');
    }

    response
}

/// Expands tilde (`~`) in a path to the user's home directory.
///
/// - `~/foo` becomes `/home/user/foo`
/// - `~` becomes `/home/user`
/// - Other paths are returned unchanged
///
/// Returns `Cow::Borrowed` if no expansion needed, `Cow::Owned` if expanded.
pub fn expand_tilde(path: &str) -> Cow<'_, str> {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return Cow::Owned(home.join(stripped).display().to_string());
        }
    } else if path == "~"
        && let Some(home) = dirs::home_dir()
    {
        return Cow::Owned(home.display().to_string());
    }
    Cow::Borrowed(path)
}
