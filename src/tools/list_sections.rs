use crate::state::DocState;
use std::fmt::Write as _;

/// List the sections of the active search index.
///
/// Shows each section's label, file prefix and size, plus the initial
/// characters Doxygen generated files for.
pub async fn handle_list_sections(state: &DocState) -> Result<String, String> {
    let catalog = state
        .current()
        .await
        .ok_or_else(|| "No search index open. Use open_index first.".to_string())?;

    let mut output = format!("Sections of {}:\n\n", catalog.search_dir().display());

    for section in catalog.sections() {
        let _ = writeln!(
            output,
            "• {} (`{}`): {} keys in {} files",
            section.info.label,
            section.info.name,
            section.index.len(),
            section.files
        );
        if !section.info.initials.is_empty() {
            let _ = writeln!(output, "  initials: {}", section.info.initials);
        }
    }

    Ok(output)
}
