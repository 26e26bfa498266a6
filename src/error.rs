//! Error handling types and utilities.

use std::path::PathBuf;

/// A specialized Result type for doxygen-search-mcp plumbing.
///
/// This is an alias for `anyhow::Result` with context added via `.context()` and
/// `.with_context()` methods throughout the codebase.
pub type Result<T> = anyhow::Result<T>;

/// A syntax error in a Doxygen search script, with a 1-based source position.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("line {line}, column {column}: {message}")]
pub struct ScriptError {
    pub line: usize,
    pub column: usize,
    pub message: String,
}

/// Error returned when a search script is syntactically valid but does not
/// carry the expected variables.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error(transparent)]
    Syntax(#[from] ScriptError),
    /// The script never assigns the requested variable.
    #[error("variable `{0}` is not defined")]
    MissingVariable(String),
    /// The variable exists but holds the wrong kind of value.
    #[error("variable `{variable}` should be {expected}")]
    Shape {
        variable: String,
        expected: &'static str,
    },
}

/// Error returned when loading a documentation search directory fails.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// Search directory not found at the expected path.
    #[error("Search index not found at {}", path.display())]
    NotFound { path: PathBuf },
    /// The directory exists but holds no `<section>_<n>.js` files.
    #[error("No search index files in {}", path.display())]
    Empty { path: PathBuf },
    /// A search file could not be read.
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// A search file could not be parsed.
    #[error("Failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: ParseError,
    },
}
