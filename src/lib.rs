//! Load, query and re-emit Doxygen client-side search indexes.
//!
//! The [`search`] module is the library core: a typed model of the
//! `search/*.js` tables Doxygen generates, with lookup and serialization.
//! The remaining modules wrap it as an MCP server and a command-line tool.

pub mod cache;
pub mod cli;
pub mod error;
pub mod fingerprint;
pub mod schema;
pub mod search;
pub mod server;
pub mod state;
pub mod tools;
pub mod tracing;

pub use cache::CatalogCache;
pub use error::{LoadError, ParseError, ScriptError};
pub use search::{
    Anchor, Catalog, LinkTarget, MatchMode, Occurrence, SearchEntry, SearchIndex, parse_search_data,
    write_search_data,
};
pub use server::SearchServer;
pub use state::DocState;
