//! Doxygen search index model, codecs and lookup.
//!
//! This module reads the `search/*.js` files Doxygen generates for its
//! client-side search box, exposes them as immutable typed tables, answers
//! substring and prefix queries, and writes the tables back out.

// Module declarations
pub(crate) mod catalog;
pub(crate) mod index;
pub(crate) mod key;
pub(crate) mod model;
pub(crate) mod scoring;
pub(crate) mod script;

// Public re-exports (used via lib.rs)
pub use catalog::{Catalog, DEFAULT_SECTION, SEARCH_DIR, SECTION_DATA_FILE, Section};
pub use index::{IndexBuilder, MatchMode, ParseReport, SearchIndex};
pub use key::{PageKind, decode_key, decode_page_name, encode_key, unescape_page_name};
pub use model::{Anchor, LinkTarget, Occurrence, SearchEntry, unescape_html};
pub use scoring::{SUGGESTION_THRESHOLD, Suggestion, suggest};
pub use script::{
    SEARCH_DATA_VAR, Script, SectionInfo, Value, parse_search_data, parse_section_data,
    read_search_data, write_search_data,
};

// Internal re-exports
pub(crate) use catalog::section_files;
