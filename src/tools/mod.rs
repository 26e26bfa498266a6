pub mod list_sections;
pub mod open_index;
pub mod search;

pub use list_sections::*;
pub use open_index::*;
pub use search::*;
