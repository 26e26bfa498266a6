//! Doxygen search-key and page-name codecs.
//!
//! Doxygen derives two kinds of identifiers from symbol names:
//! - **search keys** (`result_5fcor_5fweight_5f`): lower-cased, with every
//!   non-alphanumeric byte written as `_` plus two hex digits
//! - **page names** (`classbfl_1_1Resampling`): a kind prefix followed by the
//!   name with filesystem-hostile characters escaped (`::` becomes `_1_1`)

use serde::{Deserialize, Serialize};
use std::fmt::{self, Write as _};

/// Encodes a symbol name into a Doxygen search key.
pub fn encode_key(name: &str) -> String {
    let mut key = String::with_capacity(name.len());
    for byte in name.bytes() {
        if byte.is_ascii_alphanumeric() {
            key.push(char::from(byte.to_ascii_lowercase()));
        } else {
            let _ = write!(key, "_{:02x}", byte);
        }
    }
    key
}

/// Decodes a Doxygen search key back into the symbol text, ASCII lower-cased.
///
/// `_xx` sequences that are not two hex digits are kept literally.
pub fn decode_key(key: &str) -> String {
    let bytes = key.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'_'
            && let Some(byte) = hex_pair(bytes.get(i + 1..i + 3))
        {
            decoded.push(byte);
            i += 3;
            continue;
        }
        decoded.push(bytes[i]);
        i += 1;
    }

    String::from_utf8_lossy(&decoded).into_owned()
}

fn hex_pair(pair: Option<&[u8]>) -> Option<u8> {
    let pair = pair?;
    if !pair.iter().all(u8::is_ascii_hexdigit) {
        return None;
    }
    let text = std::str::from_utf8(pair).ok()?;
    u8::from_str_radix(text, 16).ok()
}

/// Kind of documentation page an anchor points at, derived from its file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageKind {
    Class,
    Struct,
    Union,
    Interface,
    Namespace,
    Group,
    Dir,
    File,
    Page,
    Other,
}

impl PageKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Class => "class",
            Self::Struct => "struct",
            Self::Union => "union",
            Self::Interface => "interface",
            Self::Namespace => "namespace",
            Self::Group => "group",
            Self::Dir => "dir",
            Self::File => "file",
            Self::Page => "page",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for PageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Generated listing pages that would otherwise be mistaken for compounds.
const LISTING_PAGES: &[&str] = &[
    "annotated",
    "classes",
    "files",
    "functions",
    "globals",
    "hierarchy",
    "index",
    "modules",
    "namespacemembers",
    "namespaces",
    "pages",
];

/// Compound prefixes in the order Doxygen's file naming is checked.
const COMPOUND_PREFIXES: &[(&str, PageKind)] = &[
    ("class", PageKind::Class),
    ("struct", PageKind::Struct),
    ("union", PageKind::Union),
    ("interface", PageKind::Interface),
    ("namespace", PageKind::Namespace),
];

/// Splits a page name (no `.html`) into its kind and decoded symbol name.
///
/// ```
/// use doxygen_search_mcp::search::{PageKind, decode_page_name};
///
/// let (kind, name) = decode_page_name("classbfl_1_1Resampling");
/// assert_eq!(kind, PageKind::Class);
/// assert_eq!(name, "bfl::Resampling");
/// ```
pub fn decode_page_name(page: &str) -> (PageKind, String) {
    if LISTING_PAGES.contains(&page) || page.starts_with("functions_") || page.starts_with("globals_")
    {
        return (PageKind::Page, page.to_string());
    }

    // Directory pages carry a hash, not an escaped name
    if let Some(hash) = page.strip_prefix("dir_") {
        return (PageKind::Dir, hash.to_string());
    }

    for (prefix, kind) in COMPOUND_PREFIXES {
        if let Some(rest) = page.strip_prefix(prefix)
            && !rest.is_empty()
        {
            return (*kind, unescape_page_name(rest));
        }
    }

    let decoded = unescape_page_name(page);
    if let Some(group) = decoded.strip_prefix("group_") {
        return (PageKind::Group, group.to_string());
    }
    if let Some(md) = decoded.strip_prefix("md_") {
        return (PageKind::Page, md.to_string());
    }
    if decoded.rsplit_once('.').is_some_and(|(stem, ext)| {
        !stem.is_empty() && !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric())
    }) {
        return (PageKind::File, decoded);
    }

    (PageKind::Other, decoded)
}

/// Reverses Doxygen's file-name character escaping.
pub fn unescape_page_name(escaped: &str) -> String {
    let mut out = String::with_capacity(escaped.len());
    let mut chars = escaped.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '_' {
            out.push(c);
            continue;
        }

        let Some(&next) = chars.peek() else {
            out.push('_');
            break;
        };

        let single = match next {
            '_' => Some('_'),
            '1' => Some(':'),
            '2' => Some('/'),
            '3' => Some('<'),
            '4' => Some('>'),
            '5' => Some('*'),
            '6' => Some('&'),
            '7' => Some('|'),
            '8' => Some('.'),
            '9' => Some('!'),
            _ => None,
        };
        if let Some(decoded) = single {
            chars.next();
            out.push(decoded);
            continue;
        }

        if next == '0' {
            let mut lookahead = chars.clone();
            lookahead.next();
            if let Some(decoded) = lookahead.next().and_then(two_char_escape) {
                chars.next();
                chars.next();
                out.push(decoded);
                continue;
            }
        }

        out.push('_');
    }

    out
}

fn two_char_escape(code: char) -> Option<char> {
    Some(match code {
        '0' => ',',
        '1' => ' ',
        '2' => '{',
        '3' => '}',
        '4' => '?',
        '5' => '^',
        '6' => '%',
        '7' => '(',
        '8' => ')',
        '9' => '+',
        'a' => '=',
        'b' => '$',
        'c' => '\\',
        'd' => '@',
        'e' => ']',
        'f' => '[',
        'g' => '#',
        'h' => '"',
        'i' => '~',
        'j' => '\'',
        'k' => ';',
        'l' => '`',
        _ => return None,
    })
}
