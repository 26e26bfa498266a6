//! Typed representation of Doxygen search index entries.

use super::key::{PageKind, decode_key, decode_page_name};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::path::Path;

/// Prefix Doxygen puts on every in-site link, since the search scripts live
/// one directory below the HTML root.
const SEARCH_DIR_PREFIX: &str = "../";

/// How the documentation browser opens an occurrence link.
///
/// Stored as the numeric flag in each occurrence triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkTarget {
    /// A page of this documentation site (flag `1`).
    Parent,
    /// A page of another site reached through a tag file (flag `0`).
    Blank,
}

impl LinkTarget {
    pub const fn from_flag(flag: i64) -> Self {
        if flag == 0 { Self::Blank } else { Self::Parent }
    }

    pub const fn flag(self) -> u8 {
        match self {
            Self::Parent => 1,
            Self::Blank => 0,
        }
    }
}

/// A link into the generated HTML tree: `<page>.html#<fragment>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Anchor {
    /// Path before the `#`, relative to the HTML root when `relative` is set.
    path: String,
    fragment: Option<String>,
    /// Whether the link was written relative to the `search/` directory.
    relative: bool,
}

impl Anchor {
    /// Parses a link as written in a search script.
    pub fn parse(url: &str) -> Self {
        let (relative, rest) = match url.strip_prefix(SEARCH_DIR_PREFIX) {
            Some(rest) => (true, rest),
            None => (false, url),
        };
        let (path, fragment) = match rest.split_once('#') {
            Some((path, fragment)) => (path, Some(fragment.to_string())),
            None => (rest, None),
        };

        Self {
            path: path.to_string(),
            fragment,
            relative,
        }
    }

    /// The link exactly as a search script writes it.
    pub fn to_url(&self) -> String {
        let prefix = if self.relative { SEARCH_DIR_PREFIX } else { "" };
        match &self.fragment {
            Some(fragment) => format!("{}{}#{}", prefix, self.path, fragment),
            None => format!("{}{}", prefix, self.path),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn fragment(&self) -> Option<&str> {
        self.fragment.as_deref()
    }

    pub const fn is_relative(&self) -> bool {
        self.relative
    }

    /// File name of the page without directory or `.html` extension.
    pub fn page_name(&self) -> &str {
        let file = self.path.rsplit('/').next().unwrap_or(&self.path);
        file.strip_suffix(".html").unwrap_or(file)
    }

    /// Kind and decoded name of the page this anchor points at.
    pub fn page(&self) -> (PageKind, String) {
        decode_page_name(self.page_name())
    }

    /// Resolves the anchor against the HTML root into a browsable URL.
    ///
    /// External links are returned unchanged.
    pub fn resolve(&self, html_root: &Path) -> String {
        if !self.relative {
            return self.to_url();
        }
        let file = html_root.join(&self.path);
        match &self.fragment {
            Some(fragment) => format!("file://{}#{}", file.display(), fragment),
            None => format!("file://{}", file.display()),
        }
    }
}

impl fmt::Display for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.fragment {
            Some(fragment) => write!(f, "{}#{}", self.path, fragment),
            None => f.write_str(&self.path),
        }
    }
}

/// One place a searchable name is documented.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Occurrence {
    pub anchor: Anchor,
    pub target: LinkTarget,
    /// Qualified title, HTML-escaped as emitted. Empty for files and pages.
    pub scope: String,
}

impl Occurrence {
    pub fn new(anchor: Anchor, target: LinkTarget, scope: impl Into<String>) -> Self {
        Self {
            anchor,
            target,
            scope: scope.into(),
        }
    }

    pub fn display_scope(&self) -> Cow<'_, str> {
        unescape_html(&self.scope)
    }
}

/// A searchable key with the label shown for it and every place it occurs.
///
/// Occurrences keep the order the documentation generator emitted them in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchEntry {
    pub key: String,
    /// Display label, HTML-escaped as emitted.
    pub label: String,
    pub occurrences: Vec<Occurrence>,
}

impl SearchEntry {
    /// Builds an entry, or `None` when the key or occurrence list is empty.
    pub fn new(
        key: impl Into<String>,
        label: impl Into<String>,
        occurrences: Vec<Occurrence>,
    ) -> Option<Self> {
        let key = key.into();
        if key.is_empty() || occurrences.is_empty() {
            return None;
        }
        Some(Self {
            key,
            label: label.into(),
            occurrences,
        })
    }

    /// The key with Doxygen's `_xx` escapes decoded.
    pub fn decoded_key(&self) -> String {
        decode_key(&self.key)
    }

    pub fn display_label(&self) -> Cow<'_, str> {
        unescape_html(&self.label)
    }
}

/// Decodes the handful of HTML entities Doxygen writes into labels.
pub fn unescape_html(text: &str) -> Cow<'_, str> {
    if !text.contains('&') {
        return Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find('&') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];

        let decoded = tail.find(';').and_then(|end| {
            let entity = &tail[1..end];
            let c = match entity {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                _ => entity
                    .strip_prefix("#x")
                    .or_else(|| entity.strip_prefix("#X"))
                    .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                    .or_else(|| entity.strip_prefix('#').and_then(|dec| dec.parse().ok()))
                    .and_then(char::from_u32),
            };
            c.map(|c| (c, end + 1))
        });

        match decoded {
            Some((c, consumed)) => {
                out.push(c);
                rest = &tail[consumed..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);

    Cow::Owned(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::check;
    use rstest::rstest;

    #[test]
    fn test_anchor_parse_relative_link() {
        let url = "../classbfl_1_1Resampling.html#a6b5a246250f1d193b3316c10bdc689f6";
        let anchor = Anchor::parse(url);

        check!(anchor.is_relative());
        check!(anchor.path() == "classbfl_1_1Resampling.html");
        check!(anchor.fragment() == Some("a6b5a246250f1d193b3316c10bdc689f6"));
        check!(anchor.page_name() == "classbfl_1_1Resampling");
        check!(anchor.to_url() == url);
        check!(
            anchor.to_string() == "classbfl_1_1Resampling.html#a6b5a246250f1d193b3316c10bdc689f6"
        );
    }

    #[test]
    fn test_anchor_without_fragment() {
        let anchor = Anchor::parse("../Resampling_8cpp.html");
        check!(anchor.fragment().is_none());
        check!(anchor.page() == (PageKind::File, "Resampling.cpp".to_string()));
        check!(anchor.to_url() == "../Resampling_8cpp.html");
    }

    #[test]
    fn test_anchor_external_link_resolves_unchanged() {
        let url = "https://en.cppreference.com/w/cpp/container/vector.html#ctor";
        let anchor = Anchor::parse(url);
        check!(!anchor.is_relative());
        check!(anchor.page_name() == "vector");
        check!(anchor.resolve(Path::new("/docs/html")) == url);
    }

    #[test]
    fn test_anchor_resolve_relative() {
        let anchor = Anchor::parse("../classbfl_1_1SIS.html#ad1a6");
        check!(anchor.resolve(Path::new("/docs/html")) == "file:///docs/html/classbfl_1_1SIS.html#ad1a6");
    }

    #[rstest]
    #[case(1, LinkTarget::Parent)]
    #[case(7, LinkTarget::Parent)]
    #[case(0, LinkTarget::Blank)]
    fn test_link_target_flag(#[case] flag: i64, #[case] expected: LinkTarget) {
        check!(LinkTarget::from_flag(flag) == expected);
    }

    #[rstest]
    #[case("Resampling(const Resampling &amp;resampling)", "Resampling(const Resampling &resampling)")]
    #[case("std::unique_ptr&lt; bfl::Initialization &gt;", "std::unique_ptr< bfl::Initialization >")]
    #[case("a &#39;b&#x27;", "a 'b'")]
    #[case("plain", "plain")]
    #[case("dangling & ampersand", "dangling & ampersand")]
    #[case("&bogus;", "&bogus;")]
    fn test_unescape_html(#[case] input: &str, #[case] expected: &str) {
        check!(unescape_html(input) == expected);
    }

    #[test]
    fn test_entry_rejects_empty_parts() {
        let occurrence = Occurrence::new(Anchor::parse("../x.html"), LinkTarget::Parent, "");
        check!(SearchEntry::new("", "x", vec![occurrence.clone()]).is_none());
        check!(SearchEntry::new("x", "x", vec![]).is_none());
        check!(SearchEntry::new("x", "x", vec![occurrence]).is_some());
    }
}
