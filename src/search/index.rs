//! The immutable search table and its lookups.

use super::model::SearchEntry;
use rmcp::schemars;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::ops::AddAssign;

/// How a query is compared against decoded keys.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// Key contains the query anywhere.
    #[default]
    Substring,
    /// Key starts with the query, as Doxygen's own search box matches.
    Prefix,
}

/// Counters describing how a table was assembled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseReport {
    /// Elements accepted into the table.
    pub entries: usize,
    /// Malformed elements that were dropped.
    pub skipped: usize,
    /// Elements whose key was already present; their occurrences were appended.
    pub merged: usize,
}

impl AddAssign for ParseReport {
    fn add_assign(&mut self, other: Self) {
        self.entries += other.entries;
        self.skipped += other.skipped;
        self.merged += other.merged;
    }
}

/// Accumulates entries before the table is frozen.
#[derive(Debug, Default)]
pub struct IndexBuilder {
    entries: BTreeMap<String, SearchEntry>,
    report: ParseReport,
}

impl IndexBuilder {
    /// Adds an entry. A repeated key keeps the first label and appends the
    /// new occurrences after the existing ones.
    pub fn push(&mut self, entry: SearchEntry) {
        self.report.entries += 1;
        match self.entries.entry(entry.key.clone()) {
            Entry::Vacant(slot) => {
                slot.insert(entry);
            }
            Entry::Occupied(mut slot) => {
                tracing::debug!("Merging duplicate search key '{}'", entry.key);
                self.report.merged += 1;
                slot.get_mut().occurrences.extend(entry.occurrences);
            }
        }
    }

    /// Records a dropped element.
    pub fn skip(&mut self) {
        self.report.skipped += 1;
    }

    pub fn finish(self) -> (SearchIndex, ParseReport) {
        (
            SearchIndex {
                entries: self.entries,
            },
            self.report,
        )
    }
}

/// A Doxygen search table: unique keys, each with a non-empty occurrence list.
///
/// Built once through [`IndexBuilder`] and read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchIndex {
    entries: BTreeMap<String, SearchEntry>,
}

impl SearchIndex {
    pub fn get(&self, key: &str) -> Option<&SearchEntry> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = &SearchEntry> {
        self.entries.values()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Entries whose decoded key contains `query`, case-insensitively, in key order.
    ///
    /// Keys only have ASCII lower-cased, so both sides are folded before comparing.
    ///
    /// An empty query matches every entry.
    pub fn search(&self, query: &str) -> Vec<&SearchEntry> {
        self.lookup(query, MatchMode::Substring)
    }

    /// Entries whose decoded key starts with `query`, case-insensitively, in key order.
    pub fn search_prefix(&self, query: &str) -> Vec<&SearchEntry> {
        self.lookup(query, MatchMode::Prefix)
    }

    pub fn lookup(&self, query: &str, mode: MatchMode) -> Vec<&SearchEntry> {
        let needle = query.to_lowercase();
        self.entries
            .values()
            .filter(|entry| {
                let key = entry.decoded_key().to_lowercase();
                match mode {
                    MatchMode::Substring => key.contains(&needle),
                    MatchMode::Prefix => key.starts_with(&needle),
                }
            })
            .collect()
    }

    /// Total number of occurrence records across all entries.
    pub fn occurrence_count(&self) -> usize {
        self.entries.values().map(|entry| entry.occurrences.len()).sum()
    }
}

impl<'a> IntoIterator for &'a SearchIndex {
    type Item = &'a SearchEntry;
    type IntoIter = std::collections::btree_map::Values<'a, String, SearchEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.values()
    }
}
