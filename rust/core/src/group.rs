// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Hierarchical grouping of flat record lists.
//!
//! A [`GroupKey`] lists the nesting levels; [`build_group_tree`] walks the
//! records once and files each one under its full key path. Sibling keys keep
//! the order in which they were first seen, so tables render in source order.
//! An absent field never fails the grouping: it is replaced by the level's
//! fallback label.

use rustc_hash::{FxHashMap, FxHashSet};
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Deserialize, Serialize, Serializer};

use crate::discipline::{file_name_token, DISCIPLINE_TOKEN_INDEX, NO_DISCIPLINE};
use crate::error::{Error, Result};
use crate::record::Record;

/// Where a grouping level reads its value from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum KeySource {
    /// The value of a record field.
    Field { field: String },
    /// The `index`-th `_`-separated token of a file-name field.
    FileNameToken { field: String, index: usize },
}

/// One level of a [`GroupKey`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyPart {
    /// Level name (shown as the column/selector name).
    pub name: String,
    pub source: KeySource,
    /// Label used when the value is absent.
    pub fallback: String,
}

impl KeyPart {
    /// Groups by a plain field. Absent values fall back to `"No <name>"`.
    pub fn field(name: &str) -> Self {
        Self {
            name: name.to_string(),
            source: KeySource::Field {
                field: name.to_string(),
            },
            fallback: format!("No {name}"),
        }
    }

    /// Groups by a token of a file-name field.
    pub fn file_name_token(name: &str, field: &str, index: usize) -> Self {
        Self {
            name: name.to_string(),
            source: KeySource::FileNameToken {
                field: field.to_string(),
                index,
            },
            fallback: format!("No {name}"),
        }
    }

    /// Groups by the discipline token of `file_name`.
    pub fn discipline() -> Self {
        Self::file_name_token("discipline", "file_name", DISCIPLINE_TOKEN_INDEX)
            .with_fallback(NO_DISCIPLINE)
    }

    /// Replaces the fallback label.
    pub fn with_fallback(mut self, fallback: &str) -> Self {
        self.fallback = fallback.to_string();
        self
    }

    /// Reads this level's value from a record, `None` when absent.
    pub fn resolve(&self, record: &Record) -> Option<String> {
        match &self.source {
            KeySource::Field { field } => record.label(field),
            KeySource::FileNameToken { field, index } => record
                .label(field)
                .and_then(|name| file_name_token(&name, *index).map(str::to_string)),
        }
    }

    /// Reads this level's value, substituting the fallback when absent.
    pub fn label_for(&self, record: &Record) -> String {
        self.resolve(record).unwrap_or_else(|| self.fallback.clone())
    }
}

/// Ordered nesting levels for a grouped view. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupKey {
    parts: Vec<KeyPart>,
}

impl GroupKey {
    /// Creates a key from its levels.
    pub fn new(parts: Vec<KeyPart>) -> Result<Self> {
        if parts.is_empty() {
            return Err(Error::EmptyGroupKey);
        }
        Ok(Self { parts })
    }

    /// Creates a key of plain field levels.
    pub fn fields(names: &[&str]) -> Result<Self> {
        Self::new(names.iter().map(|name| KeyPart::field(name)).collect())
    }

    pub fn parts(&self) -> &[KeyPart] {
        &self.parts
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    /// Always `false`; present for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Level names in nesting order.
    pub fn names(&self) -> Vec<&str> {
        self.parts.iter().map(|p| p.name.as_str()).collect()
    }
}

/// Children of one tree node, in first-occurrence order.
#[derive(Debug, Clone, Default)]
pub struct GroupBranch {
    entries: Vec<(String, GroupTree)>,
    index: FxHashMap<String, usize>,
}

impl GroupBranch {
    fn entry(&mut self, key: String, make: impl FnOnce() -> GroupTree) -> &mut GroupTree {
        let idx = match self.index.get(&key) {
            Some(&idx) => idx,
            None => {
                let idx = self.entries.len();
                self.index.insert(key.clone(), idx);
                self.entries.push((key, make()));
                idx
            }
        };
        &mut self.entries[idx].1
    }

    /// Returns the child stored under `key`.
    pub fn get(&self, key: &str) -> Option<&GroupTree> {
        self.index.get(key).map(|&idx| &self.entries[idx].1)
    }

    /// Child keys in first-occurrence order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &GroupTree)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl PartialEq for GroupBranch {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl Serialize for GroupBranch {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, child) in &self.entries {
            map.serialize_entry(key, child)?;
        }
        map.end()
    }
}

/// Nested grouping result: branches keyed by level value, leaves of records.
///
/// Every root-to-leaf path has exactly as many branch levels as the
/// [`GroupKey`] it was built with.
#[derive(Debug, Clone, PartialEq)]
pub enum GroupTree {
    Branch(GroupBranch),
    Leaf(Vec<Record>),
}

impl GroupTree {
    /// Follows `path` from this node.
    pub fn get(&self, path: &[&str]) -> Option<&GroupTree> {
        let mut node = self;
        for key in path {
            node = match node {
                GroupTree::Branch(branch) => branch.get(key)?,
                GroupTree::Leaf(_) => return None,
            };
        }
        Some(node)
    }

    pub fn as_branch(&self) -> Option<&GroupBranch> {
        match self {
            GroupTree::Branch(branch) => Some(branch),
            GroupTree::Leaf(_) => None,
        }
    }

    pub fn as_leaf(&self) -> Option<&[Record]> {
        match self {
            GroupTree::Leaf(records) => Some(records),
            GroupTree::Branch(_) => None,
        }
    }

    /// Whether the tree holds no records.
    pub fn is_empty(&self) -> bool {
        self.leaf_count() == 0
    }

    /// Total number of records across all leaves.
    pub fn leaf_count(&self) -> usize {
        match self {
            GroupTree::Leaf(records) => records.len(),
            GroupTree::Branch(branch) => branch.entries.iter().map(|(_, c)| c.leaf_count()).sum(),
        }
    }

    /// All records, leaf by leaf, in tree order.
    pub fn records(&self) -> Vec<&Record> {
        let mut out = Vec::with_capacity(self.leaf_count());
        self.collect_records(&mut out);
        out
    }

    fn collect_records<'a>(&'a self, out: &mut Vec<&'a Record>) {
        match self {
            GroupTree::Leaf(records) => out.extend(records.iter()),
            GroupTree::Branch(branch) => {
                for (_, child) in &branch.entries {
                    child.collect_records(out);
                }
            }
        }
    }

    /// Every root-to-leaf key path with its leaf length.
    pub fn paths(&self) -> Vec<(Vec<&str>, usize)> {
        let mut out = Vec::new();
        let mut prefix = Vec::new();
        self.collect_paths(&mut prefix, &mut out);
        out
    }

    fn collect_paths<'a>(
        &'a self,
        prefix: &mut Vec<&'a str>,
        out: &mut Vec<(Vec<&'a str>, usize)>,
    ) {
        match self {
            GroupTree::Leaf(records) => out.push((prefix.clone(), records.len())),
            GroupTree::Branch(branch) => {
                for (key, child) in &branch.entries {
                    prefix.push(key);
                    child.collect_paths(prefix, out);
                    prefix.pop();
                }
            }
        }
    }
}

impl Serialize for GroupTree {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            GroupTree::Branch(branch) => branch.serialize(serializer),
            GroupTree::Leaf(records) => {
                let mut seq = serializer.serialize_seq(Some(records.len()))?;
                for record in records {
                    seq.serialize_element(&record.fields)?;
                }
                seq.end()
            }
        }
    }
}

/// Groups `records` into a tree nested by `key`.
///
/// Pure and deterministic: the same input in the same order always yields a
/// structurally identical tree. An empty input yields an empty root branch.
pub fn build_group_tree(records: &[Record], key: &GroupKey) -> GroupTree {
    let mut root = GroupBranch::default();
    for record in records {
        insert(&mut root, key.parts(), record);
    }
    GroupTree::Branch(root)
}

fn insert(branch: &mut GroupBranch, parts: &[KeyPart], record: &Record) {
    let Some((part, rest)) = parts.split_first() else {
        return;
    };
    let label = part.label_for(record);

    if rest.is_empty() {
        if let GroupTree::Leaf(items) = branch.entry(label, || GroupTree::Leaf(Vec::new())) {
            items.push(record.clone());
        }
    } else if let GroupTree::Branch(child) =
        branch.entry(label, || GroupTree::Branch(GroupBranch::default()))
    {
        insert(child, rest, record);
    }
}

/// Distinct values of one level across `records`, for selector options.
///
/// Absent values contribute the level's fallback label. Iteration order is
/// unspecified; use [`sorted`] for display.
pub fn distinct_values(records: &[Record], part: &KeyPart) -> FxHashSet<String> {
    records.iter().map(|r| part.label_for(r)).collect()
}

/// Distinct values of `part`, collected separately for each value of `group`.
pub fn distinct_values_by(
    records: &[Record],
    group: &KeyPart,
    part: &KeyPart,
) -> FxHashMap<String, FxHashSet<String>> {
    let mut out: FxHashMap<String, FxHashSet<String>> = FxHashMap::default();
    for record in records {
        out.entry(group.label_for(record))
            .or_default()
            .insert(part.label_for(record));
    }
    out
}

/// Alphabetically ordered copy of an option set.
pub fn sorted(values: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut out: Vec<String> = values.into_iter().collect();
    out.sort();
    out
}
