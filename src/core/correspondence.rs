//! Linking tree leaves to alignment rows.
//!
//! Leaf names and sequence identifiers rarely agree verbatim (a leaf might be
//! `P69905_HUMAN` while the record is `sp|P69905|HBA_HUMAN`), so both are
//! reduced to a key by a [`NameRule`] and matched on that key.

use crate::bio::msa::Alignment;
use crate::bio::tree::Tree;
use crate::core::config::CorrespondenceConfig;
use crate::KerfError;
use indexmap::IndexMap;
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, info, warn};

/// Either a row index into the alignment or a leaf name from the tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SequenceRef {
    ByIndex(usize),
    ByName(String),
}

impl From<usize> for SequenceRef {
    fn from(index: usize) -> Self {
        SequenceRef::ByIndex(index)
    }
}

impl From<&str> for SequenceRef {
    fn from(name: &str) -> Self {
        SequenceRef::ByName(name.to_string())
    }
}

impl From<String> for SequenceRef {
    fn from(name: String) -> Self {
        SequenceRef::ByName(name)
    }
}

impl fmt::Display for SequenceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SequenceRef::ByIndex(i) => write!(f, "#{}", i),
            SequenceRef::ByName(name) => f.write_str(name),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NameRule {
    leaf_delimiter: String,
    leaf_token: usize,
    sequence_delimiter: String,
    sequence_token: usize,
}

impl NameRule {
    pub fn new(
        leaf_delimiter: &str,
        leaf_token: usize,
        sequence_delimiter: &str,
        sequence_token: usize,
    ) -> Self {
        Self {
            leaf_delimiter: leaf_delimiter.to_string(),
            leaf_token,
            sequence_delimiter: sequence_delimiter.to_string(),
            sequence_token,
        }
    }

    /// `P69905_HUMAN` -> `P69905` under the default rule.
    pub fn leaf_key<'a>(&self, leaf_name: &'a str) -> Option<&'a str> {
        leaf_name.split(self.leaf_delimiter.as_str()).nth(self.leaf_token)
    }

    /// `sp|P69905|HBA_HUMAN` -> `P69905` under the default rule. Identifiers
    /// without that token never match.
    pub fn sequence_key<'a>(&self, identifier: &'a str) -> Option<&'a str> {
        identifier.split(self.sequence_delimiter.as_str()).nth(self.sequence_token)
    }
}

impl Default for NameRule {
    fn default() -> Self {
        Self::from(&CorrespondenceConfig::default())
    }
}

impl From<&CorrespondenceConfig> for NameRule {
    fn from(config: &CorrespondenceConfig) -> Self {
        Self::new(
            &config.leaf_delimiter,
            config.leaf_token,
            &config.sequence_delimiter,
            config.sequence_token,
        )
    }
}

/// One-to-one map between named terminals and alignment rows.
#[derive(Debug, Clone)]
pub struct Correspondence {
    name_to_index: IndexMap<String, usize>,
    index_to_name: Vec<Option<String>>,
}

impl Correspondence {
    /// Match every named terminal of `tree` to a row of `alignment`.
    ///
    /// Fails on the first terminal with no matching row, or when two
    /// terminals would claim the same row.
    pub fn build(alignment: &Alignment, tree: &Tree, rule: &NameRule) -> Result<Self, KerfError> {
        // First record wins when several identifiers share a key.
        let mut by_key: HashMap<&str, usize> = HashMap::new();
        for (idx, record) in alignment.records().iter().enumerate() {
            if let Some(key) = rule.sequence_key(&record.id) {
                by_key.entry(key).or_insert(idx);
            }
        }

        let mut name_to_index = IndexMap::new();
        let mut index_to_name: Vec<Option<String>> = vec![None; alignment.len()];

        for (_, name) in tree.named_terminals() {
            let idx = rule
                .leaf_key(name)
                .and_then(|key| by_key.get(key).copied())
                .ok_or_else(|| KerfError::UnmatchedTerminal(name.to_string()))?;

            if let Some(other) = &index_to_name[idx] {
                return Err(KerfError::AmbiguousTerminal {
                    name: name.to_string(),
                    index: idx,
                    other: other.clone(),
                });
            }

            debug!("Leaf '{}' -> sequence {} ('{}')", name, idx, alignment.records()[idx].id);
            index_to_name[idx] = Some(name.to_string());
            name_to_index.insert(name.to_string(), idx);
        }

        let unlinked = index_to_name.iter().filter(|n| n.is_none()).count();
        if unlinked > 0 {
            warn!(
                "{} of {} sequences have no terminal in the tree and will be unassigned",
                unlinked,
                alignment.len()
            );
        }
        info!("Linked {} tree terminals to alignment rows", name_to_index.len());

        Ok(Self {
            name_to_index,
            index_to_name,
        })
    }

    /// Resolve a reference to a row index.
    pub fn resolve(&self, reference: &SequenceRef) -> Result<usize, KerfError> {
        match reference {
            SequenceRef::ByIndex(index) if *index < self.index_to_name.len() => Ok(*index),
            SequenceRef::ByIndex(index) => Err(KerfError::IndexOutOfRange {
                index: *index,
                size: self.index_to_name.len(),
            }),
            SequenceRef::ByName(name) => self
                .index_of(name)
                .ok_or_else(|| KerfError::UnknownIdentifier(name.clone())),
        }
    }

    pub fn index_of(&self, leaf_name: &str) -> Option<usize> {
        self.name_to_index.get(leaf_name).copied()
    }

    pub fn name_of(&self, index: usize) -> Option<&str> {
        self.index_to_name.get(index).and_then(|n| n.as_deref())
    }

    /// Number of linked terminals.
    pub fn len(&self) -> usize {
        self.name_to_index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.name_to_index.is_empty()
    }

    /// Number of alignment rows, linked or not.
    pub fn sequence_count(&self) -> usize {
        self.index_to_name.len()
    }

    /// Linked `(leaf name, row index)` pairs in tree order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.name_to_index.iter().map(|(n, &i)| (n.as_str(), i))
    }
}
