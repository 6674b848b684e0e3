//! Typed lexical relations between entries and senses.

use crate::MultiText;
use lexbank_types::ObjectId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The cardinality/symmetry class of a relation type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MappingKind {
    /// Symmetric two-member relation (synonym).
    Pair,
    /// Directed two-member relation with distinct forward/reverse names
    /// (antonym of / converse of).
    AsymmetricPair,
    /// Unordered n-ary group (synonym set).
    Collection,
    /// Ordered n-ary group (calendar months, scale).
    Sequence,
    /// Rooted n-ary group (part/whole, generic/specific).
    Tree,
}

impl MappingKind {
    /// True for kinds whose member order is significant.
    #[must_use]
    pub fn is_ordered(self) -> bool {
        matches!(self, MappingKind::Sequence | MappingKind::Tree)
    }
}

/// A relation type declared in the store (drawn from the lexical-relations
/// vocabulary).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationType {
    pub id: ObjectId,
    /// Forward name ("Part").
    pub name: String,
    /// Reverse name ("Whole"); only meaningful for asymmetric kinds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reverse_name: Option<String>,
    pub mapping: MappingKind,
}

impl RelationType {
    /// Creates a relation type with a fresh id.
    #[must_use]
    pub fn new(name: impl Into<String>, mapping: MappingKind) -> Self {
        Self {
            id: ObjectId::new(),
            name: name.into(),
            reverse_name: None,
            mapping,
        }
    }
}

/// A persisted group of related objects for one relation type.
///
/// `targets` is ordered; for unordered mapping kinds the order is incidental
/// and membership comparisons ignore it. For [`MappingKind::Tree`] groups the
/// first target is the root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationGroup {
    pub id: ObjectId,
    pub relation_type: ObjectId,
    pub targets: Vec<ObjectId>,
    /// Per-member usage notes, keyed by member.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub usage: BTreeMap<ObjectId, MultiText>,
}

impl RelationGroup {
    /// Creates a group with a fresh id.
    #[must_use]
    pub fn new(relation_type: ObjectId, targets: Vec<ObjectId>) -> Self {
        Self {
            id: ObjectId::new(),
            relation_type,
            targets,
            usage: BTreeMap::new(),
        }
    }

    /// True if the group has the same members, ignoring order.
    #[must_use]
    pub fn same_unordered(&self, members: &[ObjectId]) -> bool {
        if self.targets.len() != members.len() {
            return false;
        }
        let mut a: Vec<_> = self.targets.clone();
        let mut b: Vec<_> = members.to_vec();
        a.sort();
        b.sort();
        a == b
    }

    /// True if the group has the same members in the same order.
    #[must_use]
    pub fn same_ordered(&self, members: &[ObjectId]) -> bool {
        self.targets == members
    }

    /// True if any member is shared with `members`.
    #[must_use]
    pub fn shares_member(&self, members: &[ObjectId]) -> bool {
        self.targets.iter().any(|t| members.contains(t))
    }

    /// The root member of a tree group.
    #[must_use]
    pub fn root(&self) -> Option<ObjectId> {
        self.targets.first().copied()
    }
}
