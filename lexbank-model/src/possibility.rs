//! Controlled-vocabulary lists and items.
//!
//! A possibility list is either standard (identified by a well-known name
//! baked into the store) or custom (declared by the ranges document of an
//! import). Items form a tree via sub-items.

use crate::{MultiText, Residue};
use lexbank_types::ObjectId;
use serde::{Deserialize, Serialize};

/// A controlled, optionally hierarchical vocabulary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PossibilityList {
    pub id: ObjectId,
    pub name: String,
    /// True for lists declared by an import rather than built into the store.
    pub custom: bool,
    /// External identifier the list was declared under, for custom lists.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_key: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<PossibilityItem>,
}

impl PossibilityList {
    /// Creates an empty list.
    #[must_use]
    pub fn new(name: impl Into<String>, custom: bool) -> Self {
        Self {
            id: ObjectId::new(),
            name: name.into(),
            custom,
            external_key: None,
            items: Vec::new(),
        }
    }

    /// Depth-first traversal over all items in the tree.
    pub fn walk(&self, visit: &mut impl FnMut(&PossibilityItem)) {
        for item in &self.items {
            item.walk(visit);
        }
    }

    /// Depth-first search for an item by id.
    #[must_use]
    pub fn find(&self, id: ObjectId) -> Option<&PossibilityItem> {
        self.items.iter().find_map(|i| i.find(id))
    }

    /// Mutable depth-first search for an item by id.
    pub fn find_mut(&mut self, id: ObjectId) -> Option<&mut PossibilityItem> {
        self.items.iter_mut().find_map(|i| i.find_mut(id))
    }

    /// Total item count, including nested sub-items.
    #[must_use]
    pub fn item_count(&self) -> usize {
        let mut n = 0;
        self.walk(&mut |_| n += 1);
        n
    }
}

/// One item of a possibility list; forms a tree via `sub_items`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PossibilityItem {
    pub id: ObjectId,
    pub name: MultiText,
    pub abbreviation: MultiText,
    #[serde(default, skip_serializing_if = "MultiText::is_empty")]
    pub description: MultiText,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sub_items: Vec<PossibilityItem>,
    #[serde(default, skip_serializing_if = "Residue::is_empty")]
    pub residue: Residue,
}

impl PossibilityItem {
    /// Creates an empty item with a fresh id.
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: ObjectId::new(),
            ..Self::default()
        }
    }

    /// Depth-first traversal over this item and its sub-items.
    pub fn walk(&self, visit: &mut impl FnMut(&PossibilityItem)) {
        visit(self);
        for sub in &self.sub_items {
            sub.walk(visit);
        }
    }

    /// Depth-first search by id.
    #[must_use]
    pub fn find(&self, id: ObjectId) -> Option<&PossibilityItem> {
        if self.id == id {
            return Some(self);
        }
        self.sub_items.iter().find_map(|i| i.find(id))
    }

    /// Mutable depth-first search by id.
    pub fn find_mut(&mut self, id: ObjectId) -> Option<&mut PossibilityItem> {
        if self.id == id {
            return Some(self);
        }
        self.sub_items.iter_mut().find_map(|i| i.find_mut(id))
    }
}
