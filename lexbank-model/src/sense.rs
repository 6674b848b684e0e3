//! Senses and their owned content.

use crate::{CustomValue, MultiText, Residue};
use lexbank_types::ObjectId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A sense of a lexical entry, or a sub-sense of a parent sense.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Sense {
    pub id: ObjectId,
    pub gloss: MultiText,
    pub definition: MultiText,
    /// Morpho-syntactic analysis carrying the grammatical info, owned by the
    /// containing entry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub msa: Option<ObjectId>,
    /// Semantic domain possibility items.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub semantic_domains: Vec<ObjectId>,
    /// Usage type possibility items.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub usage_types: Vec<ObjectId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<Example>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<Note>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subsenses: Vec<Sense>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub custom: BTreeMap<String, CustomValue>,
    #[serde(default, skip_serializing_if = "Residue::is_empty")]
    pub residue: Residue,
}

impl Sense {
    /// Creates an empty sense with a fresh id.
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: ObjectId::new(),
            ..Self::default()
        }
    }

    /// Depth-first traversal over this sense and all sub-senses.
    pub fn walk(&self, visit: &mut impl FnMut(&Sense)) {
        visit(self);
        for sub in &self.subsenses {
            sub.walk(visit);
        }
    }

    /// Depth-first search for a sense by id, including sub-senses.
    #[must_use]
    pub fn find(&self, id: ObjectId) -> Option<&Sense> {
        if self.id == id {
            return Some(self);
        }
        self.subsenses.iter().find_map(|s| s.find(id))
    }

    /// Mutable depth-first search for a sense by id.
    pub fn find_mut(&mut self, id: ObjectId) -> Option<&mut Sense> {
        if self.id == id {
            return Some(self);
        }
        self.subsenses.iter_mut().find_map(|s| s.find_mut(id))
    }
}

/// An example sentence owned by a sense.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Example {
    pub id: ObjectId,
    /// The example text, per vernacular writing system.
    pub text: MultiText,
    /// Free translations, per analysis writing system.
    pub translation: MultiText,
    /// Reference to where the example was collected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Residue::is_empty")]
    pub residue: Residue,
}

impl Example {
    /// Creates an empty example with a fresh id.
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: ObjectId::new(),
            ..Self::default()
        }
    }
}

/// A typed note on a sense or entry.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Note {
    /// Note type name; `None` for the general note.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    pub content: MultiText,
}
