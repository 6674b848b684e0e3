//! Lexical entries and their owned content.

use crate::{CustomValue, MorphoSyntaxAnalysis, MultiText, Note, Residue, Sense};
use chrono::{DateTime, Utc};
use lexbank_types::ObjectId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A top-level lexical entry.
///
/// Owns its senses, variants, pronunciations, etymologies, and
/// morpho-syntactic analyses. Participation in relations and entry
/// references is stored store-side, keyed by this entry's id.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LexicalEntry {
    pub id: ObjectId,
    /// The lexeme (underlying) form, per vernacular writing system.
    pub lexeme_form: MultiText,
    /// The citation (dictionary headword) form.
    pub citation_form: MultiText,
    /// Morph type possibility item (stem, prefix, phrase, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub morph_type: Option<ObjectId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub senses: Vec<Sense>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub variants: Vec<Variant>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pronunciations: Vec<Pronunciation>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub etymologies: Vec<Etymology>,
    /// Morpho-syntactic analyses shared by this entry's senses.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub msas: Vec<MorphoSyntaxAnalysis>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<Note>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_created: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_modified: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub custom: BTreeMap<String, CustomValue>,
    #[serde(default, skip_serializing_if = "Residue::is_empty")]
    pub residue: Residue,
}

impl LexicalEntry {
    /// Creates an empty entry with a fresh id.
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: ObjectId::new(),
            ..Self::default()
        }
    }

    /// The headword: citation form where present, else the lexeme form.
    #[must_use]
    pub fn headword(&self) -> &MultiText {
        if self.citation_form.is_empty() {
            &self.lexeme_form
        } else {
            &self.citation_form
        }
    }

    /// Depth-first traversal over all senses and sub-senses.
    pub fn walk_senses(&self, visit: &mut impl FnMut(&Sense)) {
        for sense in &self.senses {
            sense.walk(visit);
        }
    }

    /// Depth-first search for an owned sense by id.
    #[must_use]
    pub fn find_sense(&self, id: ObjectId) -> Option<&Sense> {
        self.senses.iter().find_map(|s| s.find(id))
    }

    /// Mutable depth-first search for an owned sense by id.
    pub fn find_sense_mut(&mut self, id: ObjectId) -> Option<&mut Sense> {
        self.senses.iter_mut().find_map(|s| s.find_mut(id))
    }

    /// Finds an owned MSA by id.
    #[must_use]
    pub fn find_msa(&self, id: ObjectId) -> Option<&MorphoSyntaxAnalysis> {
        self.msas.iter().find(|m| m.id == id)
    }
}

/// An inline variant form of an entry (spelling or dialectal variant held on
/// the entry itself, as opposed to a variant linkage between two entries).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Variant {
    pub form: MultiText,
    /// Variant type possibility items.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub variant_types: Vec<ObjectId>,
    #[serde(default, skip_serializing_if = "Residue::is_empty")]
    pub residue: Residue,
}

/// A pronunciation of an entry, optionally with attached media.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Pronunciation {
    pub form: MultiText,
    /// Relative paths of attached audio/video files.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub media: Vec<String>,
    #[serde(default, skip_serializing_if = "Residue::is_empty")]
    pub residue: Residue,
}

/// An etymology of an entry.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Etymology {
    /// Etymology type ("proto", "borrowed", ...).
    pub kind: String,
    /// Name of the source language.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    pub form: MultiText,
    pub gloss: MultiText,
    #[serde(default, skip_serializing_if = "Residue::is_empty")]
    pub residue: Residue,
}
