//! The analysis layer: morpho-syntactic analyses, word analyses, and
//! morpheme bundles.
//!
//! These objects link the text-analysis side of the database to the lexicon.
//! The merge engine never creates them from import data; it only cleans them
//! up after a keep-only-new pass deletes the entries they point at.

use crate::MultiText;
use lexbank_types::ObjectId;
use serde::{Deserialize, Serialize};

/// Grammatical information shared by one or more senses of an entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MorphoSyntaxAnalysis {
    pub id: ObjectId,
    /// Part-of-speech possibility item.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub part_of_speech: Option<ObjectId>,
}

impl MorphoSyntaxAnalysis {
    /// Creates an MSA with a fresh id.
    #[must_use]
    pub fn new(part_of_speech: Option<ObjectId>) -> Self {
        Self {
            id: ObjectId::new(),
            part_of_speech,
        }
    }
}

/// An analysis of a wordform into morphemes.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WordAnalysis {
    pub id: ObjectId,
    /// The surface wordform this analysis explains.
    pub wordform: MultiText,
    /// True once a human has approved the analysis.
    #[serde(default)]
    pub human_approved: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bundles: Vec<MorphBundle>,
}

impl WordAnalysis {
    /// Creates an empty analysis with a fresh id.
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: ObjectId::new(),
            ..Self::default()
        }
    }

    /// True if any bundle still links to a lexicon object.
    #[must_use]
    pub fn has_valid_linkage(&self) -> bool {
        self.bundles.iter().any(MorphBundle::has_linkage)
    }
}

/// One morpheme slot of a word analysis, linking to the lexicon.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MorphBundle {
    pub id: ObjectId,
    /// Form shown when no entry link survives.
    #[serde(default, skip_serializing_if = "MultiText::is_empty")]
    pub default_form: MultiText,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry: Option<ObjectId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sense: Option<ObjectId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub msa: Option<ObjectId>,
}

impl MorphBundle {
    /// Creates an empty bundle with a fresh id.
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: ObjectId::new(),
            ..Self::default()
        }
    }

    /// True if the bundle links to any lexicon object.
    #[must_use]
    pub fn has_linkage(&self) -> bool {
        self.entry.is_some() || self.sense.is_some() || self.msa.is_some()
    }
}
