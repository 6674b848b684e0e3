//! Custom field definitions and stored values.
//!
//! Custom fields extend the fixed object model per deployment. A definition
//! declares the owning class, the field kind, and (for text-like kinds) which
//! writing systems the field selects. Values are stored on the owning object
//! keyed by field name.

use crate::MultiText;
use lexbank_types::{ObjectId, WsId};
use serde::{Deserialize, Serialize};

/// The class of object a field or identifier refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectClass {
    Entry,
    Sense,
    Example,
    PossibilityItem,
    PossibilityList,
    RelationGroup,
    EntryReference,
    WordAnalysis,
}

/// The declared type of a custom field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FieldKind {
    /// Single-writing-system formatted string.
    String,
    /// Multilingual unformatted string.
    MultiUnicode,
    /// Multilingual formatted string.
    MultiString,
    Integer,
    /// Generic date (year / year-month / full date, possibly approximate).
    GenDate,
    Binary,
    Image,
    ReferenceAtomic,
    ReferenceCollection,
    ReferenceSequence,
    OwningCollection,
    OwningSequence,
}

impl FieldKind {
    /// True when a field declared as `self` can be reconciled with an
    /// existing declaration of `other`.
    ///
    /// Binary and Image share a representation, as do the collection and
    /// sequence flavors of owning/reference fields. Everything else must
    /// match exactly.
    #[must_use]
    pub fn compatible_with(self, other: FieldKind) -> bool {
        use FieldKind::*;
        if self == other {
            return true;
        }
        matches!(
            (self, other),
            (Binary, Image)
                | (Image, Binary)
                | (OwningCollection, OwningSequence)
                | (OwningSequence, OwningCollection)
                | (ReferenceCollection, ReferenceSequence)
                | (ReferenceSequence, ReferenceCollection)
        )
    }

    /// True for kinds that carry text and therefore need a writing-system
    /// selector.
    #[must_use]
    pub fn is_text(self) -> bool {
        matches!(
            self,
            FieldKind::String | FieldKind::MultiUnicode | FieldKind::MultiString
        )
    }
}

/// Which writing systems a text-like custom field selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WsSelector {
    #[default]
    Analysis,
    Vernacular,
    AnalysisAndVernacular,
}

impl WsSelector {
    /// Parses the selector names used in field specifications.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "analysis" | "kwsAnal" | "kwsAnals" => Some(Self::Analysis),
            "vernacular" | "kwsVern" | "kwsVerns" => Some(Self::Vernacular),
            "analysis-vernacular" | "kwsAnalVerns" | "kwsVernAnals" => {
                Some(Self::AnalysisAndVernacular)
            }
            _ => None,
        }
    }
}

/// Declaration of a custom field on an owning class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomFieldDefinition {
    pub name: String,
    pub class: ObjectClass,
    pub kind: FieldKind,
    /// Writing-system selector; only meaningful for text-like kinds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ws_selector: Option<WsSelector>,
    /// Possibility list the field draws its values from, for reference kinds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_list: Option<ObjectId>,
}

/// A custom field value stored on an object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum CustomValue {
    Text { ws: WsId, text: String },
    MultiText(MultiText),
    Integer(i64),
    GenDate(String),
    Reference(ObjectId),
    References(Vec<ObjectId>),
}

impl CustomValue {
    /// True if the value holds no content.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            CustomValue::Text { text, .. } => text.is_empty(),
            CustomValue::MultiText(mt) => mt.is_empty(),
            CustomValue::Integer(_) | CustomValue::GenDate(_) | CustomValue::Reference(_) => false,
            CustomValue::References(refs) => refs.is_empty(),
        }
    }
}
