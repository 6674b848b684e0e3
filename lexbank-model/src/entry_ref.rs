//! Complex-form and variant linkages between entries.

use lexbank_types::ObjectId;
use serde::{Deserialize, Serialize};

/// Whether a reference marks the owner as a complex form built from its
/// components, or as a variant of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefKind {
    ComplexForm,
    Variant,
}

/// A linkage expressing that the owning entry is a complex form or variant
/// of the referenced component objects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryReference {
    pub id: ObjectId,
    /// The entry this reference belongs to.
    pub owner: ObjectId,
    pub kind: RefKind,
    /// Complex-form type possibility items.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub complex_form_types: Vec<ObjectId>,
    /// Variant type possibility items.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub variant_types: Vec<ObjectId>,
    /// The component entries or senses, in declared order.
    pub components: Vec<ObjectId>,
    /// Subset of `components` shown under the primary lexeme.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub primary: Vec<ObjectId>,
    /// Suppress the owner as a minor entry in publication.
    #[serde(default)]
    pub hide_minor_entry: bool,
}

impl EntryReference {
    /// Creates a reference with a fresh id.
    #[must_use]
    pub fn new(owner: ObjectId, kind: RefKind, components: Vec<ObjectId>) -> Self {
        Self {
            id: ObjectId::new(),
            owner,
            kind,
            complex_form_types: Vec::new(),
            variant_types: Vec::new(),
            components,
            primary: Vec::new(),
            hide_minor_entry: false,
        }
    }
}
