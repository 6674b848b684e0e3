//! The relation deferral queue.
//!
//! Relations and entry references read from the stream cannot be resolved
//! immediately because their targets may not have been seen yet. Each one is
//! captured as an immutable pending record, in stream order; the resolver
//! consumes the whole queue after the stream ends and converts each record
//! into a persisted relation object (or residue).

use crate::input::RawTrait;
use chrono::{DateTime, Utc};
use lexbank_model::{MultiText, RefKind};
use lexbank_types::ObjectId;

/// A recognized trait on an entry-reference relation record, resolved at
/// parse time; anything else is routed to residue as unrecognized.
#[derive(Debug, Clone, PartialEq)]
pub enum RefTrait {
    ComplexFormType(String),
    VariantType(String),
    IsPrimary(bool),
    HideMinorEntry(bool),
    Unrecognized { name: String, value: String },
}

/// Classifies a raw trait from a component-lexeme relation.
#[must_use]
pub fn parse_ref_trait(t: &RawTrait) -> RefTrait {
    fn flag(value: &str) -> bool {
        matches!(value, "true" | "yes" | "1" | "")
    }
    match t.name.as_str() {
        "complex-form-type" => RefTrait::ComplexFormType(t.value.clone()),
        "variant-type" => RefTrait::VariantType(t.value.clone()),
        "is-primary" => RefTrait::IsPrimary(flag(&t.value)),
        "hide-minor-entry" => RefTrait::HideMinorEntry(flag(&t.value)),
        _ => RefTrait::Unrecognized {
            name: t.name.clone(),
            value: t.value.clone(),
        },
    }
}

/// A relation awaiting target resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingRelation {
    /// The entry or sense the record was read under.
    pub owner: ObjectId,
    pub type_name: String,
    /// The raw target id string.
    pub ref_id: String,
    pub order: Option<i32>,
    pub usage: MultiText,
    /// Stamps used to group consecutive sequence members.
    pub date_created: Option<DateTime<Utc>>,
    pub date_modified: Option<DateTime<Utc>>,
    /// Verbatim textual form, preserved as residue if the target never
    /// resolves.
    pub fragment: String,
}

/// An entry reference (complex form / variant linkage) awaiting resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingEntryReference {
    pub owner: ObjectId,
    pub kind: RefKind,
    /// The raw component target id.
    pub ref_id: String,
    pub order: Option<i32>,
    pub complex_form_types: Vec<String>,
    pub variant_types: Vec<String>,
    pub is_primary: bool,
    pub hide_minor_entry: bool,
    pub fragment: String,
}

/// Append-only queue of pending records, drained once at end of stream.
#[derive(Debug, Default)]
pub struct DeferralQueue {
    relations: Vec<PendingRelation>,
    entry_refs: Vec<PendingEntryReference>,
}

impl DeferralQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a pending relation in stream order.
    pub fn push_relation(&mut self, pending: PendingRelation) {
        self.relations.push(pending);
    }

    /// Appends a pending entry reference in stream order.
    pub fn push_entry_ref(&mut self, pending: PendingEntryReference) {
        self.entry_refs.push(pending);
    }

    /// Number of pending records of both kinds.
    #[must_use]
    pub fn len(&self) -> usize {
        self.relations.len() + self.entry_refs.len()
    }

    /// True when nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.relations.is_empty() && self.entry_refs.is_empty()
    }

    /// Consumes the queue, yielding the records in stream order.
    #[must_use]
    pub fn drain(self) -> (Vec<PendingRelation>, Vec<PendingEntryReference>) {
        (self.relations, self.entry_refs)
    }
}
