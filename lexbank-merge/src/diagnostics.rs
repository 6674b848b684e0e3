//! Diagnostics accumulated during a merge.
//!
//! Diagnostic records are immutable facts about what the merge did or could
//! not do; recording one never mutates lexical data. The recorder also keeps
//! the register of controlled-vocabulary items created by the run and any
//! raw error strings, for the final report.

use lexbank_types::ObjectId;
use serde::{Deserialize, Serialize};

/// One diagnostic fact produced during the merge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DiagnosticRecord {
    /// A field conflict under the keep-both policy; `duplicate` is the
    /// sibling object created to carry the incoming value.
    Conflict {
        object: ObjectId,
        duplicate: ObjectId,
        field: String,
        ws: Option<String>,
        existing: String,
        incoming: String,
    },

    /// An incoming value exceeded the field's maximum stored length.
    Truncation {
        object: ObjectId,
        field: String,
        ws: String,
        original: String,
        stored_len: usize,
    },

    /// A typed value could not be interpreted; a safe default was used.
    InvalidData {
        object: Option<ObjectId>,
        context: String,
        detail: String,
    },

    /// A relation whose target never appeared; dropped from the model and
    /// preserved as residue on the owner.
    InvalidRelation {
        owner: ObjectId,
        relation_type: String,
        target: String,
    },

    /// Two inconsistently-declared collection groups were unioned.
    CombinedCollection {
        relation_type: String,
        group: ObjectId,
        detail: String,
    },
}

/// A controlled-vocabulary item created by this run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewItem {
    pub list: ObjectId,
    pub item: ObjectId,
    /// Display label captured at creation time.
    pub label: String,
    /// List name captured at creation time.
    pub list_name: String,
}

/// Accumulates diagnostics for the import report.
#[derive(Debug, Default)]
pub struct DiagnosticsRecorder {
    records: Vec<DiagnosticRecord>,
    new_items: Vec<NewItem>,
    errors: Vec<String>,
}

impl DiagnosticsRecorder {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records any diagnostic.
    pub fn record(&mut self, record: DiagnosticRecord) {
        self.records.push(record);
    }

    /// Records a keep-both conflict.
    pub fn conflict(
        &mut self,
        object: ObjectId,
        duplicate: ObjectId,
        field: impl Into<String>,
        ws: Option<String>,
        existing: impl Into<String>,
        incoming: impl Into<String>,
    ) {
        self.records.push(DiagnosticRecord::Conflict {
            object,
            duplicate,
            field: field.into(),
            ws,
            existing: existing.into(),
            incoming: incoming.into(),
        });
    }

    /// Records a truncation.
    pub fn truncation(
        &mut self,
        object: ObjectId,
        field: impl Into<String>,
        ws: impl Into<String>,
        original: impl Into<String>,
        stored_len: usize,
    ) {
        self.records.push(DiagnosticRecord::Truncation {
            object,
            field: field.into(),
            ws: ws.into(),
            original: original.into(),
            stored_len,
        });
    }

    /// Records an uninterpretable typed value.
    pub fn invalid_data(
        &mut self,
        object: Option<ObjectId>,
        context: impl Into<String>,
        detail: impl Into<String>,
    ) {
        self.records.push(DiagnosticRecord::InvalidData {
            object,
            context: context.into(),
            detail: detail.into(),
        });
    }

    /// Records a relation whose target never resolved.
    pub fn invalid_relation(
        &mut self,
        owner: ObjectId,
        relation_type: impl Into<String>,
        target: impl Into<String>,
    ) {
        self.records.push(DiagnosticRecord::InvalidRelation {
            owner,
            relation_type: relation_type.into(),
            target: target.into(),
        });
    }

    /// Records the union of two inconsistently-declared collections.
    pub fn combined_collection(
        &mut self,
        relation_type: impl Into<String>,
        group: ObjectId,
        detail: impl Into<String>,
    ) {
        self.records.push(DiagnosticRecord::CombinedCollection {
            relation_type: relation_type.into(),
            group,
            detail: detail.into(),
        });
    }

    /// Registers a controlled-vocabulary item created by this run.
    pub fn new_item(
        &mut self,
        list: ObjectId,
        item: ObjectId,
        label: impl Into<String>,
        list_name: impl Into<String>,
    ) {
        self.new_items.push(NewItem {
            list,
            item,
            label: label.into(),
            list_name: list_name.into(),
        });
    }

    /// Records a raw error message.
    pub fn error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    /// All diagnostic records in the order produced.
    #[must_use]
    pub fn records(&self) -> &[DiagnosticRecord] {
        &self.records
    }

    /// New controlled-vocabulary items, in creation order.
    #[must_use]
    pub fn new_items(&self) -> &[NewItem] {
        &self.new_items
    }

    /// Raw error messages.
    #[must_use]
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// Number of records matching a predicate.
    pub fn count_where(&self, pred: impl Fn(&DiagnosticRecord) -> bool) -> usize {
        self.records.iter().filter(|r| pred(r)).count()
    }

    /// True when nothing at all was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty() && self.new_items.is_empty() && self.errors.is_empty()
    }
}
