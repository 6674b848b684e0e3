//! Custom-field reconciliation.
//!
//! Maps an external custom-field declaration onto an existing or
//! newly-declared field definition, checking type compatibility against the
//! equivalence table in [`FieldKind::compatible_with`].

use crate::diagnostics::DiagnosticsRecorder;
use lexbank_model::{CustomFieldDefinition, FieldKind, ObjectClass, WsSelector};
use lexbank_store::LexStore;
use tracing::debug;

/// A parsed `key=value` field specification string.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FieldSpec {
    pub kind: Option<FieldKind>,
    pub ws_selector: Option<WsSelector>,
    pub dst_class: Option<ObjectClass>,
    pub range: Option<String>,
}

/// Parses a specification string of semicolon-separated `key=value` pairs,
/// e.g. `Type=MultiUnicode; WsSelector=analysis; DstCls=LexSense`.
/// Unrecognized keys and unparseable values are ignored; the caller decides
/// what missing parts default to.
#[must_use]
pub fn parse_spec(spec: &str) -> FieldSpec {
    let mut out = FieldSpec::default();
    for pair in spec.split(';') {
        let Some((key, value)) = pair.split_once('=') else {
            continue;
        };
        let value = value.trim();
        match key.trim() {
            "Type" | "type" => out.kind = parse_kind(value),
            "WsSelector" | "ws" => out.ws_selector = WsSelector::parse(value),
            "DstCls" | "class" => out.dst_class = parse_class(value),
            "range" | "Range" => out.range = Some(value.to_string()),
            _ => {}
        }
    }
    out
}

fn parse_kind(value: &str) -> Option<FieldKind> {
    match value.to_ascii_lowercase().as_str() {
        "string" => Some(FieldKind::String),
        "multiunicode" => Some(FieldKind::MultiUnicode),
        "multistring" => Some(FieldKind::MultiString),
        "integer" => Some(FieldKind::Integer),
        "gendate" => Some(FieldKind::GenDate),
        "binary" => Some(FieldKind::Binary),
        "image" => Some(FieldKind::Image),
        "referenceatomic" => Some(FieldKind::ReferenceAtomic),
        "referencecollection" => Some(FieldKind::ReferenceCollection),
        "referencesequence" => Some(FieldKind::ReferenceSequence),
        "owningcollection" => Some(FieldKind::OwningCollection),
        "owningsequence" => Some(FieldKind::OwningSequence),
        _ => None,
    }
}

/// Parses the class names interchange files use for field destinations.
#[must_use]
pub fn parse_class(value: &str) -> Option<ObjectClass> {
    match value {
        "LexEntry" | "entry" => Some(ObjectClass::Entry),
        "LexSense" | "sense" => Some(ObjectClass::Sense),
        "LexExampleSentence" | "example" => Some(ObjectClass::Example),
        _ => None,
    }
}

/// Reconciles external field declarations against the store's field
/// registry, tracking which fields this run added.
#[derive(Debug, Default)]
pub struct CustomFieldReconciler {
    newly_added: Vec<String>,
}

impl CustomFieldReconciler {
    /// Creates a reconciler.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Names of fields declared by this run.
    #[must_use]
    pub fn newly_added(&self) -> &[String] {
        &self.newly_added
    }

    /// Returns a usable field definition for `name` on `class`, or `None`
    /// when reconciliation failed and the field must be skipped this run.
    pub fn reconcile(
        &mut self,
        store: &mut LexStore,
        name: &str,
        class: ObjectClass,
        spec: Option<&str>,
        diags: &mut DiagnosticsRecorder,
    ) -> Option<CustomFieldDefinition> {
        let parsed = spec.map(parse_spec);
        if let Some(existing) = store.find_field(class, name) {
            let existing = existing.clone();
            // no spec supplied: trust the existing declaration
            let Some(parsed) = parsed else {
                return Some(existing);
            };
            let Some(declared) = parsed.kind else {
                return Some(existing);
            };
            if declared.compatible_with(existing.kind) {
                return Some(existing);
            }
            diags.invalid_data(
                None,
                format!("custom field {name:?}"),
                format!(
                    "declared type {declared:?} is incompatible with existing {:?}",
                    existing.kind
                ),
            );
            return None;
        }

        let parsed = parsed.unwrap_or_default();
        let kind = parsed.kind.unwrap_or(FieldKind::MultiUnicode);
        let ws_selector = if kind.is_text() {
            Some(parsed.ws_selector.unwrap_or_default())
        } else {
            None
        };
        let target_list = parsed.range.as_deref().and_then(|range| {
            store
                .lists()
                .find(|l| l.external_key.as_deref() == Some(range) || l.name == range)
                .map(|l| l.id)
        });
        let def = CustomFieldDefinition {
            name: name.to_string(),
            class,
            kind,
            ws_selector,
            target_list,
        };
        debug!("adding custom field {name:?} on {class:?} as {kind:?}");
        store.add_field(def.clone());
        self.newly_added.push(name.to_string());
        Some(def)
    }
}
