mod common;

use common::*;
use lexbank_merge::custom_fields::{parse_spec, CustomFieldReconciler};
use lexbank_merge::{
    DiagnosticsRecorder, ImportOptions, MergePolicy, RangesDocument, RawField, RawFieldSpec,
    RawMultiText,
};
use lexbank_model::{CustomValue, FieldKind, ObjectClass, WsSelector};
use pretty_assertions::assert_eq;

// ── Spec parsing ─────────────────────────────────────────────────

#[test]
fn parses_key_value_pairs() {
    let spec = parse_spec("Type=MultiUnicode; WsSelector=analysis; DstCls=LexSense");
    assert_eq!(spec.kind, Some(FieldKind::MultiUnicode));
    assert_eq!(spec.ws_selector, Some(WsSelector::Analysis));
    assert_eq!(spec.dst_class, Some(ObjectClass::Sense));
    assert_eq!(spec.range, None);
}

#[test]
fn unknown_keys_and_values_are_ignored() {
    let spec = parse_spec("Type=Hologram; Shiny=yes; range=dialects");
    assert_eq!(spec.kind, None);
    assert_eq!(spec.range.as_deref(), Some("dialects"));
}

// ── Reconciliation ───────────────────────────────────────────────

#[test]
fn missing_field_is_created_with_defaults() {
    let mut store = make_store();
    let mut rec = CustomFieldReconciler::new();
    let mut diags = DiagnosticsRecorder::new();
    let def = rec
        .reconcile(&mut store, "Tone", ObjectClass::Entry, None, &mut diags)
        .unwrap();
    // text-like kinds default their writing-system selector
    assert_eq!(def.kind, FieldKind::MultiUnicode);
    assert_eq!(def.ws_selector, Some(WsSelector::Analysis));
    assert_eq!(rec.newly_added(), ["Tone"]);
    assert!(store.find_field(ObjectClass::Entry, "Tone").is_some());
}

#[test]
fn existing_field_without_spec_is_trusted() {
    let mut store = make_store();
    let mut rec = CustomFieldReconciler::new();
    let mut diags = DiagnosticsRecorder::new();
    rec.reconcile(
        &mut store,
        "Tone",
        ObjectClass::Entry,
        Some("Type=String"),
        &mut diags,
    )
    .unwrap();
    let def = rec
        .reconcile(&mut store, "Tone", ObjectClass::Entry, None, &mut diags)
        .unwrap();
    assert_eq!(def.kind, FieldKind::String);
    assert_eq!(rec.newly_added().len(), 1);
}

#[test]
fn equivalent_types_reconcile() {
    let mut store = make_store();
    let mut rec = CustomFieldReconciler::new();
    let mut diags = DiagnosticsRecorder::new();
    rec.reconcile(
        &mut store,
        "Scan",
        ObjectClass::Entry,
        Some("Type=Binary"),
        &mut diags,
    )
    .unwrap();
    let def = rec.reconcile(
        &mut store,
        "Scan",
        ObjectClass::Entry,
        Some("Type=Image"),
        &mut diags,
    );
    assert!(def.is_some());
    assert_eq!(diags.records().len(), 0);
}

#[test]
fn incompatible_type_is_rejected_with_diagnostic() {
    let mut store = make_store();
    let mut rec = CustomFieldReconciler::new();
    let mut diags = DiagnosticsRecorder::new();
    rec.reconcile(
        &mut store,
        "Tone",
        ObjectClass::Entry,
        Some("Type=String"),
        &mut diags,
    )
    .unwrap();
    let def = rec.reconcile(
        &mut store,
        "Tone",
        ObjectClass::Entry,
        Some("Type=Integer"),
        &mut diags,
    );
    assert!(def.is_none());
    assert_eq!(diags.records().len(), 1);
}

#[test]
fn same_name_on_another_class_is_a_separate_field() {
    let mut store = make_store();
    let mut rec = CustomFieldReconciler::new();
    let mut diags = DiagnosticsRecorder::new();
    rec.reconcile(
        &mut store,
        "Tone",
        ObjectClass::Entry,
        Some("Type=String"),
        &mut diags,
    )
    .unwrap();
    let def = rec.reconcile(
        &mut store,
        "Tone",
        ObjectClass::Sense,
        Some("Type=Integer"),
        &mut diags,
    );
    assert_eq!(def.unwrap().kind, FieldKind::Integer);
    assert_eq!(rec.newly_added().len(), 2);
}

// ── Values on entries ────────────────────────────────────────────

#[test]
fn declared_field_values_are_stored() {
    let mut store = make_store();
    let specs = [RawFieldSpec {
        name: "Tone".to_string(),
        class: Some("LexEntry".to_string()),
        spec: Some("Type=MultiUnicode".to_string()),
    }];
    let mut entry = make_entry("ma", "ma");
    entry.fields.push(RawField {
        kind: "Tone".to_string(),
        content: RawMultiText::single("en", "high rising"),
        ..RawField::default()
    });
    import_full(
        &mut store,
        ImportOptions::with_policy(MergePolicy::KeepOld),
        RangesDocument::default(),
        &specs,
        vec![entry],
    );

    let entry = store.entries().next().unwrap();
    let CustomValue::MultiText(value) = &entry.custom["Tone"] else {
        panic!("expected a multitext value");
    };
    let ws = anal(&store);
    assert_eq!(value.get(ws).unwrap().text, "high rising");
}

#[test]
fn unparseable_integer_value_is_invalid_data() {
    let mut store = make_store();
    let specs = [RawFieldSpec {
        name: "Frequency".to_string(),
        class: Some("LexEntry".to_string()),
        spec: Some("Type=Integer".to_string()),
    }];
    let mut entry = make_entry("ma", "ma");
    entry.fields.push(RawField {
        kind: "Frequency".to_string(),
        content: RawMultiText::single("en", "quite often"),
        ..RawField::default()
    });
    let report = import_full(
        &mut store,
        ImportOptions::with_policy(MergePolicy::KeepOld),
        RangesDocument::default(),
        &specs,
        vec![entry],
    );

    // the field falls back to unset and the import continues
    assert_eq!(report.invalid_data().count(), 1);
    let entry = store.entries().next().unwrap();
    assert!(entry.custom.get("Frequency").is_none());
}

#[test]
fn reference_field_resolves_against_its_target_list() {
    let mut store = make_store();
    let ranges = RangesDocument {
        ranges: vec![make_range("dialects", vec![make_element("north", "Northern")])],
    };
    let specs = [RawFieldSpec {
        name: "Dialect".to_string(),
        class: Some("LexEntry".to_string()),
        spec: Some("Type=ReferenceAtomic; range=dialects".to_string()),
    }];
    let mut entry = make_entry("ma", "ma");
    entry.fields.push(RawField {
        kind: "Dialect".to_string(),
        content: RawMultiText::single("en", "Northern"),
        ..RawField::default()
    });
    import_full(
        &mut store,
        ImportOptions::with_policy(MergePolicy::KeepOld),
        ranges,
        &specs,
        vec![entry],
    );

    let entry = store.entries().next().unwrap();
    let CustomValue::Reference(item) = &entry.custom["Dialect"] else {
        panic!("expected a reference value");
    };
    let list = store.find_custom_list("dialects").unwrap();
    assert_eq!(store.item_list(*item), Some(list));
}

#[test]
fn undeclared_field_on_an_entry_is_created_on_the_fly() {
    let mut store = make_store();
    let mut entry = make_entry("ma", "ma");
    entry.fields.push(RawField {
        kind: "FieldNotes".to_string(),
        content: RawMultiText::single("en", "collected in 2019"),
        ..RawField::default()
    });
    import(&mut store, MergePolicy::KeepOld, vec![entry]);
    assert!(store.find_field(ObjectClass::Entry, "FieldNotes").is_some());
}
