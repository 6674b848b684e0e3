//! Shared fixtures for the merge engine tests.

#![allow(dead_code)]

use lexbank_merge::{
    ImportOptions, ImportReport, MergePolicy, RangesDocument, RawEntry, RawFieldSpec,
    RawMultiText, RawRange, RawRangeElement, RawRelation, RawSense, RawTrait, run_import,
};
use lexbank_store::LexStore;
use lexbank_types::WsId;

/// Opt-in log output while debugging a test: `RUST_LOG=debug cargo test`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

pub fn make_store() -> LexStore {
    LexStore::new("seh", "en")
}

pub fn vern(store: &LexStore) -> WsId {
    store.ws().default_vernacular()
}

pub fn anal(store: &LexStore) -> WsId {
    store.ws().default_analysis()
}

pub fn make_entry(id: &str, lexeme: &str) -> RawEntry {
    RawEntry {
        id: Some(id.to_string()),
        lexical_unit: RawMultiText::single("seh", lexeme),
        ..RawEntry::default()
    }
}

pub fn make_sense(id: &str, gloss: &str) -> RawSense {
    RawSense {
        id: Some(id.to_string()),
        gloss: RawMultiText::single("en", gloss),
        ..RawSense::default()
    }
}

pub fn make_relation(type_name: &str, ref_id: &str) -> RawRelation {
    RawRelation::simple(type_name, ref_id)
}

pub fn make_range(id: &str, elements: Vec<RawRangeElement>) -> RawRange {
    RawRange {
        id: id.to_string(),
        guid: None,
        elements,
    }
}

pub fn make_element(id: &str, label: &str) -> RawRangeElement {
    RawRangeElement {
        id: id.to_string(),
        label: RawMultiText::single("en", label),
        ..RawRangeElement::default()
    }
}

/// A lexical-relation range element declaring a relation type.
pub fn relation_element(label: &str, mapping: &str, reverse: Option<&str>) -> RawRangeElement {
    let mut el = make_element(label, label);
    el.traits.push(RawTrait::new("referenceType", mapping));
    if let Some(rev) = reverse {
        el.traits.push(RawTrait::new("reverse-label", rev));
    }
    el
}

pub fn import(
    store: &mut LexStore,
    policy: MergePolicy,
    entries: Vec<RawEntry>,
) -> ImportReport {
    run_import(
        store,
        ImportOptions::with_policy(policy),
        &RangesDocument::default(),
        &[],
        entries,
    )
    .unwrap()
}

pub fn import_with_ranges(
    store: &mut LexStore,
    policy: MergePolicy,
    ranges: RangesDocument,
    entries: Vec<RawEntry>,
) -> ImportReport {
    run_import(store, ImportOptions::with_policy(policy), &ranges, &[], entries).unwrap()
}

pub fn import_full(
    store: &mut LexStore,
    opts: ImportOptions,
    ranges: RangesDocument,
    specs: &[RawFieldSpec],
    entries: Vec<RawEntry>,
) -> ImportReport {
    run_import(store, opts, &ranges, specs, entries).unwrap()
}

/// The gloss text of the first sense of the only entry, in the analysis ws.
pub fn only_gloss(store: &LexStore) -> String {
    let entry = store.entries().next().expect("one entry");
    let ws = anal(store);
    entry.senses[0]
        .gloss
        .get(ws)
        .map(|f| f.text.clone())
        .unwrap_or_default()
}
