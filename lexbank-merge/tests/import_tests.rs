mod common;

use common::*;
use lexbank_merge::{
    ImportOptions, ImportSink, LexiconMerger, MergeError, MergePolicy, RangesDocument,
    RawMultiText, run_import,
};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use uuid::Uuid;

// ── Basic import ─────────────────────────────────────────────────

#[test]
fn one_entry_one_sense_clean_import() {
    init_tracing();
    // empty store, a file declaring one entry "cat" with one sense
    let mut store = make_store();
    let mut entry = make_entry("cat", "cat");
    entry.senses.push(make_sense("cat-s1", "feline"));
    let report = import(&mut store, MergePolicy::KeepOld, vec![entry]);

    assert_eq!(store.entry_count(), 1);
    assert_eq!(store.entries().next().unwrap().senses.len(), 1);
    assert!(report.is_clean());
    assert_eq!(report.entries_created, 1);
    assert_eq!(report.entries_merged, 0);
}

#[test]
fn importing_the_same_file_twice_is_stable() {
    let file = || {
        let mut cat = make_entry("cat", "cat");
        cat.senses.push(make_sense("cat-s1", "feline"));
        let dog = make_entry("dog", "dog");
        vec![cat, dog]
    };
    let mut store = make_store();
    import(&mut store, MergePolicy::KeepOld, file());
    let first_count = store.entry_count();
    let report = import(&mut store, MergePolicy::KeepOld, file());

    assert_eq!(store.entry_count(), first_count);
    assert_eq!(report.entries_created, 0);
    assert_eq!(report.entries_merged, 2);
    // no duplicated senses either
    assert_eq!(store.entries().next().unwrap().senses.len(), 1);
}

#[test]
fn explicit_identifier_is_used_for_the_new_entry() {
    let guid = Uuid::new_v4();
    let mut store = make_store();
    let mut entry = make_entry("cat", "cat");
    entry.guid = Some(guid);
    import(&mut store, MergePolicy::KeepOld, vec![entry]);
    assert!(store.entry(lexbank_types::ObjectId::from_uuid(guid)).is_some());
}

#[test]
fn embedded_identifier_in_the_free_id_resolves() {
    let guid = Uuid::new_v4();
    let mut store = make_store();
    let mut entry = make_entry(&format!("cat_{guid}"), "cat");
    entry.guid = Some(guid);
    import(&mut store, MergePolicy::KeepOld, vec![entry]);

    // second file carries only the free-text id with the embedded guid
    let update = make_entry(&format!("cat_{guid}"), "cat");
    let report = import(&mut store, MergePolicy::KeepOld, vec![update]);
    assert_eq!(report.entries_merged, 1);
    assert_eq!(store.entry_count(), 1);
}

// ── Writing systems ──────────────────────────────────────────────

#[test]
fn malformed_language_tags_are_cleaned() {
    let mut store = make_store();
    let mut entry = make_entry("cat", "");
    entry.lexical_unit = RawMultiText::single(" SEH ", "cat");
    import(&mut store, MergePolicy::KeepOld, vec![entry]);

    // " SEH " cleans to the existing default vernacular
    let ws = store.ws().get("seh").unwrap();
    let entry = store.entries().next().unwrap();
    assert_eq!(entry.lexeme_form.get(ws).unwrap().text, "cat");
}

// ── Cancellation ─────────────────────────────────────────────────

#[test]
fn cancellation_skips_remaining_entries_cleanly() {
    let cancel = Arc::new(AtomicBool::new(false));
    let mut store = make_store();
    let mut merger = LexiconMerger::new(
        &mut store,
        ImportOptions {
            cancel: Some(cancel.clone()),
            ..ImportOptions::with_policy(MergePolicy::KeepOld)
        },
    );
    merger.ranges(&RangesDocument::default()).unwrap();
    merger.field_specs(&[]).unwrap();
    merger.entry(make_entry("cat", "cat")).unwrap();
    cancel.store(true, Ordering::Relaxed);
    merger.entry(make_entry("dog", "dog")).unwrap();
    let report = merger.finish().unwrap();
    assert!(merger.was_cancelled());
    drop(merger);

    // the in-progress object completed; the rest were skipped, not failed
    assert_eq!(report.entries_created, 1);
    assert_eq!(store.entry_count(), 1);
}

#[test]
fn cancelled_keep_only_new_run_does_not_collect_orphans() {
    let mut store = make_store();
    import(
        &mut store,
        MergePolicy::KeepOld,
        vec![make_entry("cat", "cat"), make_entry("dog", "dog")],
    );

    let cancel = Arc::new(AtomicBool::new(true));
    let report = run_import(
        &mut store,
        ImportOptions {
            cancel: Some(cancel),
            ..ImportOptions::with_policy(MergePolicy::KeepOnlyNew)
        },
        &RangesDocument::default(),
        &[],
        vec![make_entry("cat", "cat")],
    )
    .unwrap();

    // deleting "untouched" entries after seeing nothing would destroy data
    assert_eq!(store.entry_count(), 2);
    assert_eq!(report.entries_deleted, 0);
}

// ── Fatal errors ─────────────────────────────────────────────────

#[test]
fn malformed_ranges_abort_before_any_mutation() {
    let mut store = make_store();
    import(&mut store, MergePolicy::KeepOld, vec![make_entry("cat", "cat")]);

    let bad = RangesDocument {
        ranges: vec![make_range("", vec![])],
    };
    let err = run_import(
        &mut store,
        ImportOptions::with_policy(MergePolicy::KeepNew),
        &bad,
        &[],
        vec![make_entry("dog", "dog")],
    );

    assert!(matches!(err, Err(MergeError::Format(_))));
    // the snapshot restored the pre-import state
    assert_eq!(store.entry_count(), 1);
    assert!(store.alias("dog").is_none());
}

#[test]
fn finish_twice_is_an_error() {
    let mut store = make_store();
    let mut merger =
        LexiconMerger::new(&mut store, ImportOptions::with_policy(MergePolicy::KeepOld));
    merger.ranges(&RangesDocument::default()).unwrap();
    merger.finish().unwrap();
    assert!(matches!(merger.finish(), Err(MergeError::Format(_))));
}
