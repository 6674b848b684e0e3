mod common;

use common::*;
use lexbank_merge::{DiagnosticRecord, MergePolicy, RawMultiText};
use pretty_assertions::assert_eq;

// ── KeepOld ──────────────────────────────────────────────────────

#[test]
fn keep_old_fills_only_empty_fields() {
    let mut store = make_store();
    let mut entry = make_entry("cat", "cat");
    entry.senses.push(make_sense("cat-s1", "feline"));
    import(&mut store, MergePolicy::KeepOld, vec![entry]);
    assert_eq!(only_gloss(&store), "feline");

    // reimport with a different gloss and a definition the store lacks
    let mut update = make_entry("cat", "cat");
    let mut sense = make_sense("cat-s1", "house cat");
    sense.definition = RawMultiText::single("en", "a small domesticated felid");
    update.senses.push(sense);
    let report = import(&mut store, MergePolicy::KeepOld, vec![update]);

    // populated field untouched, no conflict logged for the skip
    assert_eq!(only_gloss(&store), "feline");
    assert_eq!(report.conflicts().count(), 0);
    // empty field filled from the incoming value
    let entry = store.entries().next().unwrap();
    let ws = anal(&store);
    assert_eq!(
        entry.senses[0].definition.get(ws).unwrap().text,
        "a small domesticated felid"
    );
}

// ── KeepNew ──────────────────────────────────────────────────────

#[test]
fn keep_new_always_takes_the_incoming_value() {
    let mut store = make_store();
    let mut entry = make_entry("cat", "cat");
    entry.senses.push(make_sense("cat-s1", "feline"));
    import(&mut store, MergePolicy::KeepOld, vec![entry]);

    let mut update = make_entry("cat", "cat");
    update.senses.push(make_sense("cat-s1", "house cat"));
    import(&mut store, MergePolicy::KeepNew, vec![update]);

    assert_eq!(only_gloss(&store), "house cat");
    assert_eq!(store.entry_count(), 1);
}

// ── KeepBoth ─────────────────────────────────────────────────────

#[test]
fn keep_both_duplicates_the_entry_on_conflict() {
    let mut store = make_store();
    let mut entry = make_entry("cat", "cat");
    entry.citation = RawMultiText::single("seh", "the cat");
    import(&mut store, MergePolicy::KeepOld, vec![entry]);

    let mut update = make_entry("cat", "cat");
    update.citation = RawMultiText::single("seh", "a cat");
    let report = import(&mut store, MergePolicy::KeepBoth, vec![update]);

    // original keeps its value, a sibling carries the incoming one
    assert_eq!(store.entry_count(), 2);
    assert_eq!(report.conflicts().count(), 1);
    let Some(DiagnosticRecord::Conflict {
        object,
        duplicate,
        field,
        existing,
        incoming,
        ..
    }) = report.conflicts().next()
    else {
        panic!("expected a conflict record");
    };
    assert_ne!(object, duplicate);
    assert_eq!(field, "citation-form");
    assert_eq!(existing, "the cat");
    assert_eq!(incoming, "a cat");

    let ws = vern(&store);
    let citations: Vec<String> = store
        .entries()
        .filter_map(|e| e.citation_form.get(ws).map(|f| f.text.clone()))
        .collect();
    assert!(citations.contains(&"the cat".to_string()));
    assert!(citations.contains(&"a cat".to_string()));
}

#[test]
fn keep_both_without_conflict_merges_in_place() {
    let mut store = make_store();
    import(&mut store, MergePolicy::KeepOld, vec![make_entry("cat", "cat")]);
    let mut update = make_entry("cat", "cat");
    update.senses.push(make_sense("cat-s1", "feline"));
    let report = import(&mut store, MergePolicy::KeepBoth, vec![update]);
    assert_eq!(store.entry_count(), 1);
    assert_eq!(report.conflicts().count(), 0);
}

// ── KeepOnlyNew ──────────────────────────────────────────────────

#[test]
fn keep_only_new_clears_absent_writing_systems() {
    let mut store = make_store();
    let mut entry = make_entry("cat", "cat");
    let mut gloss = RawMultiText::single("en", "feline");
    gloss.push("fr", "chat");
    let mut sense = make_sense("cat-s1", "");
    sense.gloss = gloss;
    entry.senses.push(sense);
    import(&mut store, MergePolicy::KeepOld, vec![entry]);

    // the reimport only carries the English gloss
    let mut update = make_entry("cat", "cat");
    update.senses.push(make_sense("cat-s1", "feline"));
    import(&mut store, MergePolicy::KeepOnlyNew, vec![update]);

    let entry = store.entries().next().unwrap();
    let fr = store.ws().get("fr").unwrap();
    assert!(entry.senses[0].gloss.get(fr).is_none());
    assert_eq!(only_gloss(&store), "feline");
}

#[test]
fn other_policies_leave_untouched_keys_intact() {
    let mut store = make_store();
    let mut entry = make_entry("cat", "cat");
    let mut gloss = RawMultiText::single("en", "feline");
    gloss.push("fr", "chat");
    let mut sense = make_sense("cat-s1", "");
    sense.gloss = gloss;
    entry.senses.push(sense);
    import(&mut store, MergePolicy::KeepOld, vec![entry]);

    let mut update = make_entry("cat", "cat");
    update.senses.push(make_sense("cat-s1", "feline"));
    import(&mut store, MergePolicy::KeepNew, vec![update]);

    let entry = store.entries().next().unwrap();
    let fr = store.ws().get("fr").unwrap();
    assert_eq!(entry.senses[0].gloss.get(fr).unwrap().text, "chat");
}

#[test]
fn keep_only_new_deletes_untouched_entries() {
    let mut store = make_store();
    import(
        &mut store,
        MergePolicy::KeepOld,
        vec![make_entry("cat", "cat"), make_entry("dog", "dog")],
    );
    assert_eq!(store.entry_count(), 2);

    let report = import(&mut store, MergePolicy::KeepOnlyNew, vec![make_entry("cat", "cat")]);
    assert_eq!(store.entry_count(), 1);
    assert_eq!(report.entries_deleted, 1);
}

// ── Truncation ───────────────────────────────────────────────────

#[test]
fn truncation_is_exact_and_diagnosed_once() {
    let mut store = make_store();
    store.set_field_limit("citation-form", 5);
    let mut entry = make_entry("caterpillar", "caterpillar");
    entry.citation = RawMultiText::single("seh", "caterpillar");
    let report = import(&mut store, MergePolicy::KeepOld, vec![entry]);

    let ws = vern(&store);
    let stored = store
        .entries()
        .next()
        .unwrap()
        .citation_form
        .get(ws)
        .unwrap();
    assert_eq!(stored.char_len(), 5);
    assert_eq!(stored.text, "cater");

    let truncations: Vec<_> = report.truncations().collect();
    assert_eq!(truncations.len(), 1);
    let DiagnosticRecord::Truncation {
        field,
        ws,
        original,
        stored_len,
        ..
    } = truncations[0]
    else {
        panic!("expected a truncation record");
    };
    assert_eq!(field, "citation-form");
    assert_eq!(ws, "seh");
    assert_eq!(original, "caterpillar");
    assert_eq!(*stored_len, 5);
}

#[test]
fn values_within_the_limit_are_not_diagnosed() {
    let mut store = make_store();
    store.set_field_limit("citation-form", 20);
    let mut entry = make_entry("cat", "cat");
    entry.citation = RawMultiText::single("seh", "cat");
    let report = import(&mut store, MergePolicy::KeepOld, vec![entry]);
    assert_eq!(report.truncations().count(), 0);
}

// ── Unicode normalization ────────────────────────────────────────

#[test]
fn differing_compositions_are_not_conflicts() {
    let mut store = make_store();
    let mut entry = make_entry("cafe", "caf\u{e9}");
    entry.senses.push(make_sense("cafe-s1", "coffee house"));
    import(&mut store, MergePolicy::KeepOld, vec![entry]);

    // same headword, decomposed this time
    let mut update = make_entry("cafe", "cafe\u{301}");
    update.senses.push(make_sense("cafe-s1", "coffee house"));
    let report = import(&mut store, MergePolicy::KeepBoth, vec![update]);

    assert_eq!(store.entry_count(), 1);
    assert_eq!(report.conflicts().count(), 0);
}
