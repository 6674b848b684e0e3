mod common;

use common::*;
use lexbank_merge::{MergePolicy, RawTrait};
use pretty_assertions::assert_eq;

// ── Residue round-trip ───────────────────────────────────────────

#[test]
fn unknown_elements_round_trip_byte_for_byte() {
    let fragment = "<annotation who=\"J. Doe\" when=\"2019-03-01\">checked</annotation>";
    let mut store = make_store();
    let mut entry = make_entry("cat", "cat");
    entry.unknown.push(fragment.to_string());
    import(&mut store, MergePolicy::KeepOld, vec![entry]);

    let entry = store.entries().next().unwrap();
    let fragments: Vec<&str> = entry.residue.iter().collect();
    assert_eq!(fragments, [fragment]);
}

#[test]
fn unknown_sense_content_lands_on_the_sense() {
    let fragment = "<reversal type=\"en\"><form lang=\"en\"><text>feline</text></form></reversal>";
    let mut store = make_store();
    let mut entry = make_entry("cat", "cat");
    let mut sense = make_sense("cat-s1", "feline");
    sense.unknown.push(fragment.to_string());
    entry.senses.push(sense);
    import(&mut store, MergePolicy::KeepOld, vec![entry]);

    let entry = store.entries().next().unwrap();
    let fragments: Vec<&str> = entry.senses[0].residue.iter().collect();
    assert_eq!(fragments, [fragment]);
}

#[test]
fn unrecognized_traits_are_preserved_as_residue() {
    let mut store = make_store();
    let mut entry = make_entry("cat", "cat");
    entry.traits.push(RawTrait::new("entry-color", "blue"));
    import(&mut store, MergePolicy::KeepOld, vec![entry]);

    let entry = store.entries().next().unwrap();
    let fragments: Vec<&str> = entry.residue.iter().collect();
    assert_eq!(fragments, ["<trait name=\"entry-color\" value=\"blue\"/>"]);
}

#[test]
fn residue_accumulates_in_order_of_appearance() {
    let mut store = make_store();
    let mut entry = make_entry("cat", "cat");
    entry.unknown.push("<first/>".to_string());
    entry.unknown.push("<second/>".to_string());
    import(&mut store, MergePolicy::KeepOld, vec![entry]);

    let entry = store.entries().next().unwrap();
    let fragments: Vec<&str> = entry.residue.iter().collect();
    assert_eq!(fragments, ["<first/>", "<second/>"]);
}

// ── Report structure ─────────────────────────────────────────────

#[test]
fn clean_import_renders_no_sections() {
    let mut store = make_store();
    let report = import(&mut store, MergePolicy::KeepOld, vec![make_entry("cat", "cat")]);
    let rendered = report.render();

    assert!(rendered.contains("Import report"));
    assert!(rendered.contains("Entries created: 1"));
    assert!(!rendered.contains("== Conflicts =="));
    assert!(!rendered.contains("== Truncated values =="));
    assert!(!rendered.contains("== Invalid relations =="));
    assert!(!rendered.contains("== New vocabulary items =="));
    assert!(!rendered.contains("== Errors =="));
}

#[test]
fn sections_appear_only_for_recorded_categories() {
    let mut store = make_store();
    store.set_field_limit("citation-form", 3);
    let mut entry = make_entry("caterpillar", "caterpillar");
    entry.citation = lexbank_merge::RawMultiText::single("seh", "caterpillar");
    entry.relations.push(make_relation("Synonym", "nowhere"));
    let report = import(&mut store, MergePolicy::KeepOld, vec![entry]);
    let rendered = report.render();

    assert!(rendered.contains("== Truncated values =="));
    assert!(rendered.contains("== Invalid relations =="));
    assert!(rendered.contains("\"nowhere\""));
    assert!(!rendered.contains("== Conflicts =="));
}

#[test]
fn new_items_section_lists_labels_and_lists() {
    let mut store = make_store();
    let mut entry = make_entry("cat", "cat");
    let mut sense = make_sense("cat-s1", "feline");
    sense.grammatical_info = Some("Noun".to_string());
    entry.senses.push(sense);
    let report = import(&mut store, MergePolicy::KeepOld, vec![entry]);
    let rendered = report.render();

    assert!(rendered.contains("== New vocabulary items =="));
    assert!(rendered.contains("Noun (in Parts Of Speech)"));
}

#[test]
fn section_order_is_stable() {
    let mut store = make_store();
    store.set_field_limit("citation-form", 3);
    let mut entry = make_entry("caterpillar", "caterpillar");
    entry.citation = lexbank_merge::RawMultiText::single("seh", "caterpillar");
    entry.relations.push(make_relation("Synonym", "nowhere"));
    let mut sense = make_sense("s1", "larva");
    sense.grammatical_info = Some("Noun".to_string());
    entry.senses.push(sense);
    let report = import(&mut store, MergePolicy::KeepOld, vec![entry]);
    let rendered = report.render();

    let items = rendered.find("== New vocabulary items ==").unwrap();
    let truncs = rendered.find("== Truncated values ==").unwrap();
    let invalid = rendered.find("== Invalid relations ==").unwrap();
    assert!(items < truncs);
    assert!(truncs < invalid);
}
