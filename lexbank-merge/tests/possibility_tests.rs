mod common;

use common::*;
use lexbank_merge::{MergePolicy, RangesDocument, RawMultiText, RawRangeElement};
use lexbank_store::StandardList;
use pretty_assertions::assert_eq;
use uuid::Uuid;

// ── Standard ranges ──────────────────────────────────────────────

#[test]
fn grammatical_info_range_fills_parts_of_speech() {
    let mut store = make_store();
    let ranges = RangesDocument {
        ranges: vec![make_range(
            "grammatical-info",
            vec![make_element("Noun", "Noun"), make_element("Verb", "Verb")],
        )],
    };
    let report = import_with_ranges(&mut store, MergePolicy::KeepOld, ranges, vec![]);

    let list = store
        .list(store.standard_list_id(StandardList::PartsOfSpeech))
        .unwrap();
    assert_eq!(list.item_count(), 2);
    assert_eq!(report.new_items().len(), 2);
    assert!(report.new_items().iter().all(|n| n.list_name == "Parts Of Speech"));
}

#[test]
fn parent_declaration_slots_items_into_the_tree() {
    let mut store = make_store();
    let mut child = make_element("Common Noun", "Common Noun");
    child.parent = Some("Noun".to_string());
    let ranges = RangesDocument {
        ranges: vec![make_range(
            "grammatical-info",
            vec![make_element("Noun", "Noun"), child],
        )],
    };
    import_with_ranges(&mut store, MergePolicy::KeepOld, ranges, vec![]);

    let list = store
        .list(store.standard_list_id(StandardList::PartsOfSpeech))
        .unwrap();
    assert_eq!(list.items.len(), 1);
    assert_eq!(list.items[0].sub_items.len(), 1);
}

#[test]
fn reimporting_the_same_range_creates_nothing() {
    let ranges = || RangesDocument {
        ranges: vec![make_range(
            "grammatical-info",
            vec![make_element("Noun", "Noun")],
        )],
    };
    let mut store = make_store();
    import_with_ranges(&mut store, MergePolicy::KeepOld, ranges(), vec![]);
    let report = import_with_ranges(&mut store, MergePolicy::KeepOld, ranges(), vec![]);

    assert_eq!(report.new_items().len(), 0);
    let list = store
        .list(store.standard_list_id(StandardList::PartsOfSpeech))
        .unwrap();
    assert_eq!(list.item_count(), 1);
}

#[test]
fn label_matching_ignores_case_and_composition() {
    let mut store = make_store();
    import_with_ranges(
        &mut store,
        MergePolicy::KeepOld,
        RangesDocument {
            ranges: vec![make_range(
                "grammatical-info",
                vec![make_element("etude", "\u{c9}tude")],
            )],
        },
        vec![],
    );
    // same label, lowercased and decomposed
    let report = import_with_ranges(
        &mut store,
        MergePolicy::KeepOld,
        RangesDocument {
            ranges: vec![make_range(
                "grammatical-info",
                vec![make_element("etude-2", "e\u{301}tude")],
            )],
        },
        vec![],
    );
    assert_eq!(report.new_items().len(), 0);
}

#[test]
fn explicit_identifier_is_honored_on_creation() {
    let guid = Uuid::new_v4();
    let mut store = make_store();
    let mut el = make_element("Noun", "Noun");
    el.guid = Some(guid);
    import_with_ranges(
        &mut store,
        MergePolicy::KeepOld,
        RangesDocument {
            ranges: vec![make_range("grammatical-info", vec![el])],
        },
        vec![],
    );
    let item = store.find_item(lexbank_types::ObjectId::from_uuid(guid));
    assert!(item.is_some());
}

// ── Custom ranges ────────────────────────────────────────────────

#[test]
fn unknown_range_becomes_a_custom_list() {
    let mut store = make_store();
    let ranges = RangesDocument {
        ranges: vec![make_range(
            "dialects",
            vec![make_element("north", "Northern"), make_element("south", "Southern")],
        )],
    };
    import_with_ranges(&mut store, MergePolicy::KeepOld, ranges, vec![]);

    let list_id = store.find_custom_list("dialects").unwrap();
    let list = store.list(list_id).unwrap();
    assert!(list.custom);
    assert_eq!(list.name, "dialects");
    assert_eq!(list.item_count(), 2);
}

#[test]
fn custom_list_is_not_duplicated_across_imports() {
    let ranges = || RangesDocument {
        ranges: vec![make_range("dialects", vec![make_element("north", "Northern")])],
    };
    let mut store = make_store();
    import_with_ranges(&mut store, MergePolicy::KeepOld, ranges(), vec![]);
    import_with_ranges(&mut store, MergePolicy::KeepOld, ranges(), vec![]);

    assert_eq!(store.lists().filter(|l| l.custom).count(), 1);
}

// ── Descriptions and abbreviations ───────────────────────────────

#[test]
fn created_items_carry_label_abbreviation_description() {
    let mut store = make_store();
    let el = RawRangeElement {
        id: "Noun".to_string(),
        label: RawMultiText::single("en", "Noun"),
        abbrev: RawMultiText::single("en", "n"),
        description: RawMultiText::single("en", "a thing word"),
        ..RawRangeElement::default()
    };
    import_with_ranges(
        &mut store,
        MergePolicy::KeepOld,
        RangesDocument {
            ranges: vec![make_range("grammatical-info", vec![el])],
        },
        vec![],
    );

    let list = store
        .list(store.standard_list_id(StandardList::PartsOfSpeech))
        .unwrap();
    let ws = anal(&store);
    let item = &list.items[0];
    assert_eq!(item.name.get(ws).unwrap().text, "Noun");
    assert_eq!(item.abbreviation.get(ws).unwrap().text, "n");
    assert_eq!(item.description.get(ws).unwrap().text, "a thing word");
}

// ── Relation type declarations ───────────────────────────────────

#[test]
fn lexical_relation_range_declares_typed_relations() {
    let mut store = make_store();
    let ranges = RangesDocument {
        ranges: vec![make_range(
            "lexical-relation",
            vec![
                relation_element("Synonym", "collection", None),
                relation_element("Part", "tree", Some("Whole")),
            ],
        )],
    };
    import_with_ranges(&mut store, MergePolicy::KeepOld, ranges, vec![]);

    let syn = store.find_relation_type("Synonym").unwrap();
    assert_eq!(syn.mapping, lexbank_model::MappingKind::Collection);
    let part = store.find_relation_type("Part").unwrap();
    assert_eq!(part.mapping, lexbank_model::MappingKind::Tree);
    assert_eq!(part.reverse_name.as_deref(), Some("Whole"));
}

// ── Grammatical info from entry data ─────────────────────────────

#[test]
fn grammatical_info_creates_missing_part_of_speech() {
    let mut store = make_store();
    let mut entry = make_entry("cat", "cat");
    let mut sense = make_sense("cat-s1", "feline");
    sense.grammatical_info = Some("Noun".to_string());
    entry.senses.push(sense);
    let report = import(&mut store, MergePolicy::KeepOld, vec![entry]);

    assert!(report.new_items().iter().any(|n| n.label == "Noun"));
    let entry = store.entries().next().unwrap();
    let msa_id = entry.senses[0].msa.unwrap();
    let msa = entry.find_msa(msa_id).unwrap();
    assert!(msa.part_of_speech.is_some());
}

#[test]
fn senses_with_the_same_pos_share_one_msa() {
    let mut store = make_store();
    let mut entry = make_entry("run", "run");
    for (id, gloss) in [("run-s1", "to move fast"), ("run-s2", "to operate")] {
        let mut sense = make_sense(id, gloss);
        sense.grammatical_info = Some("Verb".to_string());
        entry.senses.push(sense);
    }
    import(&mut store, MergePolicy::KeepOld, vec![entry]);

    let entry = store.entries().next().unwrap();
    assert_eq!(entry.msas.len(), 1);
    assert_eq!(entry.senses[0].msa, entry.senses[1].msa);
}
