use lexbank_model::{
    FieldKind, FormattedText, LexicalEntry, MappingKind, MultiText, PossibilityItem,
    PossibilityList, RelationGroup, Sense,
};
use lexbank_types::{ObjectId, WsId};
use pretty_assertions::assert_eq;

fn ws(n: u32) -> WsId {
    WsId::from_raw(n)
}

// ── Entries and senses ───────────────────────────────────────────

#[test]
fn headword_falls_back_to_lexeme_form() {
    let mut entry = LexicalEntry::new();
    entry.lexeme_form = MultiText::single(ws(0), "run");
    assert_eq!(entry.headword().get(ws(0)).unwrap().text, "run");
    entry.citation_form = MultiText::single(ws(0), "to run");
    assert_eq!(entry.headword().get(ws(0)).unwrap().text, "to run");
}

#[test]
fn find_sense_descends_into_subsenses() {
    let mut entry = LexicalEntry::new();
    let mut sense = Sense::new();
    let mut sub = Sense::new();
    let sub_id = sub.id;
    sub.gloss = MultiText::single(ws(1), "narrow gloss");
    sense.subsenses.push(sub);
    entry.senses.push(sense);

    let found = entry.find_sense(sub_id).unwrap();
    assert_eq!(found.gloss.get(ws(1)).unwrap().text, "narrow gloss");
    assert!(entry.find_sense(ObjectId::new()).is_none());
}

#[test]
fn walk_senses_is_depth_first() {
    let mut entry = LexicalEntry::new();
    let mut first = Sense::new();
    let mut sub = Sense::new();
    sub.gloss = MultiText::single(ws(0), "b");
    first.gloss = MultiText::single(ws(0), "a");
    first.subsenses.push(sub);
    let mut second = Sense::new();
    second.gloss = MultiText::single(ws(0), "c");
    entry.senses.push(first);
    entry.senses.push(second);

    let mut order = Vec::new();
    entry.walk_senses(&mut |s| {
        if let Some(form) = s.gloss.get(ws(0)) {
            order.push(form.text.clone());
        }
    });
    assert_eq!(order, ["a", "b", "c"]);
}

// ── Possibility trees ────────────────────────────────────────────

#[test]
fn possibility_list_finds_nested_items() {
    let mut list = PossibilityList::new("Semantic Domains", false);
    let mut root = PossibilityItem::new();
    let mut child = PossibilityItem::new();
    let child_id = child.id;
    child.name = MultiText::single(ws(1), "Sky");
    root.sub_items.push(child);
    list.items.push(root);

    assert!(list.find(child_id).is_some());
    assert_eq!(list.item_count(), 2);
}

// ── Relation groups ──────────────────────────────────────────────

#[test]
fn unordered_comparison_ignores_order() {
    let ty = ObjectId::new();
    let (a, b, c) = (ObjectId::new(), ObjectId::new(), ObjectId::new());
    let group = RelationGroup::new(ty, vec![a, b]);
    assert!(group.same_unordered(&[b, a]));
    assert!(!group.same_unordered(&[a, c]));
    assert!(!group.same_ordered(&[b, a]));
    assert!(group.same_ordered(&[a, b]));
    assert!(group.shares_member(&[c, b]));
}

#[test]
fn mapping_kind_order_significance() {
    assert!(MappingKind::Sequence.is_ordered());
    assert!(MappingKind::Tree.is_ordered());
    assert!(!MappingKind::Collection.is_ordered());
    assert!(!MappingKind::Pair.is_ordered());
}

// ── Custom field kinds ───────────────────────────────────────────

#[test]
fn field_kind_equivalence_table() {
    assert!(FieldKind::Binary.compatible_with(FieldKind::Image));
    assert!(FieldKind::Image.compatible_with(FieldKind::Binary));
    assert!(FieldKind::OwningCollection.compatible_with(FieldKind::OwningSequence));
    assert!(FieldKind::ReferenceSequence.compatible_with(FieldKind::ReferenceCollection));
    assert!(FieldKind::String.compatible_with(FieldKind::String));
    assert!(!FieldKind::String.compatible_with(FieldKind::Integer));
    assert!(!FieldKind::Binary.compatible_with(FieldKind::OwningCollection));
}

// ── Formatted text ───────────────────────────────────────────────

#[test]
fn truncate_counts_scalar_values_not_bytes() {
    let mut t = FormattedText::plain("caf\u{e9} noir");
    t.truncate_chars(4);
    assert_eq!(t.text, "caf\u{e9}");
    assert_eq!(t.char_len(), 4);
}
