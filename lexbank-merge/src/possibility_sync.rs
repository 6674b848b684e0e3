//! Controlled-vocabulary synchronization from the ranges document.
//!
//! Runs once per import, before the main stream. Standard ranges are matched
//! against the well-known list table; anything else becomes (or extends) a
//! custom list keyed by its declared identifier. Missing items are created
//! and registered for the new-items section of the report.

use crate::convert;
use crate::diagnostics::DiagnosticsRecorder;
use crate::error::{MergeError, MergeResult};
use crate::identity::IdentityResolver;
use crate::input::{RangesDocument, RawRange, RawRangeElement};
use crate::ws_resolver::WsResolver;
use lexbank_model::{MappingKind, PossibilityItem, RelationType};
use lexbank_store::{LexStore, StandardList};
use lexbank_types::ObjectId;
use std::collections::HashMap;
use tracing::{debug, info};

/// Maps a declared range identifier to a standard list.
#[must_use]
pub fn well_known_list(range_id: &str) -> Option<StandardList> {
    match range_id {
        "grammatical-info" | "part-of-speech" | "parts-of-speech" => {
            Some(StandardList::PartsOfSpeech)
        }
        "semantic-domain-ddp4" | "semantic-domain" => Some(StandardList::SemanticDomains),
        "lexical-relation" | "lexical-relations" => Some(StandardList::LexicalRelations),
        "complex-form-type" | "complex-form-types" => Some(StandardList::ComplexFormTypes),
        "variant-type" | "variant-types" => Some(StandardList::VariantTypes),
        "usage-type" | "usage-types" => Some(StandardList::UsageTypes),
        "morph-type" | "morph-types" => Some(StandardList::MorphTypes),
        _ => None,
    }
}

fn parse_mapping(value: &str) -> Option<MappingKind> {
    match value {
        "collection" | "0" => Some(MappingKind::Collection),
        "pair" | "1" => Some(MappingKind::Pair),
        "asymmetric-pair" | "2" => Some(MappingKind::AsymmetricPair),
        "sequence" | "3" => Some(MappingKind::Sequence),
        "tree" | "4" => Some(MappingKind::Tree),
        _ => None,
    }
}

/// Loads the ranges document into the store's possibility lists.
#[derive(Debug, Default)]
pub struct PossibilitySynchronizer {
    loaded: bool,
}

impl PossibilitySynchronizer {
    /// Creates a synchronizer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Synchronizes every declared range. Fatal on a malformed document or
    /// a second load; nothing is mutated before validation passes.
    pub fn sync(
        &mut self,
        store: &mut LexStore,
        ws: &mut WsResolver,
        ids: &mut IdentityResolver,
        diags: &mut DiagnosticsRecorder,
        doc: &RangesDocument,
    ) -> MergeResult<()> {
        if self.loaded {
            return Err(MergeError::Format(
                "ranges document loaded twice".to_string(),
            ));
        }
        validate(doc)?;
        self.loaded = true;

        for range in &doc.ranges {
            let which = well_known_list(&range.id);
            let list_id = match which {
                Some(standard) => store.standard_list_id(standard),
                None => self.custom_list(store, range)?,
            };
            self.sync_range(store, ws, ids, diags, range, list_id)?;
            if which == Some(StandardList::LexicalRelations) {
                declare_relation_types(store, range);
            }
        }
        info!("synchronized {} ranges", doc.ranges.len());
        Ok(())
    }

    fn custom_list(&mut self, store: &mut LexStore, range: &RawRange) -> MergeResult<ObjectId> {
        let key = range
            .guid
            .map(|g| g.to_string())
            .unwrap_or_else(|| range.id.clone());
        if let Some(existing) = store.find_custom_list(&key) {
            return Ok(existing);
        }
        Ok(store.add_custom_list(&range.id, &key)?)
    }

    fn sync_range(
        &mut self,
        store: &mut LexStore,
        ws: &mut WsResolver,
        ids: &mut IdentityResolver,
        diags: &mut DiagnosticsRecorder,
        range: &RawRange,
        list_id: ObjectId,
    ) -> MergeResult<()> {
        let list_name = store
            .list(list_id)
            .map(|l| l.name.clone())
            .unwrap_or_default();
        // element id → item, for parent slots within this range
        let mut local: HashMap<String, ObjectId> = HashMap::new();

        for el in &range.elements {
            let labels = convert::texts(&el.label);
            let abbrevs = convert::texts(&el.abbrev);
            if let Some(found) =
                ids.resolve_possibility(store, list_id, el.guid, Some(&el.id), &labels, &abbrevs)
            {
                ids.register_record(el.guid, Some(&el.id), found);
                local.insert(el.id.clone(), found);
                continue;
            }

            // parents are usually declared first; an unresolved parent slots
            // the item at the root
            let parent = el
                .parent
                .as_deref()
                .and_then(|p| local.get(p).copied().or_else(|| ids.lookup(p)));
            let created = create_item(store, ws, el, list_id, parent)?;
            ids.register_record(el.guid, Some(&el.id), created);
            let mut all_labels = labels.clone();
            all_labels.extend(&abbrevs);
            ids.note_item(list_id, created, &all_labels);
            local.insert(el.id.clone(), created);
            let label = convert::first_text(&el.label).unwrap_or(&el.id);
            diags.new_item(list_id, created, label, &list_name);
            debug!("created possibility {label:?} in {list_name:?}");
        }
        Ok(())
    }

}

fn create_item(
    store: &mut LexStore,
    ws: &mut WsResolver,
    el: &RawRangeElement,
    list_id: ObjectId,
    parent: Option<ObjectId>,
) -> MergeResult<ObjectId> {
    let mut item = PossibilityItem::new();
    if let Some(guid) = el.guid {
        let explicit = ObjectId::from_uuid(guid);
        if !store.contains(explicit) {
            item.id = explicit;
        }
    }
    item.name = convert::multitext(store, ws, &el.label);
    item.abbreviation = convert::multitext(store, ws, &el.abbrev);
    item.description = convert::multitext(store, ws, &el.description);
    Ok(store.add_item(list_id, parent, item)?)
}

/// Ensures a relation type exists for each lexical-relation element, reading
/// the mapping kind and reverse name from the element's traits.
fn declare_relation_types(store: &mut LexStore, range: &RawRange) {
    for el in &range.elements {
        let name = convert::first_text(&el.label)
            .unwrap_or(&el.id)
            .to_string();
        if store.find_relation_type(&name).is_some() {
            continue;
        }
        let mapping = el
            .traits
            .iter()
            .find(|t| t.name == "referenceType" || t.name == "reference-type")
            .and_then(|t| parse_mapping(&t.value))
            .unwrap_or(MappingKind::Collection);
        let mut rt = RelationType::new(name, mapping);
        rt.reverse_name = el
            .traits
            .iter()
            .find(|t| t.name == "reverse-label" || t.name == "reverse-name")
            .map(|t| t.value.clone());
        store.add_relation_type(rt);
    }
}

/// Resolves a label against a list, creating the item in the default
/// analysis writing system when absent. Shared by the merger (for
/// grammatical info, morph types, semantic domains, reference-valued custom
/// fields) and the relation resolver (for complex-form and variant types).
pub(crate) fn find_or_create_item(
    store: &mut LexStore,
    ids: &mut IdentityResolver,
    diags: &mut DiagnosticsRecorder,
    list: ObjectId,
    label: &str,
) -> ObjectId {
    use lexbank_model::MultiText;

    if let Some(found) = ids.resolve_possibility(store, list, None, None, &[label], &[]) {
        return found;
    }
    let ws = store.ws().default_analysis();
    let mut item = PossibilityItem::new();
    item.name = MultiText::single(ws, label);
    let id = store
        .add_item(list, None, item)
        .expect("caller passes an existing list");
    ids.note_item(list, id, &[label]);
    let list_name = store.list(list).map(|l| l.name.clone()).unwrap_or_default();
    diags.new_item(list, id, label, list_name);
    debug!("created possibility {label:?} from entry data");
    id
}

fn validate(doc: &RangesDocument) -> MergeResult<()> {
    for range in &doc.ranges {
        if range.id.is_empty() {
            return Err(MergeError::Format("range with empty id".to_string()));
        }
        for el in &range.elements {
            if el.id.is_empty() {
                return Err(MergeError::Format(format!(
                    "range {:?} has an element with an empty id",
                    range.id
                )));
            }
        }
    }
    Ok(())
}
