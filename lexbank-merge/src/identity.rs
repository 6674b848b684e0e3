//! Identity resolution between incoming records and persistent objects.
//!
//! Resolution order, per record:
//! 1. an explicit canonical identifier that resolves to an object of a
//!    compatible class;
//! 2. a canonical identifier embedded in the free-text id;
//! 3. for controlled-vocabulary items only, a case- and
//!    normalization-insensitive match on Name or Abbreviation, depth-first
//!    over the target list;
//! 4. nothing — the caller creates a new object, honoring an unused explicit
//!    identifier when one was supplied.
//!
//! Every successful resolution registers the record's external ids in the
//! per-import id table so later relation records resolve idempotently.

use crate::normalize::fold_key;
use lexbank_model::ObjectClass;
use lexbank_store::LexStore;
use lexbank_types::ObjectId;
use std::collections::HashMap;
use uuid::Uuid;

/// Scans free text for an embedded canonical identifier.
///
/// The id attributes of interchange files commonly concatenate a headword
/// with the identifier, e.g. `cat_d7f71764-...`; any 36-char window that
/// parses as a hyphenated UUID counts.
#[must_use]
pub fn extract_embedded_guid(free_id: &str) -> Option<Uuid> {
    let chars: Vec<(usize, char)> = free_id.char_indices().collect();
    if chars.len() < 36 {
        return Uuid::try_parse(free_id).ok();
    }
    for w in chars.windows(36) {
        let start = w[0].0;
        let end = w[35].0 + w[35].1.len_utf8();
        if let Ok(guid) = Uuid::try_parse(&free_id[start..end]) {
            return Some(guid);
        }
    }
    None
}

/// Per-import identity state: the external-id table plus the
/// possibility-by-label caches. Constructed once per import and discarded
/// with it; never ambient.
#[derive(Debug, Default)]
pub struct IdentityResolver {
    /// External id string → resolved object.
    ids: HashMap<String, ObjectId>,
    /// (list, folded label) → item, filled lazily per list.
    labels: HashMap<(ObjectId, String), ObjectId>,
    /// Lists whose label cache has been built.
    cached_lists: Vec<ObjectId>,
}

impl IdentityResolver {
    /// Creates an empty resolver.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an external id for an object.
    pub fn register(&mut self, external: impl Into<String>, id: ObjectId) {
        self.ids.insert(external.into(), id);
    }

    /// Looks up a previously registered external id.
    #[must_use]
    pub fn lookup(&self, external: &str) -> Option<ObjectId> {
        self.ids.get(external).copied()
    }

    /// Resolves an incoming record to an existing object of `class`, or
    /// returns `None` to signal creation. Registers external ids on success.
    pub fn resolve_object(
        &mut self,
        store: &LexStore,
        class: ObjectClass,
        guid: Option<Uuid>,
        free_id: Option<&str>,
    ) -> Option<ObjectId> {
        if let Some(free) = free_id {
            if let Some(found) = self.lookup(free)
                && store.object_class(found) == Some(class)
            {
                return Some(found);
            }
            // aliases recorded by earlier imports keep guid-less files stable
            if let Some(found) = store.alias(free)
                && store.object_class(found) == Some(class)
            {
                self.register_record(guid, free_id, found);
                return Some(found);
            }
        }
        let found = guid
            .map(ObjectId::from_uuid)
            .filter(|id| store.object_class(*id) == Some(class))
            .or_else(|| {
                free_id
                    .and_then(extract_embedded_guid)
                    .map(ObjectId::from_uuid)
                    .filter(|id| store.object_class(*id) == Some(class))
            })?;
        self.register_record(guid, free_id, found);
        Some(found)
    }

    /// Resolves an incoming controlled-vocabulary item against a list,
    /// falling back to normalized Name/Abbreviation matching.
    pub fn resolve_possibility(
        &mut self,
        store: &LexStore,
        list: ObjectId,
        guid: Option<Uuid>,
        free_id: Option<&str>,
        labels: &[&str],
        abbrevs: &[&str],
    ) -> Option<ObjectId> {
        if let Some(found) = self.resolve_object(store, ObjectClass::PossibilityItem, guid, free_id)
        {
            if store.item_list(found) == Some(list) {
                return Some(found);
            }
        }
        self.build_label_cache(store, list);
        let found = labels
            .iter()
            .chain(abbrevs.iter())
            .find_map(|text| self.labels.get(&(list, fold_key(text))).copied())?;
        self.register_record(guid, free_id, found);
        Some(found)
    }

    /// Registers a freshly created item in the label caches so later records
    /// in the same run can match it by label.
    pub fn note_item(&mut self, list: ObjectId, item: ObjectId, labels: &[&str]) {
        for text in labels {
            let key = fold_key(text);
            if !key.is_empty() {
                self.labels.entry((list, key)).or_insert(item);
            }
        }
    }

    /// Registers all external ids a record carried, after any resolution or
    /// creation.
    pub fn register_record(
        &mut self,
        guid: Option<Uuid>,
        free_id: Option<&str>,
        id: ObjectId,
    ) {
        if let Some(guid) = guid {
            self.register(guid.to_string(), id);
        }
        if let Some(free) = free_id {
            self.register(free, id);
        }
    }

    fn build_label_cache(&mut self, store: &LexStore, list: ObjectId) {
        if self.cached_lists.contains(&list) {
            return;
        }
        self.cached_lists.push(list);
        let Some(list_obj) = store.list(list) else {
            return;
        };
        // depth-first, first match wins: do not overwrite an earlier key
        list_obj.walk(&mut |item| {
            for (_, form) in item.name.iter().chain(item.abbreviation.iter()) {
                let key = fold_key(&form.text);
                if !key.is_empty() {
                    self.labels.entry((list, key)).or_insert(item.id);
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_guid_is_found_after_a_prefix() {
        let guid = Uuid::new_v4();
        let free = format!("cat_{guid}");
        assert_eq!(extract_embedded_guid(&free), Some(guid));
    }

    #[test]
    fn no_guid_in_plain_text() {
        assert_eq!(extract_embedded_guid("cat"), None);
        assert_eq!(extract_embedded_guid("a-longer-free-text-id-without-uuids-in-it"), None);
    }
}
