//! The lexical object store.

use crate::ws::WritingSystemRegistry;
use crate::{StoreError, StoreResult};
use lexbank_model::{
    CustomFieldDefinition, EntryReference, LexicalEntry, MultiText, ObjectClass, PossibilityItem,
    PossibilityList, RelationGroup, RelationType, Sense, WordAnalysis,
};
use lexbank_types::ObjectId;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// The standard possibility lists every store is created with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StandardList {
    PartsOfSpeech,
    SemanticDomains,
    LexicalRelations,
    ComplexFormTypes,
    VariantTypes,
    UsageTypes,
    MorphTypes,
}

impl StandardList {
    /// All standard lists, in creation order.
    pub const ALL: [StandardList; 7] = [
        StandardList::PartsOfSpeech,
        StandardList::SemanticDomains,
        StandardList::LexicalRelations,
        StandardList::ComplexFormTypes,
        StandardList::VariantTypes,
        StandardList::UsageTypes,
        StandardList::MorphTypes,
    ];

    /// Display name of the list.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            StandardList::PartsOfSpeech => "Parts Of Speech",
            StandardList::SemanticDomains => "Semantic Domains",
            StandardList::LexicalRelations => "Lexical Relations",
            StandardList::ComplexFormTypes => "Complex Form Types",
            StandardList::VariantTypes => "Variant Types",
            StandardList::UsageTypes => "Usage Types",
            StandardList::MorphTypes => "Morph Types",
        }
    }
}

/// The persistent in-memory lexical database.
///
/// Arenas are `BTreeMap`s so iteration order is deterministic. The store is
/// `Clone`; callers snapshot before a batch mutation and restore on failure.
#[derive(Debug, Clone)]
pub struct LexStore {
    entries: BTreeMap<ObjectId, LexicalEntry>,
    lists: BTreeMap<ObjectId, PossibilityList>,
    relation_types: BTreeMap<ObjectId, RelationType>,
    relation_groups: BTreeMap<ObjectId, RelationGroup>,
    entry_refs: BTreeMap<ObjectId, EntryReference>,
    analyses: BTreeMap<ObjectId, WordAnalysis>,
    custom_fields: Vec<CustomFieldDefinition>,
    writing_systems: WritingSystemRegistry,
    standard_lists: BTreeMap<StandardList, ObjectId>,
    /// External key → list, for custom lists declared by imports.
    custom_lists: HashMap<String, ObjectId>,
    /// Object class index for kind-checked resolution.
    kinds: HashMap<ObjectId, ObjectClass>,
    /// Sense → owning entry.
    sense_owner: HashMap<ObjectId, ObjectId>,
    /// Possibility item → owning list.
    item_owner: HashMap<ObjectId, ObjectId>,
    /// Maximum stored length (in chars) per length-limited field.
    field_limits: HashMap<String, usize>,
    /// External interchange ids seen by past imports, so re-imports of files
    /// without canonical identifiers still find their objects.
    external_ids: HashMap<String, ObjectId>,
}

impl LexStore {
    /// Creates a store with the given default writing systems, the standard
    /// possibility lists, and the built-in morph types.
    #[must_use]
    pub fn new(vernacular_tag: &str, analysis_tag: &str) -> Self {
        let mut store = Self {
            entries: BTreeMap::new(),
            lists: BTreeMap::new(),
            relation_types: BTreeMap::new(),
            relation_groups: BTreeMap::new(),
            entry_refs: BTreeMap::new(),
            analyses: BTreeMap::new(),
            custom_fields: Vec::new(),
            writing_systems: WritingSystemRegistry::new(vernacular_tag, analysis_tag),
            standard_lists: BTreeMap::new(),
            custom_lists: HashMap::new(),
            kinds: HashMap::new(),
            sense_owner: HashMap::new(),
            item_owner: HashMap::new(),
            field_limits: HashMap::new(),
            external_ids: HashMap::new(),
        };
        for which in StandardList::ALL {
            let list = PossibilityList::new(which.name(), false);
            let id = list.id;
            store.kinds.insert(id, ObjectClass::PossibilityList);
            store.lists.insert(id, list);
            store.standard_lists.insert(which, id);
        }
        store.seed_morph_types();
        store
    }

    fn seed_morph_types(&mut self) {
        let ws = self.writing_systems.default_analysis();
        let list = self.standard_list_id(StandardList::MorphTypes);
        for (name, abbr) in [
            ("stem", "stem"),
            ("root", "rt"),
            ("bound stem", "bd stem"),
            ("prefix", "pfx"),
            ("suffix", "sfx"),
            ("infix", "ifx"),
            ("circumfix", "cfx"),
            ("enclitic", "encl"),
            ("proclitic", "procl"),
            ("phrase", "phr"),
        ] {
            let mut item = PossibilityItem::new();
            item.name = MultiText::single(ws, name);
            item.abbreviation = MultiText::single(ws, abbr);
            // seeding is infallible: the list was just created
            let _ = self.add_item(list, None, item);
        }
    }

    // ── Object class index ───────────────────────────────────────────

    /// Returns the class of an object, if it exists.
    #[must_use]
    pub fn object_class(&self, id: ObjectId) -> Option<ObjectClass> {
        self.kinds.get(&id).copied()
    }

    /// True if any object with this id exists.
    #[must_use]
    pub fn contains(&self, id: ObjectId) -> bool {
        self.kinds.contains_key(&id)
    }

    // ── Entries ──────────────────────────────────────────────────────

    /// Inserts or replaces an entry, reindexing its owned objects.
    pub fn put_entry(&mut self, entry: LexicalEntry) {
        if let Some(old) = self.entries.get(&entry.id).cloned() {
            self.unindex_entry_senses(&old);
        }
        self.index_entry_senses(&entry);
        self.kinds.insert(entry.id, ObjectClass::Entry);
        debug!("put entry {}", entry.id);
        self.entries.insert(entry.id, entry);
    }

    fn index_entry_senses(&mut self, entry: &LexicalEntry) {
        entry.walk_senses(&mut |s: &Sense| {
            self.sense_owner.insert(s.id, entry.id);
            self.kinds.insert(s.id, ObjectClass::Sense);
        });
    }

    fn unindex_entry_senses(&mut self, entry: &LexicalEntry) {
        entry.walk_senses(&mut |s: &Sense| {
            self.sense_owner.remove(&s.id);
            self.kinds.remove(&s.id);
        });
    }

    /// Returns an entry by id.
    #[must_use]
    pub fn entry(&self, id: ObjectId) -> Option<&LexicalEntry> {
        self.entries.get(&id)
    }

    /// Mutable access to an entry in place.
    ///
    /// Callers must not add or remove senses through this reference; replace
    /// the entry via [`put_entry`](Self::put_entry) instead so the ownership
    /// indexes stay consistent.
    pub fn entry_mut(&mut self, id: ObjectId) -> Option<&mut LexicalEntry> {
        self.entries.get_mut(&id)
    }

    /// Removes an entry and everything it owns. This is the owning-collection
    /// removal primitive; dangling references left in relation groups, entry
    /// references, and analyses are the orphan sweeps' concern.
    pub fn remove_entry(&mut self, id: ObjectId) -> Option<LexicalEntry> {
        let entry = self.entries.remove(&id)?;
        self.unindex_entry_senses(&entry);
        self.kinds.remove(&id);
        debug!("removed entry {}", id);
        Some(entry)
    }

    /// Iterates over all entries.
    pub fn entries(&self) -> impl Iterator<Item = &LexicalEntry> {
        self.entries.values()
    }

    /// All entry ids, for passes that mutate while iterating.
    #[must_use]
    pub fn entry_ids(&self) -> Vec<ObjectId> {
        self.entries.keys().copied().collect()
    }

    /// Number of top-level entries.
    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// Returns the entry owning a sense.
    #[must_use]
    pub fn sense_owner(&self, sense: ObjectId) -> Option<ObjectId> {
        self.sense_owner.get(&sense).copied()
    }

    // ── Possibility lists ────────────────────────────────────────────

    /// The id of a standard list.
    #[must_use]
    pub fn standard_list_id(&self, which: StandardList) -> ObjectId {
        self.standard_lists[&which]
    }

    /// Returns a list by id.
    #[must_use]
    pub fn list(&self, id: ObjectId) -> Option<&PossibilityList> {
        self.lists.get(&id)
    }

    /// Iterates over all lists.
    pub fn lists(&self) -> impl Iterator<Item = &PossibilityList> {
        self.lists.values()
    }

    /// Creates a custom list under an external key.
    ///
    /// Fails if the key was already used; a list identifier is never
    /// duplicated within a store.
    pub fn add_custom_list(&mut self, name: &str, external_key: &str) -> StoreResult<ObjectId> {
        if self.custom_lists.contains_key(external_key) {
            return Err(StoreError::DuplicateList(external_key.to_string()));
        }
        let mut list = PossibilityList::new(name, true);
        list.external_key = Some(external_key.to_string());
        let id = list.id;
        self.kinds.insert(id, ObjectClass::PossibilityList);
        self.custom_lists.insert(external_key.to_string(), id);
        self.lists.insert(id, list);
        debug!("created custom list {name:?} ({external_key})");
        Ok(id)
    }

    /// Finds a custom list by the external key it was declared under.
    #[must_use]
    pub fn find_custom_list(&self, external_key: &str) -> Option<ObjectId> {
        self.custom_lists.get(external_key).copied()
    }

    /// Adds an item to a list, optionally under a parent item.
    pub fn add_item(
        &mut self,
        list: ObjectId,
        parent: Option<ObjectId>,
        item: PossibilityItem,
    ) -> StoreResult<ObjectId> {
        let id = item.id;
        let list_obj = self.lists.get_mut(&list).ok_or(StoreError::NotFound(list))?;
        match parent {
            Some(pid) => {
                let parent_item = list_obj.find_mut(pid).ok_or(StoreError::NotFound(pid))?;
                parent_item.sub_items.push(item);
            }
            None => list_obj.items.push(item),
        }
        self.kinds.insert(id, ObjectClass::PossibilityItem);
        self.item_owner.insert(id, list);
        Ok(id)
    }

    /// Finds a possibility item anywhere in the store by id.
    #[must_use]
    pub fn find_item(&self, id: ObjectId) -> Option<&PossibilityItem> {
        let list = self.item_owner.get(&id)?;
        self.lists.get(list)?.find(id)
    }

    /// Mutable lookup of a possibility item by id.
    pub fn item_mut(&mut self, id: ObjectId) -> Option<&mut PossibilityItem> {
        let list = *self.item_owner.get(&id)?;
        self.lists.get_mut(&list)?.find_mut(id)
    }

    /// The list an item belongs to.
    #[must_use]
    pub fn item_list(&self, item: ObjectId) -> Option<ObjectId> {
        self.item_owner.get(&item).copied()
    }

    // ── Relation types ───────────────────────────────────────────────

    /// Registers a relation type.
    pub fn add_relation_type(&mut self, rt: RelationType) -> ObjectId {
        let id = rt.id;
        self.relation_types.insert(id, rt);
        id
    }

    /// Returns a relation type by id.
    #[must_use]
    pub fn relation_type(&self, id: ObjectId) -> Option<&RelationType> {
        self.relation_types.get(&id)
    }

    /// Finds a relation type whose forward or reverse name matches.
    #[must_use]
    pub fn find_relation_type(&self, name: &str) -> Option<&RelationType> {
        self.relation_types
            .values()
            .find(|rt| rt.name == name || rt.reverse_name.as_deref() == Some(name))
    }

    /// Iterates over all relation types.
    pub fn relation_types(&self) -> impl Iterator<Item = &RelationType> {
        self.relation_types.values()
    }

    // ── Relation groups ──────────────────────────────────────────────

    /// Persists a relation group.
    pub fn add_group(&mut self, group: RelationGroup) -> ObjectId {
        let id = group.id;
        self.kinds.insert(id, ObjectClass::RelationGroup);
        self.relation_groups.insert(id, group);
        id
    }

    /// Returns a group by id.
    #[must_use]
    pub fn group(&self, id: ObjectId) -> Option<&RelationGroup> {
        self.relation_groups.get(&id)
    }

    /// Mutable lookup of a group by id.
    pub fn group_mut(&mut self, id: ObjectId) -> Option<&mut RelationGroup> {
        self.relation_groups.get_mut(&id)
    }

    /// Removes a group.
    pub fn remove_group(&mut self, id: ObjectId) -> Option<RelationGroup> {
        self.kinds.remove(&id);
        self.relation_groups.remove(&id)
    }

    /// Iterates over all groups.
    pub fn groups(&self) -> impl Iterator<Item = &RelationGroup> {
        self.relation_groups.values()
    }

    /// All group ids, for passes that mutate while iterating.
    #[must_use]
    pub fn group_ids(&self) -> Vec<ObjectId> {
        self.relation_groups.keys().copied().collect()
    }

    /// Iterates over the groups of one relation type.
    pub fn groups_of_type(&self, ty: ObjectId) -> impl Iterator<Item = &RelationGroup> {
        self.relation_groups
            .values()
            .filter(move |g| g.relation_type == ty)
    }

    /// Number of persisted relation groups.
    #[must_use]
    pub fn group_count(&self) -> usize {
        self.relation_groups.len()
    }

    // ── Entry references ─────────────────────────────────────────────

    /// Persists an entry reference.
    pub fn add_entry_ref(&mut self, er: EntryReference) -> ObjectId {
        let id = er.id;
        self.kinds.insert(id, ObjectClass::EntryReference);
        self.entry_refs.insert(id, er);
        id
    }

    /// Returns an entry reference by id.
    #[must_use]
    pub fn entry_ref(&self, id: ObjectId) -> Option<&EntryReference> {
        self.entry_refs.get(&id)
    }

    /// Mutable lookup of an entry reference.
    pub fn entry_ref_mut(&mut self, id: ObjectId) -> Option<&mut EntryReference> {
        self.entry_refs.get_mut(&id)
    }

    /// Removes an entry reference.
    pub fn remove_entry_ref(&mut self, id: ObjectId) -> Option<EntryReference> {
        self.kinds.remove(&id);
        self.entry_refs.remove(&id)
    }

    /// Iterates over all entry references.
    pub fn entry_refs(&self) -> impl Iterator<Item = &EntryReference> {
        self.entry_refs.values()
    }

    /// All entry-reference ids, for passes that mutate while iterating.
    #[must_use]
    pub fn entry_ref_ids(&self) -> Vec<ObjectId> {
        self.entry_refs.keys().copied().collect()
    }

    /// Iterates over the references owned by an entry.
    pub fn refs_of(&self, owner: ObjectId) -> impl Iterator<Item = &EntryReference> {
        self.entry_refs.values().filter(move |r| r.owner == owner)
    }

    // ── Word analyses ────────────────────────────────────────────────

    /// Persists a word analysis.
    pub fn add_analysis(&mut self, wa: WordAnalysis) -> ObjectId {
        let id = wa.id;
        self.kinds.insert(id, ObjectClass::WordAnalysis);
        self.analyses.insert(id, wa);
        id
    }

    /// Returns a word analysis by id.
    #[must_use]
    pub fn analysis(&self, id: ObjectId) -> Option<&WordAnalysis> {
        self.analyses.get(&id)
    }

    /// Mutable lookup of a word analysis.
    pub fn analysis_mut(&mut self, id: ObjectId) -> Option<&mut WordAnalysis> {
        self.analyses.get_mut(&id)
    }

    /// Removes a word analysis.
    pub fn remove_analysis(&mut self, id: ObjectId) -> Option<WordAnalysis> {
        self.kinds.remove(&id);
        self.analyses.remove(&id)
    }

    /// Iterates over all word analyses.
    pub fn analyses(&self) -> impl Iterator<Item = &WordAnalysis> {
        self.analyses.values()
    }

    /// All analysis ids, for passes that mutate while iterating.
    #[must_use]
    pub fn analysis_ids(&self) -> Vec<ObjectId> {
        self.analyses.keys().copied().collect()
    }

    // ── Custom fields ────────────────────────────────────────────────

    /// Finds a custom field declaration by owning class and name.
    #[must_use]
    pub fn find_field(&self, class: ObjectClass, name: &str) -> Option<&CustomFieldDefinition> {
        self.custom_fields
            .iter()
            .find(|f| f.class == class && f.name == name)
    }

    /// Registers a custom field declaration.
    pub fn add_field(&mut self, def: CustomFieldDefinition) {
        debug!("declared custom field {:?} on {:?}", def.name, def.class);
        self.custom_fields.push(def);
    }

    /// Iterates over all custom field declarations.
    pub fn fields(&self) -> impl Iterator<Item = &CustomFieldDefinition> {
        self.custom_fields.iter()
    }

    // ── External id aliases ──────────────────────────────────────────

    /// Durably maps an external interchange id to an object, surviving past
    /// the import that saw it. Stale aliases are filtered by class at
    /// resolution time, so deletions need no cleanup here.
    pub fn add_alias(&mut self, external: impl Into<String>, id: ObjectId) {
        self.external_ids.insert(external.into(), id);
    }

    /// Looks up an external id recorded by any previous import.
    #[must_use]
    pub fn alias(&self, external: &str) -> Option<ObjectId> {
        self.external_ids.get(external).copied()
    }

    // ── Field length limits ──────────────────────────────────────────

    /// Declares a maximum stored length (in chars) for a field.
    pub fn set_field_limit(&mut self, field: impl Into<String>, max_chars: usize) {
        self.field_limits.insert(field.into(), max_chars);
    }

    /// The maximum stored length for a field, if limited.
    #[must_use]
    pub fn field_limit(&self, field: &str) -> Option<usize> {
        self.field_limits.get(field).copied()
    }

    // ── Writing systems ──────────────────────────────────────────────

    /// The writing-system registry.
    #[must_use]
    pub fn ws(&self) -> &WritingSystemRegistry {
        &self.writing_systems
    }

    /// Mutable access to the writing-system registry.
    pub fn ws_mut(&mut self) -> &mut WritingSystemRegistry {
        &mut self.writing_systems
    }
}
