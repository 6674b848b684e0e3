//! The central merger driving one import run.
//!
//! Owns all per-import state: the writing-system and identity resolvers, the
//! possibility synchronizer, the custom-field reconciler, the deferral
//! queue, and the diagnostics recorder. The external parser drives it
//! through [`ImportSink`]: ranges once, then one entry per callback, then
//! `finish` to resolve deferred relations, collect orphans, and produce the
//! report.

use crate::convert;
use crate::custom_fields::{CustomFieldReconciler, parse_class};
use crate::diagnostics::DiagnosticsRecorder;
use crate::error::{MergeError, MergeResult};
use crate::field_merge::{FieldConflict, FieldMerger, multitext_matches};
use crate::identity::{IdentityResolver, extract_embedded_guid};
use crate::input::{
    ImportSink, RangesDocument, RawEntry, RawEtymology, RawExample, RawField, RawFieldSpec,
    RawMultiText, RawNote, RawPronunciation, RawRelation, RawSense, RawTrait, RawVariant,
};
use crate::media::{MediaKind, copy_linked_file};
use crate::options::{ImportOptions, MergePolicy};
use crate::orphans;
use crate::pending::{PendingEntryReference, PendingRelation, RefTrait, parse_ref_trait};
use crate::possibility_sync::{PossibilitySynchronizer, find_or_create_item};
use crate::relation_resolve;
use crate::report::ImportReport;
use crate::ws_resolver::WsResolver;
use lexbank_model::{
    CustomFieldDefinition, CustomValue, Example, FieldKind, LexicalEntry, MorphoSyntaxAnalysis,
    MultiText, Note, ObjectClass, Pronunciation, RefKind, Residue, Sense, Variant,
};
use lexbank_store::{LexStore, StandardList, StoreError};
use lexbank_types::ObjectId;
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, info};

fn trait_fragment(t: &RawTrait) -> String {
    format!("<trait name=\"{}\" value=\"{}\"/>", t.name, t.value)
}

/// The lexicon merge engine.
///
/// Holds a mutable borrow of the store for the whole run; the engine assumes
/// exclusive access for its duration.
pub struct LexiconMerger<'a> {
    store: &'a mut LexStore,
    opts: ImportOptions,
    ws: WsResolver,
    ids: IdentityResolver,
    sync: PossibilitySynchronizer,
    fields: CustomFieldReconciler,
    queue: crate::pending::DeferralQueue,
    diags: DiagnosticsRecorder,
    /// Entries matched or created by this run.
    touched: HashSet<ObjectId>,
    /// Suppressed while building a keep-both duplicate so its ids do not
    /// shadow the original's in the id table.
    register_ids: bool,
    entries_created: usize,
    entries_merged: usize,
    entries_deleted: usize,
    cancelled: bool,
    finished: bool,
}

impl<'a> LexiconMerger<'a> {
    /// Creates a merger over a store.
    pub fn new(store: &'a mut LexStore, opts: ImportOptions) -> Self {
        Self {
            store,
            opts,
            ws: WsResolver::new(),
            ids: IdentityResolver::new(),
            sync: PossibilitySynchronizer::new(),
            fields: CustomFieldReconciler::new(),
            queue: crate::pending::DeferralQueue::new(),
            diags: DiagnosticsRecorder::new(),
            touched: HashSet::new(),
            register_ids: true,
            entries_created: 0,
            entries_merged: 0,
            entries_deleted: 0,
            cancelled: false,
            finished: false,
        }
    }

    /// The diagnostics recorded so far.
    #[must_use]
    pub fn diagnostics(&self) -> &DiagnosticsRecorder {
        &self.diags
    }

    /// True once the cancellation flag stopped the run.
    #[must_use]
    pub fn was_cancelled(&self) -> bool {
        self.cancelled
    }

    // ── Entry merge ──────────────────────────────────────────────────

    fn merge_entry(&mut self, raw: &RawEntry) -> MergeResult<()> {
        let existing =
            self.ids
                .resolve_object(self.store, ObjectClass::Entry, raw.guid, raw.id.as_deref());
        match existing {
            Some(id) => self.merge_into_existing(id, raw),
            None => self.create_entry(raw, true).map(|_| ()),
        }
    }

    fn create_entry(&mut self, raw: &RawEntry, register: bool) -> MergeResult<ObjectId> {
        let mut entry = LexicalEntry::new();
        if register && let Some(guid) = raw.guid {
            let explicit = ObjectId::from_uuid(guid);
            if !self.store.contains(explicit) {
                entry.id = explicit;
            }
        }
        let fm = FieldMerger::new(self.opts.policy, true);
        self.apply_entry_fields(&mut entry, raw, fm, register)?;
        let id = entry.id;
        self.store.put_entry(entry);
        if register {
            self.ids.register_record(raw.guid, raw.id.as_deref(), id);
            if let Some(free) = raw.id.as_deref() {
                self.store.add_alias(free, id);
            }
        }
        self.touched.insert(id);
        self.entries_created += 1;
        debug!("created entry {id}");
        Ok(id)
    }

    fn merge_into_existing(&mut self, id: ObjectId, raw: &RawEntry) -> MergeResult<()> {
        let mut entry = self
            .store
            .entry(id)
            .cloned()
            .ok_or(MergeError::Store(StoreError::NotFound(id)))?;
        let fm = FieldMerger::new(self.opts.policy, false);
        let conflicts = self.apply_entry_fields(&mut entry, raw, fm, true)?;
        self.store.put_entry(entry);
        self.ids.register_record(raw.guid, raw.id.as_deref(), id);
        if let Some(free) = raw.id.as_deref() {
            self.store.add_alias(free, id);
        }
        self.touched.insert(id);
        self.entries_merged += 1;
        debug!("merged entry {id}");

        if self.opts.policy == MergePolicy::KeepBoth && !conflicts.is_empty() {
            // the incoming values land on a sibling duplicate instead
            self.register_ids = false;
            let duplicate = self.create_entry(raw, false)?;
            self.register_ids = true;
            for c in conflicts {
                let ws_tag = c
                    .ws
                    .and_then(|ws| self.store.ws().tag(ws))
                    .map(str::to_string);
                self.diags
                    .conflict(id, duplicate, c.field, ws_tag, c.existing, c.incoming);
            }
        }
        Ok(())
    }

    fn apply_entry_fields(
        &mut self,
        entry: &mut LexicalEntry,
        raw: &RawEntry,
        fm: FieldMerger,
        queue_relations: bool,
    ) -> MergeResult<Vec<FieldConflict>> {
        let mut conflicts = Vec::new();

        let lexeme = convert::multitext(self.store, &mut self.ws, &raw.lexical_unit);
        conflicts.extend(fm.merge_multitext(
            self.store,
            entry.id,
            "lexeme-form",
            &mut entry.lexeme_form,
            &lexeme,
            &mut self.diags,
        ));
        let citation = convert::multitext(self.store, &mut self.ws, &raw.citation);
        conflicts.extend(fm.merge_multitext(
            self.store,
            entry.id,
            "citation-form",
            &mut entry.citation_form,
            &citation,
            &mut self.diags,
        ));
        fm.merge_date(&mut entry.date_created, raw.date_created);
        fm.merge_date(&mut entry.date_modified, raw.date_modified);

        for t in &raw.traits {
            match t.name.as_str() {
                "morph-type" => {
                    let list = self.store.standard_list_id(StandardList::MorphTypes);
                    let item = find_or_create_item(
                        self.store,
                        &mut self.ids,
                        &mut self.diags,
                        list,
                        &t.value,
                    );
                    fm.merge_opt_ref(&mut entry.morph_type, Some(item));
                }
                _ => entry.residue.push(trait_fragment(t)),
            }
        }

        let mut senses = std::mem::take(&mut entry.senses);
        self.merge_sense_list(entry, &mut senses, &raw.senses, fm, &mut conflicts)?;
        entry.senses = senses;

        self.merge_variants(entry, &raw.variants, fm, &mut conflicts);
        self.merge_pronunciations(entry, &raw.pronunciations, fm, &mut conflicts);
        self.merge_etymologies(entry, &raw.etymologies, fm, &mut conflicts);
        let entry_id = entry.id;
        self.merge_notes(entry_id, &mut entry.notes, &raw.notes, fm, &mut conflicts);
        self.merge_custom_fields(
            ObjectClass::Entry,
            entry_id,
            &mut entry.custom,
            &raw.fields,
            fm,
            &mut conflicts,
        );

        if queue_relations {
            for rel in &raw.relations {
                self.queue_relation(entry.id, rel, &mut entry.residue);
            }
        }
        for u in &raw.unknown {
            entry.residue.push(u.clone());
        }
        self.copy_span_links(entry);
        Ok(conflicts)
    }

    /// Copies files referenced by relative span hyperlinks into the
    /// linked-files area. Absolute URLs are left alone.
    fn copy_span_links(&mut self, entry: &LexicalEntry) {
        let mut links: Vec<String> = Vec::new();
        let mut collect = |mt: &MultiText| {
            for (_, form) in mt.iter() {
                for span in &form.spans {
                    if let Some(href) = &span.href
                        && !href.contains("://")
                        && !links.contains(href)
                    {
                        links.push(href.clone());
                    }
                }
            }
        };
        collect(&entry.lexeme_form);
        collect(&entry.citation_form);
        entry.walk_senses(&mut |s| {
            collect(&s.gloss);
            collect(&s.definition);
        });
        self.copy_media(&links, MediaKind::Others);
    }

    // ── Senses ───────────────────────────────────────────────────────

    fn merge_sense_list(
        &mut self,
        entry: &mut LexicalEntry,
        list: &mut Vec<Sense>,
        raws: &[RawSense],
        fm: FieldMerger,
        conflicts: &mut Vec<FieldConflict>,
    ) -> MergeResult<()> {
        for raw in raws {
            let known = raw.id.as_deref().and_then(|free| {
                self.ids
                    .lookup(free)
                    .or_else(|| self.store.alias(free))
                    .or_else(|| extract_embedded_guid(free).map(ObjectId::from_uuid))
            });
            let idx = known.and_then(|sid| list.iter().position(|s| s.id == sid));
            match idx {
                Some(i) => {
                    let mut sense = list[i].clone();
                    self.apply_sense_fields(entry, &mut sense, raw, fm, conflicts)?;
                    if self.register_ids && let Some(free) = raw.id.as_deref() {
                        self.ids.register(free, sense.id);
                        self.store.add_alias(free, sense.id);
                    }
                    list[i] = sense;
                }
                None => {
                    let mut sense = Sense::new();
                    if let Some(explicit) = known
                        && !self.store.contains(explicit)
                        && !list.iter().any(|s| s.id == explicit)
                    {
                        sense.id = explicit;
                    }
                    let created = FieldMerger::new(fm.policy(), true);
                    self.apply_sense_fields(entry, &mut sense, raw, created, conflicts)?;
                    if self.register_ids && let Some(free) = raw.id.as_deref() {
                        self.ids.register(free, sense.id);
                        self.store.add_alias(free, sense.id);
                    }
                    list.push(sense);
                }
            }
        }
        Ok(())
    }

    fn apply_sense_fields(
        &mut self,
        entry: &mut LexicalEntry,
        sense: &mut Sense,
        raw: &RawSense,
        fm: FieldMerger,
        conflicts: &mut Vec<FieldConflict>,
    ) -> MergeResult<()> {
        let gloss = convert::multitext(self.store, &mut self.ws, &raw.gloss);
        conflicts.extend(fm.merge_multitext(
            self.store,
            sense.id,
            "gloss",
            &mut sense.gloss,
            &gloss,
            &mut self.diags,
        ));
        let definition = convert::multitext(self.store, &mut self.ws, &raw.definition);
        conflicts.extend(fm.merge_multitext(
            self.store,
            sense.id,
            "definition",
            &mut sense.definition,
            &definition,
            &mut self.diags,
        ));

        if let Some(gi) = raw.grammatical_info.as_deref().filter(|s| !s.is_empty()) {
            let list = self.store.standard_list_id(StandardList::PartsOfSpeech);
            let pos = find_or_create_item(self.store, &mut self.ids, &mut self.diags, list, gi);
            let msa_id = match entry.msas.iter().find(|m| m.part_of_speech == Some(pos)) {
                Some(m) => m.id,
                None => {
                    let msa = MorphoSyntaxAnalysis::new(Some(pos));
                    let id = msa.id;
                    entry.msas.push(msa);
                    id
                }
            };
            fm.merge_opt_ref(&mut sense.msa, Some(msa_id));
        }

        if !raw.semantic_domains.is_empty() || fm.policy() == MergePolicy::KeepOnlyNew {
            let list = self.store.standard_list_id(StandardList::SemanticDomains);
            let items = self.item_refs(list, &raw.semantic_domains);
            fm.merge_refs(&mut sense.semantic_domains, &items);
        }
        if !raw.usage_types.is_empty() || fm.policy() == MergePolicy::KeepOnlyNew {
            let list = self.store.standard_list_id(StandardList::UsageTypes);
            let items = self.item_refs(list, &raw.usage_types);
            fm.merge_refs(&mut sense.usage_types, &items);
        }

        self.merge_examples(sense, &raw.examples, fm, conflicts);
        let sense_id = sense.id;
        self.merge_notes(sense_id, &mut sense.notes, &raw.notes, fm, conflicts);
        self.merge_custom_fields(
            ObjectClass::Sense,
            sense_id,
            &mut sense.custom,
            &raw.fields,
            fm,
            conflicts,
        );

        for rel in &raw.relations {
            self.queue_relation(sense.id, rel, &mut sense.residue);
        }
        for t in &raw.traits {
            sense.residue.push(trait_fragment(t));
        }
        for u in &raw.unknown {
            sense.residue.push(u.clone());
        }

        let mut subs = std::mem::take(&mut sense.subsenses);
        self.merge_sense_list(entry, &mut subs, &raw.subsenses, fm, conflicts)?;
        sense.subsenses = subs;
        Ok(())
    }

    fn item_refs(&mut self, list: ObjectId, labels: &[String]) -> Vec<ObjectId> {
        let mut out = Vec::new();
        for label in labels {
            if label.is_empty() {
                continue;
            }
            let id = find_or_create_item(self.store, &mut self.ids, &mut self.diags, list, label);
            if !out.contains(&id) {
                out.push(id);
            }
        }
        out
    }

    fn merge_examples(
        &mut self,
        sense: &mut Sense,
        raws: &[RawExample],
        fm: FieldMerger,
        conflicts: &mut Vec<FieldConflict>,
    ) {
        let mut matched: Vec<ObjectId> = Vec::new();
        for raw in raws {
            let text = convert::multitext(self.store, &mut self.ws, &raw.text);
            let translation = convert::multitext(self.store, &mut self.ws, &raw.translation);
            let idx = raw
                .id
                .as_deref()
                .and_then(extract_embedded_guid)
                .map(ObjectId::from_uuid)
                .and_then(|eid| sense.examples.iter().position(|e| e.id == eid))
                .or_else(|| {
                    sense
                        .examples
                        .iter()
                        .position(|e| multitext_matches(&e.text, &text))
                });
            match idx {
                Some(i) => {
                    let example_id = sense.examples[i].id;
                    let example = &mut sense.examples[i];
                    conflicts.extend(fm.merge_multitext(
                        self.store,
                        example_id,
                        "example",
                        &mut example.text,
                        &text,
                        &mut self.diags,
                    ));
                    conflicts.extend(fm.merge_multitext(
                        self.store,
                        example_id,
                        "example-translation",
                        &mut example.translation,
                        &translation,
                        &mut self.diags,
                    ));
                    if let Some(c) =
                        fm.merge_string("example-source", &mut example.source, raw.source.as_deref())
                    {
                        conflicts.push(c);
                    }
                    for u in &raw.unknown {
                        example.residue.push(u.clone());
                    }
                    matched.push(example_id);
                }
                None => {
                    let mut example = Example::new();
                    if let Some(explicit) = raw
                        .id
                        .as_deref()
                        .and_then(extract_embedded_guid)
                        .map(ObjectId::from_uuid)
                        && !self.store.contains(explicit)
                    {
                        example.id = explicit;
                    }
                    example.text = text;
                    example.translation = translation;
                    example.source = raw.source.clone().filter(|s| !s.is_empty());
                    for u in &raw.unknown {
                        example.residue.push(u.clone());
                    }
                    matched.push(example.id);
                    sense.examples.push(example);
                }
            }
        }
        // a keep-only-new pass keeps only the examples the input declares
        if fm.policy() == MergePolicy::KeepOnlyNew {
            sense.examples.retain(|e| matched.contains(&e.id));
        }
    }

    fn merge_notes(
        &mut self,
        owner: ObjectId,
        notes: &mut Vec<Note>,
        raws: &[RawNote],
        fm: FieldMerger,
        conflicts: &mut Vec<FieldConflict>,
    ) {
        for raw in raws {
            let content = convert::multitext(self.store, &mut self.ws, &raw.content);
            match notes.iter_mut().find(|n| n.kind == raw.kind) {
                Some(note) => {
                    conflicts.extend(fm.merge_multitext(
                        self.store,
                        owner,
                        "note",
                        &mut note.content,
                        &content,
                        &mut self.diags,
                    ));
                }
                None => notes.push(Note {
                    kind: raw.kind.clone(),
                    content,
                }),
            }
        }
    }

    // ── Owned entry collections ──────────────────────────────────────

    fn merge_variants(
        &mut self,
        entry: &mut LexicalEntry,
        raws: &[RawVariant],
        fm: FieldMerger,
        conflicts: &mut Vec<FieldConflict>,
    ) {
        for raw in raws {
            let form = convert::multitext(self.store, &mut self.ws, &raw.form);
            let list = self.store.standard_list_id(StandardList::VariantTypes);
            let mut types = Vec::new();
            let mut residue = Residue::new();
            for t in &raw.traits {
                if t.name == "variant-type" {
                    let id = find_or_create_item(
                        self.store,
                        &mut self.ids,
                        &mut self.diags,
                        list,
                        &t.value,
                    );
                    if !types.contains(&id) {
                        types.push(id);
                    }
                } else {
                    residue.push(trait_fragment(t));
                }
            }
            let entry_id = entry.id;
            let idx = entry
                .variants
                .iter()
                .position(|v| multitext_matches(&v.form, &form));
            match idx {
                Some(i) => {
                    let variant = &mut entry.variants[i];
                    conflicts.extend(fm.merge_multitext(
                        self.store,
                        entry_id,
                        "variant-form",
                        &mut variant.form,
                        &form,
                        &mut self.diags,
                    ));
                    fm.merge_refs(&mut variant.variant_types, &types);
                    for r in residue.iter() {
                        variant.residue.push(r);
                    }
                    for u in &raw.unknown {
                        variant.residue.push(u.clone());
                    }
                }
                None => {
                    let mut variant = Variant {
                        form,
                        variant_types: types,
                        residue,
                    };
                    for u in &raw.unknown {
                        variant.residue.push(u.clone());
                    }
                    entry.variants.push(variant);
                }
            }
        }
    }

    fn merge_pronunciations(
        &mut self,
        entry: &mut LexicalEntry,
        raws: &[RawPronunciation],
        fm: FieldMerger,
        conflicts: &mut Vec<FieldConflict>,
    ) {
        for raw in raws {
            let form = convert::multitext(self.store, &mut self.ws, &raw.form);
            self.copy_media(&raw.media, MediaKind::AudioVisual);
            let entry_id = entry.id;
            let idx = entry
                .pronunciations
                .iter()
                .position(|p| multitext_matches(&p.form, &form));
            match idx {
                Some(i) => {
                    let pron = &mut entry.pronunciations[i];
                    conflicts.extend(fm.merge_multitext(
                        self.store,
                        entry_id,
                        "pronunciation",
                        &mut pron.form,
                        &form,
                        &mut self.diags,
                    ));
                    for m in &raw.media {
                        if !pron.media.contains(m) {
                            pron.media.push(m.clone());
                        }
                    }
                    for u in &raw.unknown {
                        pron.residue.push(u.clone());
                    }
                }
                None => {
                    let mut pron = Pronunciation {
                        form,
                        media: raw.media.clone(),
                        residue: Residue::new(),
                    };
                    for u in &raw.unknown {
                        pron.residue.push(u.clone());
                    }
                    entry.pronunciations.push(pron);
                }
            }
        }
    }

    fn merge_etymologies(
        &mut self,
        entry: &mut LexicalEntry,
        raws: &[RawEtymology],
        fm: FieldMerger,
        conflicts: &mut Vec<FieldConflict>,
    ) {
        for raw in raws {
            let form = convert::multitext(self.store, &mut self.ws, &raw.form);
            let gloss = convert::multitext(self.store, &mut self.ws, &raw.gloss);
            let entry_id = entry.id;
            let idx = entry
                .etymologies
                .iter()
                .position(|e| e.kind == raw.kind && multitext_matches(&e.form, &form));
            match idx {
                Some(i) => {
                    let ety = &mut entry.etymologies[i];
                    conflicts.extend(fm.merge_multitext(
                        self.store,
                        entry_id,
                        "etymology-form",
                        &mut ety.form,
                        &form,
                        &mut self.diags,
                    ));
                    conflicts.extend(fm.merge_multitext(
                        self.store,
                        entry_id,
                        "etymology-gloss",
                        &mut ety.gloss,
                        &gloss,
                        &mut self.diags,
                    ));
                    if let Some(c) =
                        fm.merge_string("etymology-source", &mut ety.source, raw.source.as_deref())
                    {
                        conflicts.push(c);
                    }
                    for u in &raw.unknown {
                        ety.residue.push(u.clone());
                    }
                }
                None => {
                    let mut ety = lexbank_model::Etymology {
                        kind: raw.kind.clone(),
                        source: raw.source.clone().filter(|s| !s.is_empty()),
                        form,
                        gloss,
                        residue: Residue::new(),
                    };
                    for u in &raw.unknown {
                        ety.residue.push(u.clone());
                    }
                    entry.etymologies.push(ety);
                }
            }
        }
    }

    fn copy_media(&mut self, paths: &[String], kind: MediaKind) {
        let (Some(src), Some(dst)) = (
            self.opts.source_root.as_deref(),
            self.opts.linked_files_root.as_deref(),
        ) else {
            return;
        };
        for path in paths {
            if let Err(e) = copy_linked_file(src, dst, kind, path) {
                self.diags.error(format!("failed to copy {path:?}: {e}"));
            }
        }
    }

    // ── Custom fields ────────────────────────────────────────────────

    fn merge_custom_fields(
        &mut self,
        class: ObjectClass,
        owner: ObjectId,
        custom: &mut BTreeMap<String, CustomValue>,
        raws: &[RawField],
        fm: FieldMerger,
        conflicts: &mut Vec<FieldConflict>,
    ) {
        for f in raws {
            let Some(def) = self
                .fields
                .reconcile(self.store, &f.kind, class, None, &mut self.diags)
            else {
                continue;
            };
            let Some(value) = self.custom_value(owner, &def, &f.content) else {
                continue;
            };
            match custom.get(&def.name) {
                None => {
                    custom.insert(def.name.clone(), value);
                }
                Some(old) if *old == value => {}
                Some(old) => match fm.policy() {
                    MergePolicy::KeepOld => {}
                    MergePolicy::KeepNew | MergePolicy::KeepOnlyNew => {
                        custom.insert(def.name.clone(), value);
                    }
                    MergePolicy::KeepBoth => conflicts.push(FieldConflict {
                        field: def.name.clone(),
                        ws: None,
                        existing: format!("{old:?}"),
                        incoming: format!("{value:?}"),
                    }),
                },
            }
        }
    }

    fn custom_value(
        &mut self,
        owner: ObjectId,
        def: &CustomFieldDefinition,
        content: &RawMultiText,
    ) -> Option<CustomValue> {
        match def.kind {
            FieldKind::String => content.forms.first().map(|(lang, t)| {
                let ws = self.ws.resolve(self.store, lang);
                CustomValue::Text {
                    ws,
                    text: t.text.clone(),
                }
            }),
            FieldKind::MultiUnicode | FieldKind::MultiString => Some(CustomValue::MultiText(
                convert::multitext(self.store, &mut self.ws, content),
            )),
            FieldKind::Integer => {
                let text = content
                    .forms
                    .first()
                    .map(|(_, t)| t.text.as_str())
                    .unwrap_or_default();
                match text.trim().parse::<i64>() {
                    Ok(n) => Some(CustomValue::Integer(n)),
                    Err(_) => {
                        self.diags.invalid_data(
                            Some(owner),
                            format!("custom field {:?}", def.name),
                            format!("not an integer: {text:?}"),
                        );
                        None
                    }
                }
            }
            FieldKind::GenDate => content
                .forms
                .first()
                .map(|(_, t)| t.text.trim().to_string())
                .filter(|s| !s.is_empty())
                .map(CustomValue::GenDate),
            FieldKind::ReferenceAtomic
            | FieldKind::ReferenceCollection
            | FieldKind::ReferenceSequence => {
                let Some(list) = def.target_list else {
                    self.diags.invalid_data(
                        Some(owner),
                        format!("custom field {:?}", def.name),
                        "reference field without a target list",
                    );
                    return None;
                };
                let mut items = Vec::new();
                for (_, t) in &content.forms {
                    if t.text.is_empty() {
                        continue;
                    }
                    let id = find_or_create_item(
                        self.store,
                        &mut self.ids,
                        &mut self.diags,
                        list,
                        &t.text,
                    );
                    if !items.contains(&id) {
                        items.push(id);
                    }
                }
                if def.kind == FieldKind::ReferenceAtomic {
                    items.first().copied().map(CustomValue::Reference)
                } else {
                    Some(CustomValue::References(items))
                }
            }
            FieldKind::Binary
            | FieldKind::Image
            | FieldKind::OwningCollection
            | FieldKind::OwningSequence => None,
        }
    }

    // ── Relations ────────────────────────────────────────────────────

    fn queue_relation(&mut self, owner: ObjectId, rel: &RawRelation, residue: &mut Residue) {
        if rel.ref_id.is_empty() {
            self.diags.invalid_data(
                Some(owner),
                "relation",
                format!("relation {:?} with an empty target", rel.type_name),
            );
            return;
        }
        if rel.type_name == "_component-lexeme" {
            let mut complex_form_types = Vec::new();
            let mut variant_types = Vec::new();
            let mut is_primary = false;
            let mut hide_minor_entry = false;
            for t in &rel.traits {
                match parse_ref_trait(t) {
                    RefTrait::ComplexFormType(v) => complex_form_types.push(v),
                    RefTrait::VariantType(v) => variant_types.push(v),
                    RefTrait::IsPrimary(b) => is_primary = b,
                    RefTrait::HideMinorEntry(b) => hide_minor_entry = b,
                    RefTrait::Unrecognized { name, value } => {
                        residue.push(trait_fragment(&RawTrait::new(name, value)));
                    }
                }
            }
            let kind = if !variant_types.is_empty() && complex_form_types.is_empty() {
                RefKind::Variant
            } else {
                RefKind::ComplexForm
            };
            self.queue.push_entry_ref(PendingEntryReference {
                owner,
                kind,
                ref_id: rel.ref_id.clone(),
                order: rel.order,
                complex_form_types,
                variant_types,
                is_primary,
                hide_minor_entry,
                fragment: rel.to_fragment(),
            });
        } else {
            let usage = convert::multitext(self.store, &mut self.ws, &rel.usage);
            for t in &rel.traits {
                residue.push(trait_fragment(t));
            }
            self.queue.push_relation(PendingRelation {
                owner,
                type_name: rel.type_name.clone(),
                ref_id: rel.ref_id.clone(),
                order: rel.order,
                usage,
                date_created: rel.date_created,
                date_modified: rel.date_modified,
                fragment: rel.to_fragment(),
            });
        }
    }
}

impl ImportSink for LexiconMerger<'_> {
    fn ranges(&mut self, doc: &RangesDocument) -> MergeResult<()> {
        self.sync
            .sync(self.store, &mut self.ws, &mut self.ids, &mut self.diags, doc)
    }

    fn field_specs(&mut self, specs: &[RawFieldSpec]) -> MergeResult<()> {
        for spec in specs {
            let class = spec
                .class
                .as_deref()
                .and_then(parse_class)
                .unwrap_or(ObjectClass::Entry);
            self.fields.reconcile(
                self.store,
                &spec.name,
                class,
                spec.spec.as_deref(),
                &mut self.diags,
            );
        }
        Ok(())
    }

    fn entry(&mut self, entry: RawEntry) -> MergeResult<()> {
        if self.finished {
            return Err(MergeError::Format("entry after finish".to_string()));
        }
        // checked only between whole-object merges; an in-progress merge
        // always completes
        if self.cancelled || self.opts.is_cancelled() {
            self.cancelled = true;
            return Ok(());
        }
        self.merge_entry(&entry)
    }

    fn finish(&mut self) -> MergeResult<ImportReport> {
        if self.finished {
            return Err(MergeError::Format("finish called twice".to_string()));
        }
        self.finished = true;
        let queue = std::mem::take(&mut self.queue);
        relation_resolve::resolve_all(self.store, &mut self.ids, queue, &mut self.diags);
        if self.opts.policy.collects_orphans() && !self.cancelled {
            let stats = orphans::collect(self.store, &self.touched, self.opts.fixpoint_orphans);
            self.entries_deleted = stats.entries_deleted;
        }
        info!(
            "import finished: {} created, {} merged, {} deleted",
            self.entries_created, self.entries_merged, self.entries_deleted
        );
        Ok(ImportReport::build(
            &self.diags,
            self.opts.policy,
            self.entries_created,
            self.entries_merged,
            self.entries_deleted,
        ))
    }
}

/// Drives a whole import as one logical transaction.
///
/// The store is snapshotted before any mutation; a fatal error restores it,
/// so a failed import leaves no partially-applied effect behind.
pub fn run_import(
    store: &mut LexStore,
    opts: ImportOptions,
    ranges: &RangesDocument,
    field_specs: &[RawFieldSpec],
    entries: Vec<RawEntry>,
) -> MergeResult<ImportReport> {
    let snapshot = store.clone();
    let result: MergeResult<ImportReport> = {
        let mut merger = LexiconMerger::new(store, opts);
        (|| {
            merger.ranges(ranges)?;
            merger.field_specs(field_specs)?;
            for e in entries {
                merger.entry(e)?;
            }
            merger.finish()
        })()
    };
    match result {
        Ok(report) => Ok(report),
        Err(e) => {
            *store = snapshot;
            Err(e)
        }
    }
}
