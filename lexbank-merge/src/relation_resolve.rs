//! The relation resolver post-pass.
//!
//! Drains the deferral queue after the stream ends, when every object the
//! file declares has been seen. Each pending record is resolved and folded
//! into a persisted relation group according to its mapping kind; records
//! whose target never appeared become residue on their owner plus an
//! invalid-relation diagnostic. Nothing in this pass aborts the import.

use crate::diagnostics::DiagnosticsRecorder;
use crate::identity::{IdentityResolver, extract_embedded_guid};
use crate::pending::{DeferralQueue, PendingEntryReference, PendingRelation};
use lexbank_model::{
    EntryReference, MappingKind, MultiText, ObjectClass, RefKind, RelationGroup, RelationType,
};
use lexbank_store::{LexStore, StandardList};
use lexbank_types::ObjectId;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Resolves every deferred relation and entry reference.
pub fn resolve_all(
    store: &mut LexStore,
    ids: &mut IdentityResolver,
    queue: DeferralQueue,
    diags: &mut DiagnosticsRecorder,
) {
    let (relations, entry_refs) = queue.drain();
    debug!(
        "resolving {} pending relations, {} pending entry references",
        relations.len(),
        entry_refs.len()
    );
    resolve_relations(store, ids, relations, diags);
    resolve_entry_refs(store, ids, entry_refs, diags);
}

/// Resolves a raw target id: first via the per-import id table, then via the
/// store's durable alias table, then via an embedded canonical identifier.
/// The alias step lets a relation point at an entry imported by an earlier
/// run without the current file re-declaring it.
fn resolve_target(store: &LexStore, ids: &IdentityResolver, ref_id: &str) -> Option<ObjectId> {
    ids.lookup(ref_id)
        .filter(|id| store.contains(*id))
        .or_else(|| store.alias(ref_id).filter(|id| store.contains(*id)))
        .or_else(|| {
            extract_embedded_guid(ref_id)
                .map(ObjectId::from_uuid)
                .filter(|id| store.contains(*id))
        })
}

/// Finds the relation type for a declared name, creating a collection-kind
/// type when the ranges document never declared it.
fn type_for(store: &mut LexStore, name: &str) -> RelationType {
    if let Some(rt) = store.find_relation_type(name) {
        return rt.clone();
    }
    warn!("relation type {name:?} was never declared; defaulting to collection");
    let rt = RelationType::new(name, MappingKind::Collection);
    let clone = rt.clone();
    store.add_relation_type(rt);
    clone
}

fn invalid(
    store: &mut LexStore,
    diags: &mut DiagnosticsRecorder,
    owner: ObjectId,
    type_name: &str,
    ref_id: &str,
    fragment: &str,
) {
    diags.invalid_relation(owner, type_name, ref_id);
    push_residue(store, owner, fragment);
}

/// Preserves a dropped record's verbatim form on its owning entry or sense.
fn push_residue(store: &mut LexStore, owner: ObjectId, fragment: &str) {
    match store.object_class(owner) {
        Some(ObjectClass::Entry) => {
            if let Some(entry) = store.entry_mut(owner) {
                entry.residue.push(fragment);
            }
        }
        Some(ObjectClass::Sense) => {
            if let Some(entry_id) = store.sense_owner(owner)
                && let Some(entry) = store.entry_mut(entry_id)
                && let Some(sense) = entry.find_sense_mut(owner)
            {
                sense.residue.push(fragment);
            }
        }
        _ => {}
    }
}

fn resolve_relations(
    store: &mut LexStore,
    ids: &mut IdentityResolver,
    relations: Vec<PendingRelation>,
    diags: &mut DiagnosticsRecorder,
) {
    // collections are clustered across the whole run, independent of
    // declaration order; everything else resolves in stream order
    let mut collections: HashMap<ObjectId, (String, Vec<PendingRelation>)> = HashMap::new();
    let mut collection_order: Vec<ObjectId> = Vec::new();
    let mut tree_retry: Vec<(RelationType, PendingRelation)> = Vec::new();

    let mut i = 0;
    while i < relations.len() {
        let p = &relations[i];
        let rt = type_for(store, &p.type_name);
        match rt.mapping {
            MappingKind::Pair | MappingKind::AsymmetricPair => {
                resolve_pair(store, ids, &rt, p, diags);
                i += 1;
            }
            MappingKind::Collection => {
                if !collections.contains_key(&rt.id) {
                    collection_order.push(rt.id);
                }
                collections
                    .entry(rt.id)
                    .or_insert_with(|| (rt.name.clone(), Vec::new()))
                    .1
                    .push(p.clone());
                i += 1;
            }
            MappingKind::Sequence => {
                i = resolve_sequence_run(store, ids, &rt, &relations, i, diags);
            }
            MappingKind::Tree => {
                if p.type_name == rt.name {
                    match resolve_target(store, ids, &p.ref_id) {
                        Some(target) => attach_tree_member(store, rt.id, p.owner, target),
                        None => invalid(store, diags, p.owner, &p.type_name, &p.ref_id, &p.fragment),
                    }
                } else {
                    // declared through the reverse name: the root is the
                    // target, which may not have been visited yet
                    tree_retry.push((rt.clone(), p.clone()));
                }
                i += 1;
            }
        }
    }

    for ty in collection_order {
        let (type_name, pendings) = collections.remove(&ty).expect("bucketed above");
        resolve_collection_clusters(store, ids, ty, &type_name, pendings, diags);
    }

    for (rt, p) in tree_retry {
        match resolve_target(store, ids, &p.ref_id) {
            Some(root) => attach_tree_member(store, rt.id, root, p.owner),
            None => invalid(store, diags, p.owner, &p.type_name, &p.ref_id, &p.fragment),
        }
    }
}

fn resolve_pair(
    store: &mut LexStore,
    ids: &IdentityResolver,
    rt: &RelationType,
    p: &PendingRelation,
    diags: &mut DiagnosticsRecorder,
) {
    let Some(target) = resolve_target(store, ids, &p.ref_id) else {
        invalid(store, diags, p.owner, &p.type_name, &p.ref_id, &p.fragment);
        return;
    };
    let asymmetric = rt.mapping == MappingKind::AsymmetricPair;
    // the forward name declares owner-first; the reverse name flips the pair
    let members = if asymmetric && rt.reverse_name.as_deref() == Some(p.type_name.as_str()) {
        vec![target, p.owner]
    } else {
        vec![p.owner, target]
    };
    let duplicate = store.groups_of_type(rt.id).any(|g| {
        if asymmetric {
            g.same_ordered(&members)
        } else {
            g.same_unordered(&members)
        }
    });
    if duplicate {
        return;
    }
    let mut group = RelationGroup::new(rt.id, members);
    apply_usage(&mut group, target, &p.usage);
    store.add_group(group);
}

/// Consumes a run of consecutive sequence records sharing owner, type, and
/// stamps, ending when the declared order resets or decreases. Returns the
/// index past the run.
fn resolve_sequence_run(
    store: &mut LexStore,
    ids: &IdentityResolver,
    rt: &RelationType,
    relations: &[PendingRelation],
    start: usize,
    diags: &mut DiagnosticsRecorder,
) -> usize {
    let first = &relations[start];
    let mut members: Vec<ObjectId> = Vec::new();
    let mut usages: Vec<(ObjectId, MultiText)> = Vec::new();
    let mut last_order: Option<i32> = None;
    let mut i = start;
    while i < relations.len() {
        let q = &relations[i];
        if q.type_name != first.type_name
            || q.owner != first.owner
            || q.date_created != first.date_created
            || q.date_modified != first.date_modified
        {
            break;
        }
        if let (Some(last), Some(order)) = (last_order, q.order)
            && order <= last
        {
            break;
        }
        match resolve_target(store, ids, &q.ref_id) {
            Some(target) => {
                if !members.contains(&target) {
                    members.push(target);
                }
                if !q.usage.is_empty() {
                    usages.push((target, q.usage.clone()));
                }
            }
            None => invalid(store, diags, q.owner, &q.type_name, &q.ref_id, &q.fragment),
        }
        last_order = q.order;
        i += 1;
    }
    if members.len() >= 2 {
        let exists = store.groups_of_type(rt.id).any(|g| g.same_ordered(&members));
        if !exists {
            let mut group = RelationGroup::new(rt.id, members);
            for (target, usage) in usages {
                apply_usage(&mut group, target, &usage);
            }
            store.add_group(group);
        }
    }
    i
}

/// Clusters collection records by transitive shared-endpoint overlap and
/// persists one group per cluster, unioning into an existing group that
/// shares any member.
fn resolve_collection_clusters(
    store: &mut LexStore,
    ids: &IdentityResolver,
    ty: ObjectId,
    type_name: &str,
    pendings: Vec<PendingRelation>,
    diags: &mut DiagnosticsRecorder,
) {
    let mut edges: Vec<(ObjectId, ObjectId)> = Vec::new();
    let mut usages: HashMap<ObjectId, MultiText> = HashMap::new();
    for p in &pendings {
        match resolve_target(store, ids, &p.ref_id) {
            Some(target) => {
                edges.push((p.owner, target));
                if !p.usage.is_empty() {
                    usages.entry(target).or_insert_with(|| p.usage.clone());
                }
            }
            None => invalid(store, diags, p.owner, &p.type_name, &p.ref_id, &p.fragment),
        }
    }

    // union-find over endpoint ids
    let mut parent: HashMap<ObjectId, ObjectId> = HashMap::new();
    fn find(parent: &mut HashMap<ObjectId, ObjectId>, x: ObjectId) -> ObjectId {
        let p = *parent.entry(x).or_insert(x);
        if p == x {
            return x;
        }
        let root = find(parent, p);
        parent.insert(x, root);
        root
    }
    for (a, b) in &edges {
        let ra = find(&mut parent, *a);
        let rb = find(&mut parent, *b);
        if ra != rb {
            parent.insert(ra, rb);
        }
    }

    // cluster membership in first-seen order
    let mut clusters: HashMap<ObjectId, Vec<ObjectId>> = HashMap::new();
    let mut cluster_order: Vec<ObjectId> = Vec::new();
    for (a, b) in &edges {
        for node in [*a, *b] {
            let root = find(&mut parent, node);
            let members = clusters.entry(root).or_insert_with(|| {
                cluster_order.push(root);
                Vec::new()
            });
            if !members.contains(&node) {
                members.push(node);
            }
        }
    }

    for root in cluster_order {
        let members = &clusters[&root];
        let existing = store
            .groups_of_type(ty)
            .find(|g| g.shares_member(members))
            .map(|g| g.id);
        let group_id = match existing {
            Some(gid) => {
                let group = store.group_mut(gid).expect("group id from iteration");
                let subset = members.iter().all(|m| group.targets.contains(m));
                let superset = group.targets.iter().all(|m| members.contains(m));
                for m in members {
                    if !group.targets.contains(m) {
                        group.targets.push(*m);
                    }
                }
                if !subset && !superset {
                    // neither contains the other: the source declared the
                    // group inconsistently
                    diags.combined_collection(
                        type_name,
                        gid,
                        format!("declared membership of {} unioned into existing group", members.len()),
                    );
                }
                gid
            }
            None => store.add_group(RelationGroup::new(ty, members.clone())),
        };
        if let Some(group) = store.group_mut(group_id) {
            for (target, usage) in &usages {
                if group.targets.contains(target) {
                    group.usage.entry(*target).or_insert_with(|| usage.clone());
                }
            }
        }
    }
}

fn attach_tree_member(store: &mut LexStore, ty: ObjectId, root: ObjectId, member: ObjectId) {
    let existing = store
        .groups_of_type(ty)
        .find(|g| g.root() == Some(root))
        .map(|g| g.id);
    match existing {
        Some(gid) => {
            let group = store.group_mut(gid).expect("group id from iteration");
            if !group.targets.contains(&member) {
                group.targets.push(member);
            }
        }
        None => {
            store.add_group(RelationGroup::new(ty, vec![root, member]));
        }
    }
}

fn apply_usage(group: &mut RelationGroup, target: ObjectId, usage: &MultiText) {
    if !usage.is_empty() {
        group.usage.insert(target, usage.clone());
    }
}

fn resolve_entry_refs(
    store: &mut LexStore,
    ids: &mut IdentityResolver,
    pendings: Vec<PendingEntryReference>,
    diags: &mut DiagnosticsRecorder,
) {
    let mut i = 0;
    while i < pendings.len() {
        let first = &pendings[i];
        let mut run: Vec<&PendingEntryReference> = Vec::new();
        let mut j = i;
        while j < pendings.len() && pendings[j].owner == first.owner && pendings[j].kind == first.kind
        {
            run.push(&pendings[j]);
            j += 1;
        }
        i = j;
        // declared order values take precedence over stream order
        run.sort_by_key(|p| p.order.unwrap_or(i32::MAX));

        let mut components: Vec<ObjectId> = Vec::new();
        let mut primary: Vec<ObjectId> = Vec::new();
        let mut cf_names: Vec<String> = Vec::new();
        let mut var_names: Vec<String> = Vec::new();
        let mut hide = false;
        for p in &run {
            match resolve_target(store, ids, &p.ref_id) {
                Some(target) => {
                    if !components.contains(&target) {
                        components.push(target);
                    }
                    if p.is_primary && !primary.contains(&target) {
                        primary.push(target);
                    }
                }
                None => {
                    let label = match p.kind {
                        RefKind::ComplexForm => "component",
                        RefKind::Variant => "variant of",
                    };
                    invalid(store, diags, p.owner, label, &p.ref_id, &p.fragment);
                }
            }
            for name in &p.complex_form_types {
                if !cf_names.contains(name) {
                    cf_names.push(name.clone());
                }
            }
            for name in &p.variant_types {
                if !var_names.contains(name) {
                    var_names.push(name.clone());
                }
            }
            hide |= p.hide_minor_entry;
        }
        if components.is_empty() {
            continue;
        }

        let cf_items =
            resolve_type_items(store, ids, diags, StandardList::ComplexFormTypes, &cf_names);
        let var_items = resolve_type_items(store, ids, diags, StandardList::VariantTypes, &var_names);

        let existing = store
            .refs_of(first.owner)
            .find(|r| r.kind == first.kind && r.components == components)
            .map(|r| r.id);
        match existing {
            Some(rid) => {
                let er = store.entry_ref_mut(rid).expect("ref id from iteration");
                for t in cf_items {
                    if !er.complex_form_types.contains(&t) {
                        er.complex_form_types.push(t);
                    }
                }
                for t in var_items {
                    if !er.variant_types.contains(&t) {
                        er.variant_types.push(t);
                    }
                }
                for p in primary {
                    if !er.primary.contains(&p) {
                        er.primary.push(p);
                    }
                }
                er.hide_minor_entry |= hide;
            }
            None => {
                let mut er = EntryReference::new(first.owner, first.kind, components);
                er.complex_form_types = cf_items;
                er.variant_types = var_items;
                er.primary = primary;
                er.hide_minor_entry = hide;
                store.add_entry_ref(er);
            }
        }
    }
}

/// Resolves type names against a standard list, creating missing items.
fn resolve_type_items(
    store: &mut LexStore,
    ids: &mut IdentityResolver,
    diags: &mut DiagnosticsRecorder,
    which: StandardList,
    names: &[String],
) -> Vec<ObjectId> {
    let list = store.standard_list_id(which);
    let mut out = Vec::new();
    for name in names {
        let id = crate::possibility_sync::find_or_create_item(store, ids, diags, list, name);
        if !out.contains(&id) {
            out.push(id);
        }
    }
    out
}
