//! Orphan collection after a keep-only-new merge.
//!
//! Phase 1 marks every top-level entry the import neither matched nor
//! created. Phase 2 deletes them through the store's owning-collection
//! removal primitive. Phase 3 runs fixed-order cleanup sweeps, each a single
//! pass over its object kind; deeper cascades are only chased when the
//! fixpoint option is set.

use lexbank_store::LexStore;
use lexbank_types::ObjectId;
use std::collections::HashSet;
use tracing::info;

/// Counts of what the collector removed or repaired.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepStats {
    pub entries_deleted: usize,
    pub groups_removed: usize,
    pub msas_removed: usize,
    pub analyses_removed: usize,
    pub bundles_backfilled: usize,
    pub refs_removed: usize,
}

impl SweepStats {
    fn merge(&mut self, other: SweepStats) {
        self.entries_deleted += other.entries_deleted;
        self.groups_removed += other.groups_removed;
        self.msas_removed += other.msas_removed;
        self.analyses_removed += other.analyses_removed;
        self.bundles_backfilled += other.bundles_backfilled;
        self.refs_removed += other.refs_removed;
    }

    fn changed_anything(&self) -> bool {
        self.entries_deleted
            + self.groups_removed
            + self.msas_removed
            + self.analyses_removed
            + self.bundles_backfilled
            + self.refs_removed
            > 0
    }
}

/// Deletes untouched entries and sweeps their orphaned dependents.
///
/// `touched` holds every top-level entry the import matched or created.
/// With `fixpoint` the phase-3 sweeps repeat until nothing changes; the
/// default single pass preserves the original behavior.
pub fn collect(store: &mut LexStore, touched: &HashSet<ObjectId>, fixpoint: bool) -> SweepStats {
    let mut stats = SweepStats::default();

    for id in store.entry_ids() {
        if !touched.contains(&id) {
            store.remove_entry(id);
            stats.entries_deleted += 1;
        }
    }

    stats.merge(run_sweeps(store));
    if fixpoint {
        // bounded: each iteration strictly shrinks the object graph
        loop {
            let pass = run_sweeps(store);
            let more = pass.changed_anything();
            stats.merge(pass);
            if !more {
                break;
            }
        }
    }

    info!(
        "orphan collection removed {} entries, {} groups, {} MSAs, {} analyses, {} refs",
        stats.entries_deleted,
        stats.groups_removed,
        stats.msas_removed,
        stats.analyses_removed,
        stats.refs_removed
    );
    stats
}

fn run_sweeps(store: &mut LexStore) -> SweepStats {
    let mut stats = SweepStats::default();
    stats.groups_removed = sweep_relation_groups(store);
    stats.msas_removed = sweep_msas(store);
    stats.analyses_removed = sweep_analyses(store);
    stats.bundles_backfilled = backfill_bundles(store);
    stats.refs_removed = sweep_entry_refs(store);
    stats
}

/// Drops dead members from relation groups and removes groups left with
/// fewer than two members.
fn sweep_relation_groups(store: &mut LexStore) -> usize {
    let mut removed = 0;
    for id in store.group_ids() {
        let survivors: Vec<ObjectId> = {
            let group = match store.group(id) {
                Some(g) => g,
                None => continue,
            };
            group
                .targets
                .iter()
                .copied()
                .filter(|t| store.contains(*t))
                .collect()
        };
        if survivors.len() < 2 {
            store.remove_group(id);
            removed += 1;
        } else if let Some(group) = store.group_mut(id) {
            if group.targets.len() != survivors.len() {
                group.usage.retain(|k, _| survivors.contains(k));
                group.targets = survivors;
            }
        }
    }
    removed
}

/// Removes MSAs no sense of their entry references any more.
fn sweep_msas(store: &mut LexStore) -> usize {
    let mut removed = 0;
    for id in store.entry_ids() {
        let referenced: HashSet<ObjectId> = {
            let entry = match store.entry(id) {
                Some(e) => e,
                None => continue,
            };
            let mut refs = HashSet::new();
            entry.walk_senses(&mut |s| {
                if let Some(msa) = s.msa {
                    refs.insert(msa);
                }
            });
            refs
        };
        if let Some(entry) = store.entry_mut(id) {
            let before = entry.msas.len();
            entry.msas.retain(|m| referenced.contains(&m.id));
            removed += before - entry.msas.len();
        }
    }
    removed
}

/// Prunes dead lexicon links from analysis bundles, then removes analyses
/// that lack both a human evaluation and any surviving morpheme linkage.
fn sweep_analyses(store: &mut LexStore) -> usize {
    let mut removed = 0;
    for id in store.analysis_ids() {
        let entry_exists = |e: Option<ObjectId>| e.is_some_and(|id| store.entry(id).is_some());
        let sense_exists = |s: Option<ObjectId>| s.is_some_and(|id| store.sense_owner(id).is_some());
        let msa_exists = |entry: Option<ObjectId>, msa: Option<ObjectId>| match (entry, msa) {
            (Some(e), Some(m)) => store.entry(e).is_some_and(|en| en.find_msa(m).is_some()),
            _ => false,
        };

        let pruned: Vec<(ObjectId, Option<ObjectId>, Option<ObjectId>, Option<ObjectId>)> = {
            let analysis = match store.analysis(id) {
                Some(a) => a,
                None => continue,
            };
            analysis
                .bundles
                .iter()
                .map(|b| {
                    let entry = b.entry.filter(|_| entry_exists(b.entry));
                    let sense = b.sense.filter(|_| sense_exists(b.sense));
                    let msa = b.msa.filter(|_| msa_exists(entry, b.msa));
                    (b.id, entry, sense, msa)
                })
                .collect()
        };

        let analysis = match store.analysis_mut(id) {
            Some(a) => a,
            None => continue,
        };
        for (bid, entry, sense, msa) in pruned {
            if let Some(bundle) = analysis.bundles.iter_mut().find(|b| b.id == bid) {
                bundle.entry = entry;
                bundle.sense = sense;
                bundle.msa = msa;
            }
        }
        if !analysis.human_approved && !analysis.has_valid_linkage() {
            store.remove_analysis(id);
            removed += 1;
        }
    }
    removed
}

/// Backfills missing default text and MSA linkage on surviving bundles.
fn backfill_bundles(store: &mut LexStore) -> usize {
    let mut backfilled = 0;
    for id in store.analysis_ids() {
        let fixes: Vec<(ObjectId, Option<lexbank_model::MultiText>, Option<ObjectId>)> = {
            let analysis = match store.analysis(id) {
                Some(a) => a,
                None => continue,
            };
            analysis
                .bundles
                .iter()
                .filter_map(|b| {
                    let form = if b.default_form.is_empty() {
                        b.entry
                            .and_then(|e| store.entry(e))
                            .map(|e| e.headword().clone())
                            .filter(|h| !h.is_empty())
                    } else {
                        None
                    };
                    let msa = if b.msa.is_none() {
                        b.sense
                            .and_then(|s| store.sense_owner(s).zip(Some(s)))
                            .and_then(|(e, s)| store.entry(e)?.find_sense(s)?.msa)
                    } else {
                        None
                    };
                    if form.is_some() || msa.is_some() {
                        Some((b.id, form, msa))
                    } else {
                        None
                    }
                })
                .collect()
        };
        if fixes.is_empty() {
            continue;
        }
        if let Some(analysis) = store.analysis_mut(id) {
            for (bid, form, msa) in fixes {
                if let Some(bundle) = analysis.bundles.iter_mut().find(|b| b.id == bid) {
                    if let Some(form) = form {
                        bundle.default_form = form;
                        backfilled += 1;
                    }
                    if let Some(msa) = msa {
                        bundle.msa = Some(msa);
                    }
                }
            }
        }
    }
    backfilled
}

/// Removes entry references whose owner died or whose components all died.
fn sweep_entry_refs(store: &mut LexStore) -> usize {
    let mut removed = 0;
    for id in store.entry_ref_ids() {
        let (owner_alive, survivors): (bool, Vec<ObjectId>) = {
            let er = match store.entry_ref(id) {
                Some(r) => r,
                None => continue,
            };
            (
                store.entry(er.owner).is_some(),
                er.components
                    .iter()
                    .copied()
                    .filter(|c| store.contains(*c))
                    .collect(),
            )
        };
        if !owner_alive || survivors.is_empty() {
            store.remove_entry_ref(id);
            removed += 1;
        } else if let Some(er) = store.entry_ref_mut(id) {
            if er.components.len() != survivors.len() {
                er.primary.retain(|p| survivors.contains(p));
                er.components = survivors;
            }
        }
    }
    removed
}
