//! Field-level merge under the active policy.
//!
//! The merger carries the policy and an "object is newly created" flag; a
//! just-created object always takes the incoming value. Conflicts under
//! keep-both are returned to the caller, which creates the sibling duplicate
//! and records the diagnostic — the merger itself never duplicates objects.

use crate::diagnostics::DiagnosticsRecorder;
use crate::normalize::text_eq;
use crate::options::MergePolicy;
use chrono::{DateTime, Utc};
use lexbank_model::{FormattedText, MultiText};
use lexbank_store::LexStore;
use lexbank_types::{ObjectId, WsId};

/// A conflicting write the keep-both policy refused to apply.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldConflict {
    pub field: String,
    pub ws: Option<WsId>,
    pub existing: String,
    pub incoming: String,
}

/// Applies the active merge policy to scalar, multilingual-text, and
/// reference fields.
#[derive(Debug, Clone, Copy)]
pub struct FieldMerger {
    policy: MergePolicy,
    newly_created: bool,
}

impl FieldMerger {
    /// Creates a merger for one object.
    #[must_use]
    pub fn new(policy: MergePolicy, newly_created: bool) -> Self {
        Self {
            policy,
            newly_created,
        }
    }

    /// The active policy.
    #[must_use]
    pub fn policy(&self) -> MergePolicy {
        self.policy
    }

    /// Merges a multilingual text field, one writing system at a time.
    ///
    /// Returns the writes keep-both refused; empty for all other policies.
    /// Over-length incoming values are truncated to exactly the field's
    /// limit, with a truncation diagnostic when the value is stored.
    pub fn merge_multitext(
        &self,
        store: &LexStore,
        owner: ObjectId,
        field: &str,
        existing: &mut MultiText,
        incoming: &MultiText,
        diags: &mut DiagnosticsRecorder,
    ) -> Vec<FieldConflict> {
        let mut conflicts = Vec::new();
        let limit = store.field_limit(field);
        for (ws, value) in incoming.iter() {
            let mut stored = value.clone();
            let truncated = limit.is_some_and(|l| value.char_len() > l);
            if let Some(l) = limit {
                stored.truncate_chars(l);
            }
            let write = match existing.get(ws) {
                _ if self.newly_created => true,
                None => true,
                Some(old) if old.is_empty() => true,
                Some(old) if formatted_eq(old, &stored) => false,
                Some(old) => match self.policy {
                    MergePolicy::KeepOld => false,
                    MergePolicy::KeepNew | MergePolicy::KeepOnlyNew => true,
                    MergePolicy::KeepBoth => {
                        conflicts.push(FieldConflict {
                            field: field.to_string(),
                            ws: Some(ws),
                            existing: old.text.clone(),
                            incoming: stored.text.clone(),
                        });
                        false
                    }
                },
            };
            if write {
                if truncated {
                    let tag = store.ws().tag(ws).unwrap_or_default().to_string();
                    diags.truncation(owner, field, tag, value.text.clone(), stored.char_len());
                }
                existing.set(ws, stored);
            }
        }
        // a keep-only-new pass clears keys the input no longer carries
        if self.policy == MergePolicy::KeepOnlyNew && !self.newly_created {
            existing.retain(|ws| incoming.get(ws).is_some());
        }
        conflicts
    }

    /// Merges a plain optional string field.
    pub fn merge_string(
        &self,
        field: &str,
        existing: &mut Option<String>,
        incoming: Option<&str>,
    ) -> Option<FieldConflict> {
        let inc = incoming.filter(|s| !s.is_empty())?;
        if self.newly_created || existing.as_deref().is_none_or(str::is_empty) {
            *existing = Some(inc.to_string());
            return None;
        }
        let old = existing.as_deref().unwrap_or_default();
        if text_eq(old, inc) {
            return None;
        }
        match self.policy {
            MergePolicy::KeepOld => None,
            MergePolicy::KeepNew | MergePolicy::KeepOnlyNew => {
                *existing = Some(inc.to_string());
                None
            }
            MergePolicy::KeepBoth => Some(FieldConflict {
                field: field.to_string(),
                ws: None,
                existing: old.to_string(),
                incoming: inc.to_string(),
            }),
        }
    }

    /// Merges an unordered reference collection.
    ///
    /// Collections carry no per-value conflict: keep-old fills only an empty
    /// collection, keep-both unions, the overwriting policies replace.
    pub fn merge_refs(&self, existing: &mut Vec<ObjectId>, incoming: &[ObjectId]) {
        if self.newly_created || self.policy.overwrites() {
            if !incoming.is_empty() || self.policy == MergePolicy::KeepOnlyNew {
                *existing = incoming.to_vec();
            }
            return;
        }
        match self.policy {
            MergePolicy::KeepOld => {
                if existing.is_empty() {
                    *existing = incoming.to_vec();
                }
            }
            MergePolicy::KeepBoth => {
                for id in incoming {
                    if !existing.contains(id) {
                        existing.push(*id);
                    }
                }
            }
            _ => unreachable!("overwriting policies handled above"),
        }
    }

    /// Merges an atomic reference field.
    pub fn merge_opt_ref(&self, existing: &mut Option<ObjectId>, incoming: Option<ObjectId>) {
        let Some(inc) = incoming else { return };
        if self.newly_created || existing.is_none() || self.policy.overwrites() {
            *existing = Some(inc);
        }
    }

    /// Merges a timestamp field. Timestamps are bookkeeping, not content;
    /// they never conflict.
    pub fn merge_date(
        &self,
        existing: &mut Option<DateTime<Utc>>,
        incoming: Option<DateTime<Utc>>,
    ) {
        let Some(inc) = incoming else { return };
        if self.newly_created || existing.is_none() || self.policy.overwrites() {
            *existing = Some(inc);
        }
    }
}

/// Canonical-decomposition-aware equality for formatted values.
#[must_use]
pub fn formatted_eq(a: &FormattedText, b: &FormattedText) -> bool {
    text_eq(&a.text, &b.text) && a.spans == b.spans
}

/// True when two multilingual values agree on at least one writing system
/// with non-empty text. Used to match owned objects (variants, examples,
/// pronunciations) that carry no identifier of their own.
#[must_use]
pub fn multitext_matches(a: &MultiText, b: &MultiText) -> bool {
    a.iter().any(|(ws, form)| {
        !form.is_empty()
            && b.get(ws)
                .is_some_and(|other| text_eq(&form.text, &other.text))
    })
}
