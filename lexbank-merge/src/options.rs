//! Import configuration.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

/// How field-level conflicts are resolved during the import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MergePolicy {
    /// Fill empty fields only; never overwrite a populated value.
    #[default]
    KeepOld,
    /// Always take the incoming value.
    KeepNew,
    /// Keep the existing value and duplicate the object for the incoming one.
    KeepBoth,
    /// Take the incoming value, clear multilingual keys absent from the
    /// input, and delete untouched entries afterwards.
    KeepOnlyNew,
}

impl MergePolicy {
    /// True when a populated existing value is replaced by the incoming one.
    #[must_use]
    pub fn overwrites(self) -> bool {
        matches!(self, MergePolicy::KeepNew | MergePolicy::KeepOnlyNew)
    }

    /// True when the orphan collector runs after the merge.
    #[must_use]
    pub fn collects_orphans(self) -> bool {
        matches!(self, MergePolicy::KeepOnlyNew)
    }
}

/// Configuration for one import run. Read once, immutable for the duration.
#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    pub policy: MergePolicy,
    /// Directory relative media paths resolve against.
    pub source_root: Option<PathBuf>,
    /// Managed linked-files area media is copied into.
    pub linked_files_root: Option<PathBuf>,
    /// Re-run orphan sweeps to a fixpoint instead of the single pass the
    /// original behavior specifies.
    pub fixpoint_orphans: bool,
    /// Cooperative cancellation flag, checked between whole-object merges.
    pub cancel: Option<Arc<AtomicBool>>,
}

impl ImportOptions {
    /// Creates options for a policy with everything else defaulted.
    #[must_use]
    pub fn with_policy(policy: MergePolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    /// True if the cancellation flag has been raised.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|c| c.load(std::sync::atomic::Ordering::Relaxed))
    }
}
