//! Batch lexicon merge engine for LexBank.
//!
//! Ingests an external, hierarchically-structured lexicon interchange stream
//! (entries, senses, examples, variants, relations, plus a companion ranges
//! document of controlled vocabularies) and merges it into a [`LexStore`]
//! that may already contain independently-edited data.
//!
//! # Architecture
//!
//! The engine is single-threaded and push-driven: a parser collaborator
//! feeds one record per [`ImportSink`] callback and the engine resolves,
//! merges, and queues inline before the callback returns.
//!
//! - identity resolution by explicit identifier, embedded identifier, or
//!   normalized label ([`identity`])
//! - field-level conflict resolution under a selectable [`MergePolicy`]
//!   ([`field_merge`])
//! - forward references deferred to an immutable pending queue and resolved
//!   in a post-pass per mapping kind ([`pending`], [`relation_resolve`])
//! - schema-evolution-aware custom-field reconciliation ([`custom_fields`])
//! - verbatim residue for anything the model cannot represent, and an
//!   import report as the sole human-facing output ([`ImportReport`])
//!
//! [`LexStore`]: lexbank_store::LexStore

mod convert;
pub mod custom_fields;
mod diagnostics;
mod error;
pub mod field_merge;
pub mod identity;
mod input;
pub mod media;
mod merger;
mod normalize;
mod options;
pub mod orphans;
pub mod pending;
pub mod possibility_sync;
pub mod relation_resolve;
mod report;
pub mod ws_resolver;

pub use diagnostics::{DiagnosticRecord, DiagnosticsRecorder, NewItem};
pub use error::{MergeError, MergeResult};
pub use input::{
    ImportSink, RangesDocument, RawEntry, RawEtymology, RawExample, RawField, RawFieldSpec,
    RawMultiText, RawNote, RawPronunciation, RawRange, RawRangeElement, RawRelation, RawSense,
    RawSpan, RawText, RawTrait, RawVariant,
};
pub use merger::{LexiconMerger, run_import};
pub use normalize::{fold_key, nfd, text_eq};
pub use options::{ImportOptions, MergePolicy};
pub use report::ImportReport;
