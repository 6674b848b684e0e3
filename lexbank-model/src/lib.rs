//! Lexical object model for LexBank.
//!
//! Defines the persistent types that all LexBank subsystems depend on:
//! - [`LexicalEntry`], [`Sense`], [`Example`] — the entry hierarchy
//! - [`MultiText`] / [`FormattedText`] — per-writing-system formatted text
//! - [`PossibilityList`] / [`PossibilityItem`] — controlled vocabularies
//! - [`CustomFieldDefinition`] — schema-evolution-aware custom fields
//! - [`RelationType`] / [`RelationGroup`] — typed n-ary lexical relations
//! - [`EntryReference`] — complex-form / variant linkages between entries
//! - [`WordAnalysis`] / [`MorphoSyntaxAnalysis`] — the analysis layer
//! - [`Residue`] — verbatim preservation of unmodeled input
//!
//! These types carry no merge logic; conflict resolution, identity
//! resolution, and relation materialization live in `lexbank-merge`.

mod analysis;
mod entry;
mod entry_ref;
mod fields;
mod possibility;
mod relation;
mod residue;
mod sense;
mod text;

pub use analysis::{MorphBundle, MorphoSyntaxAnalysis, WordAnalysis};
pub use entry::{Etymology, LexicalEntry, Pronunciation, Variant};
pub use entry_ref::{EntryReference, RefKind};
pub use fields::{CustomFieldDefinition, CustomValue, FieldKind, ObjectClass, WsSelector};
pub use possibility::{PossibilityItem, PossibilityList};
pub use relation::{MappingKind, RelationGroup, RelationType};
pub use residue::Residue;
pub use sense::{Example, Note, Sense};
pub use text::{FormattedText, MultiText, Span};
