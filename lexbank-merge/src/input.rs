//! The parsed record model the external streaming parser produces.
//!
//! The engine does not read files. A pull/callback parser collaborator walks
//! the interchange document and hands the engine one record per top-level
//! object, already parsed into the `Raw*` types below; the engine merges each
//! record before the callback returns. Content the parser could not classify
//! arrives in the `unknown` lists as verbatim text and is preserved as
//! residue.

use crate::error::MergeResult;
use crate::report::ImportReport;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// A formatting run inside a [`RawText`], offsets in chars.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawSpan {
    pub start: usize,
    pub len: usize,
    pub lang: Option<String>,
    pub style: Option<String>,
    pub href: Option<String>,
}

/// Formatted text as read from the stream.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawText {
    pub text: String,
    pub spans: Vec<RawSpan>,
}

impl RawText {
    /// Plain text with no spans.
    #[must_use]
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            spans: Vec::new(),
        }
    }
}

/// A multilingual text block: (language tag, value) pairs in document order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawMultiText {
    pub forms: Vec<(String, RawText)>,
}

impl RawMultiText {
    /// An empty block.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A block with a single plain form.
    #[must_use]
    pub fn single(lang: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            forms: vec![(lang.into(), RawText::plain(text))],
        }
    }

    /// Appends a plain form.
    pub fn push(&mut self, lang: impl Into<String>, text: impl Into<String>) {
        self.forms.push((lang.into(), RawText::plain(text)));
    }

    /// True if the block has no forms.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.forms.is_empty()
    }
}

/// A free-form name/value trait.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTrait {
    pub name: String,
    pub value: String,
}

impl RawTrait {
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// A typed field attached to an entry, sense, or example.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawField {
    /// The field's declared tag/name.
    pub kind: String,
    pub content: RawMultiText,
    pub traits: Vec<RawTrait>,
}

/// A relation record: one reference from its owner to a target id.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawRelation {
    pub type_name: String,
    /// The raw target id string; resolved after the whole stream is read.
    pub ref_id: String,
    pub order: Option<i32>,
    pub usage: RawMultiText,
    pub traits: Vec<RawTrait>,
    pub date_created: Option<DateTime<Utc>>,
    pub date_modified: Option<DateTime<Utc>>,
}

impl RawRelation {
    /// A relation with just a type and target.
    #[must_use]
    pub fn simple(type_name: impl Into<String>, ref_id: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            ref_id: ref_id.into(),
            ..Self::default()
        }
    }

    /// The record's verbatim textual form, for residue preservation.
    #[must_use]
    pub fn to_fragment(&self) -> String {
        let mut s = format!(
            "<relation type=\"{}\" ref=\"{}\"",
            self.type_name, self.ref_id
        );
        if let Some(order) = self.order {
            s.push_str(&format!(" order=\"{order}\""));
        }
        if self.traits.is_empty() {
            s.push_str("/>");
        } else {
            s.push('>');
            for t in &self.traits {
                s.push_str(&format!("<trait name=\"{}\" value=\"{}\"/>", t.name, t.value));
            }
            s.push_str("</relation>");
        }
        s
    }
}

/// A typed note.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawNote {
    pub kind: Option<String>,
    pub content: RawMultiText,
}

/// An example sentence under a sense.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawExample {
    pub id: Option<String>,
    pub text: RawMultiText,
    pub translation: RawMultiText,
    pub source: Option<String>,
    pub unknown: Vec<String>,
}

/// A sense record, possibly with nested sub-senses.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawSense {
    /// Free-text id, possibly containing an embedded canonical identifier.
    pub id: Option<String>,
    pub grammatical_info: Option<String>,
    pub gloss: RawMultiText,
    pub definition: RawMultiText,
    pub examples: Vec<RawExample>,
    pub notes: Vec<RawNote>,
    pub relations: Vec<RawRelation>,
    pub semantic_domains: Vec<String>,
    pub usage_types: Vec<String>,
    pub subsenses: Vec<RawSense>,
    pub fields: Vec<RawField>,
    pub traits: Vec<RawTrait>,
    pub unknown: Vec<String>,
}

/// An inline variant form.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawVariant {
    pub form: RawMultiText,
    pub traits: Vec<RawTrait>,
    pub unknown: Vec<String>,
}

/// A pronunciation, optionally with media references.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawPronunciation {
    pub form: RawMultiText,
    /// Relative paths to audio/video files.
    pub media: Vec<String>,
    pub unknown: Vec<String>,
}

/// An etymology.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawEtymology {
    pub kind: String,
    pub source: Option<String>,
    pub form: RawMultiText,
    pub gloss: RawMultiText,
    pub unknown: Vec<String>,
}

/// A top-level entry record.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawEntry {
    /// Explicit canonical identifier, when the source carries one.
    pub guid: Option<Uuid>,
    /// Free-text id, possibly containing an embedded canonical identifier.
    pub id: Option<String>,
    pub date_created: Option<DateTime<Utc>>,
    pub date_modified: Option<DateTime<Utc>>,
    pub lexical_unit: RawMultiText,
    pub citation: RawMultiText,
    pub senses: Vec<RawSense>,
    pub variants: Vec<RawVariant>,
    pub pronunciations: Vec<RawPronunciation>,
    pub etymologies: Vec<RawEtymology>,
    pub relations: Vec<RawRelation>,
    pub notes: Vec<RawNote>,
    pub fields: Vec<RawField>,
    pub traits: Vec<RawTrait>,
    pub unknown: Vec<String>,
}

/// One element of a range: a controlled-vocabulary item declaration.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawRangeElement {
    pub id: String,
    pub guid: Option<Uuid>,
    /// Id of the parent element within the same range, for tree slots.
    pub parent: Option<String>,
    pub label: RawMultiText,
    pub abbrev: RawMultiText,
    pub description: RawMultiText,
    pub traits: Vec<RawTrait>,
}

/// A named range: one controlled vocabulary declared by the ranges document.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawRange {
    pub id: String,
    pub guid: Option<Uuid>,
    pub elements: Vec<RawRangeElement>,
}

/// The companion ranges document, consumed eagerly before the main stream.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RangesDocument {
    pub ranges: Vec<RawRange>,
}

/// A custom-field declaration from the main document's header.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawFieldSpec {
    pub name: String,
    /// Owning class name ("LexEntry", "LexSense", "LexExampleSentence").
    pub class: Option<String>,
    /// `key=value` pair specification string.
    pub spec: Option<String>,
}

/// The push interface the streaming parser drives.
///
/// Call order: [`ranges`](ImportSink::ranges) once, then
/// [`field_specs`](ImportSink::field_specs) once, then
/// [`entry`](ImportSink::entry) per record in document order, then
/// [`finish`](ImportSink::finish) exactly once.
pub trait ImportSink {
    /// Consumes the companion ranges document.
    fn ranges(&mut self, doc: &RangesDocument) -> MergeResult<()>;

    /// Consumes the custom-field declarations from the document header.
    fn field_specs(&mut self, specs: &[RawFieldSpec]) -> MergeResult<()>;

    /// Merges one entry record.
    fn entry(&mut self, entry: RawEntry) -> MergeResult<()>;

    /// Resolves deferred relations, collects orphans, and produces the
    /// import report.
    fn finish(&mut self) -> MergeResult<ImportReport>;
}
