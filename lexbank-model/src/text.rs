//! Formatted text and per-writing-system text maps.
//!
//! [`FormattedText`] is a string plus an ordered set of spans; spans may not
//! partially overlap (a span is either disjoint from or fully contained in
//! another). [`MultiText`] maps writing-system handles to formatted values;
//! keys are unique and insertion order carries no meaning.

use lexbank_types::WsId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A formatting run over a slice of a [`FormattedText`].
///
/// Offsets are in Unicode scalar values, not bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    /// Start offset in chars.
    pub start: usize,
    /// Length in chars.
    pub len: usize,
    /// Writing-system override for this run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ws: Option<WsId>,
    /// Named character style.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    /// Hyperlink target (relative path or URL).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
}

impl Span {
    /// End offset in chars (exclusive).
    #[must_use]
    pub const fn end(&self) -> usize {
        self.start + self.len
    }
}

/// A string plus an ordered, non-partially-overlapping set of spans.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FormattedText {
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub spans: Vec<Span>,
}

impl FormattedText {
    /// Creates plain text with no spans.
    #[must_use]
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            spans: Vec::new(),
        }
    }

    /// Returns true if the text is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Length in Unicode scalar values.
    #[must_use]
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    /// Adds a span, keeping the span list ordered by start offset.
    ///
    /// Spans that would cross an existing span boundary are rejected;
    /// identical or nested spans are accepted.
    pub fn add_span(&mut self, span: Span) -> bool {
        let crosses = self.spans.iter().any(|s| {
            (span.start < s.start && span.end() > s.start && span.end() < s.end())
                || (span.start > s.start && span.start < s.end() && span.end() > s.end())
        });
        if crosses {
            return false;
        }
        let pos = self
            .spans
            .partition_point(|s| (s.start, s.len) <= (span.start, span.len));
        self.spans.insert(pos, span);
        true
    }

    /// Truncates to at most `max_chars` scalar values, dropping or clipping
    /// spans that extend past the cut.
    pub fn truncate_chars(&mut self, max_chars: usize) {
        if self.char_len() <= max_chars {
            return;
        }
        let byte_end = self
            .text
            .char_indices()
            .nth(max_chars)
            .map_or(self.text.len(), |(i, _)| i);
        self.text.truncate(byte_end);
        self.spans.retain_mut(|s| {
            if s.start >= max_chars {
                return false;
            }
            if s.end() > max_chars {
                s.len = max_chars - s.start;
            }
            s.len > 0
        });
    }
}

/// A per-writing-system map of formatted text values for one logical field.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MultiText {
    forms: BTreeMap<WsId, FormattedText>,
}

impl MultiText {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a map with a single plain-text form.
    #[must_use]
    pub fn single(ws: WsId, text: impl Into<String>) -> Self {
        let mut mt = Self::new();
        mt.set(ws, FormattedText::plain(text));
        mt
    }

    /// Returns the form for a writing system.
    #[must_use]
    pub fn get(&self, ws: WsId) -> Option<&FormattedText> {
        self.forms.get(&ws)
    }

    /// Sets the form for a writing system, replacing any existing value.
    pub fn set(&mut self, ws: WsId, value: FormattedText) {
        self.forms.insert(ws, value);
    }

    /// Removes the form for a writing system.
    pub fn remove(&mut self, ws: WsId) -> Option<FormattedText> {
        self.forms.remove(&ws)
    }

    /// Returns true if no writing system has a non-empty form.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.forms.values().all(FormattedText::is_empty)
    }

    /// Number of writing systems with a form.
    #[must_use]
    pub fn len(&self) -> usize {
        self.forms.len()
    }

    /// Iterates over (writing system, form) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (WsId, &FormattedText)> {
        self.forms.iter().map(|(ws, f)| (*ws, f))
    }

    /// Iterates over the writing-system keys.
    pub fn keys(&self) -> impl Iterator<Item = WsId> + '_ {
        self.forms.keys().copied()
    }

    /// Mutable access to the form for a writing system.
    pub fn get_mut(&mut self, ws: WsId) -> Option<&mut FormattedText> {
        self.forms.get_mut(&ws)
    }

    /// Retains only the keys for which the predicate holds.
    pub fn retain(&mut self, mut keep: impl FnMut(WsId) -> bool) {
        self.forms.retain(|ws, _| keep(*ws));
    }
}

impl FromIterator<(WsId, FormattedText)> for MultiText {
    fn from_iter<I: IntoIterator<Item = (WsId, FormattedText)>>(iter: I) -> Self {
        Self {
            forms: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_span_rejects_partial_overlap() {
        let mut t = FormattedText::plain("hello world");
        assert!(t.add_span(Span { start: 0, len: 5, ws: None, style: None, href: None }));
        // crosses the boundary of [0, 5)
        assert!(!t.add_span(Span { start: 3, len: 5, ws: None, style: None, href: None }));
        // fully nested is fine
        assert!(t.add_span(Span { start: 1, len: 2, ws: None, style: None, href: None }));
    }

    #[test]
    fn truncate_clips_spans() {
        let mut t = FormattedText::plain("abcdefgh");
        t.add_span(Span { start: 2, len: 4, ws: None, style: Some("Emphasis".into()), href: None });
        t.add_span(Span { start: 6, len: 2, ws: None, style: None, href: None });
        t.truncate_chars(4);
        assert_eq!(t.text, "abcd");
        assert_eq!(t.spans.len(), 1);
        assert_eq!(t.spans[0].len, 2);
    }

    #[test]
    fn multitext_empty_means_no_nonempty_form() {
        let mut mt = MultiText::new();
        assert!(mt.is_empty());
        mt.set(WsId::from_raw(0), FormattedText::plain(""));
        assert!(mt.is_empty());
        mt.set(WsId::from_raw(1), FormattedText::plain("x"));
        assert!(!mt.is_empty());
    }
}
