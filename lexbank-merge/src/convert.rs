//! Conversion of raw stream text into model text.

use crate::input::{RawMultiText, RawText};
use crate::ws_resolver::WsResolver;
use lexbank_model::{FormattedText, MultiText, Span};
use lexbank_store::LexStore;

/// Converts raw formatted text, resolving span writing-system overrides.
pub fn formatted(store: &mut LexStore, ws: &mut WsResolver, raw: &RawText) -> FormattedText {
    let mut out = FormattedText::plain(raw.text.clone());
    for span in &raw.spans {
        let resolved = span.lang.as_deref().map(|lang| ws.resolve(store, lang));
        out.add_span(Span {
            start: span.start,
            len: span.len,
            ws: resolved,
            style: span.style.clone(),
            href: span.href.clone(),
        });
    }
    out
}

/// Converts a raw multilingual block, resolving each language tag.
///
/// When two raw tags resolve to the same writing system the later form wins,
/// matching last-one-in semantics for duplicate keys in the source.
pub fn multitext(store: &mut LexStore, ws: &mut WsResolver, raw: &RawMultiText) -> MultiText {
    let mut out = MultiText::new();
    for (lang, text) in &raw.forms {
        let handle = ws.resolve(store, lang);
        out.set(handle, formatted(store, ws, text));
    }
    out
}

/// The display texts of a raw block, for label matching.
#[must_use]
pub fn texts(raw: &RawMultiText) -> Vec<&str> {
    raw.forms.iter().map(|(_, t)| t.text.as_str()).collect()
}

/// The first non-empty text of a raw block, for display labels.
#[must_use]
pub fn first_text(raw: &RawMultiText) -> Option<&str> {
    raw.forms
        .iter()
        .map(|(_, t)| t.text.as_str())
        .find(|t| !t.is_empty())
}
