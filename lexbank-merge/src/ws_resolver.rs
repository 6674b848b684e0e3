//! Writing-system resolution.
//!
//! Maps raw language tags from the stream to store writing-system handles,
//! creating writing systems on demand. Malformed tags are cleaned first;
//! when two distinct malformed tags would clean to the same new tag within
//! one run, the later one gets a private-use suffix instead of silently
//! merging with the earlier one.

use lexbank_store::LexStore;
use lexbank_types::WsId;
use std::collections::HashMap;
use tracing::debug;

/// Cleans a raw language tag into a usable writing-system tag.
///
/// Underscores become hyphens; characters outside ASCII alphanumerics and
/// hyphen are dropped; runs of hyphens collapse; the result is lowercased.
/// A tag with nothing left cleans to `und`.
#[must_use]
pub fn clean_tag(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut last_hyphen = true;
    for c in raw.trim().chars() {
        let c = if c == '_' { '-' } else { c };
        if c == '-' {
            if !last_hyphen {
                out.push('-');
                last_hyphen = true;
            }
        } else if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
            last_hyphen = false;
        }
    }
    while out.ends_with('-') {
        out.pop();
    }
    if out.is_empty() {
        "und".to_string()
    } else {
        out
    }
}

/// Per-import writing-system cache, owned by the merger and discarded with it.
#[derive(Debug, Default)]
pub struct WsResolver {
    /// Raw tag → resolved handle, so repeated tags skip cleanup.
    raw_cache: HashMap<String, WsId>,
    /// Cleaned tags registered this run → the raw tag that produced them.
    created: HashMap<String, String>,
}

impl WsResolver {
    /// Creates an empty resolver.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves a raw tag to a writing system, creating one if needed.
    pub fn resolve(&mut self, store: &mut LexStore, raw: &str) -> WsId {
        if let Some(ws) = self.raw_cache.get(raw) {
            return *ws;
        }
        let cleaned = clean_tag(raw);
        let ws = match store.ws().get(&cleaned) {
            Some(existing) => {
                // Reuse unless the tag was minted this run from a different
                // malformed raw tag; two mangled tags must not collide.
                match self.created.get(&cleaned) {
                    Some(origin) if origin != raw => {
                        let unique = self.unique_variant(store, &cleaned);
                        debug!("tag {raw:?} collides with {origin:?}; using {unique:?}");
                        self.created.insert(unique.clone(), raw.to_string());
                        store.ws_mut().get_or_register(&unique)
                    }
                    _ => existing,
                }
            }
            None => {
                if cleaned != raw {
                    self.created.insert(cleaned.clone(), raw.to_string());
                }
                debug!("registered writing system {cleaned:?} for tag {raw:?}");
                store.ws_mut().get_or_register(&cleaned)
            }
        };
        self.raw_cache.insert(raw.to_string(), ws);
        ws
    }

    fn unique_variant(&self, store: &LexStore, cleaned: &str) -> String {
        let mut n = 1;
        loop {
            let candidate = format!("{cleaned}-x-dupl{n}");
            if store.ws().get(&candidate).is_none() {
                return candidate;
            }
            n += 1;
        }
    }
}
