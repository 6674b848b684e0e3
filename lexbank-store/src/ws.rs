//! Writing-system registry.
//!
//! Maps already-cleaned language tags to dense [`WsId`] handles. Tag cleanup
//! itself happens in the merge engine's writing-system resolver; the registry
//! only guarantees one handle per distinct tag.

use lexbank_types::WsId;
use std::collections::HashMap;

/// Registry of writing systems known to the store.
#[derive(Debug, Clone)]
pub struct WritingSystemRegistry {
    by_tag: HashMap<String, WsId>,
    tags: Vec<String>,
    default_vernacular: WsId,
    default_analysis: WsId,
}

impl WritingSystemRegistry {
    /// Creates a registry with the given default vernacular and analysis
    /// writing systems already registered.
    #[must_use]
    pub fn new(vernacular_tag: &str, analysis_tag: &str) -> Self {
        let mut reg = Self {
            by_tag: HashMap::new(),
            tags: Vec::new(),
            default_vernacular: WsId::from_raw(0),
            default_analysis: WsId::from_raw(0),
        };
        reg.default_vernacular = reg.get_or_register(vernacular_tag);
        reg.default_analysis = reg.get_or_register(analysis_tag);
        reg
    }

    /// Returns the handle for a tag, if registered.
    #[must_use]
    pub fn get(&self, tag: &str) -> Option<WsId> {
        self.by_tag.get(tag).copied()
    }

    /// Returns the handle for a tag, registering it if new.
    pub fn get_or_register(&mut self, tag: &str) -> WsId {
        if let Some(ws) = self.by_tag.get(tag) {
            return *ws;
        }
        let ws = WsId::from_raw(self.tags.len() as u32);
        self.tags.push(tag.to_string());
        self.by_tag.insert(tag.to_string(), ws);
        ws
    }

    /// Returns the tag for a handle.
    #[must_use]
    pub fn tag(&self, ws: WsId) -> Option<&str> {
        self.tags.get(ws.as_raw() as usize).map(String::as_str)
    }

    /// The default vernacular writing system.
    #[must_use]
    pub fn default_vernacular(&self) -> WsId {
        self.default_vernacular
    }

    /// The default analysis writing system.
    #[must_use]
    pub fn default_analysis(&self) -> WsId {
        self.default_analysis
    }

    /// Number of registered writing systems.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    /// True if no writing system is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Iterates over (handle, tag) pairs in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (WsId, &str)> {
        self.tags
            .iter()
            .enumerate()
            .map(|(i, t)| (WsId::from_raw(i as u32), t.as_str()))
    }
}
