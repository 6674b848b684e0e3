//! Verbatim preservation of unmodeled input content.

use serde::{Deserialize, Serialize};

/// An ordered list of raw content fragments the object model cannot
/// represent, preserved per object and written back unchanged on re-export.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Residue {
    fragments: Vec<String>,
}

impl Residue {
    /// Creates an empty residue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a raw fragment, preserving order of appearance.
    pub fn push(&mut self, fragment: impl Into<String>) {
        self.fragments.push(fragment.into());
    }

    /// Returns true if nothing has been preserved.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Number of preserved fragments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    /// Iterates over the fragments in order of appearance.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.fragments.iter().map(String::as_str)
    }
}
