//! The import report.
//!
//! The sole human-facing output of the engine: one section per diagnostic
//! category, in fixed order, omitted when empty.

use crate::diagnostics::{DiagnosticRecord, DiagnosticsRecorder, NewItem};
use crate::options::MergePolicy;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Summary of one import run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportReport {
    pub generated_at: DateTime<Utc>,
    #[serde(skip)]
    pub policy: MergePolicy,
    pub entries_created: usize,
    pub entries_merged: usize,
    pub entries_deleted: usize,
    records: Vec<DiagnosticRecord>,
    new_items: Vec<NewItem>,
    errors: Vec<String>,
}

impl ImportReport {
    /// Builds a report from the run's diagnostics.
    #[must_use]
    pub fn build(
        diags: &DiagnosticsRecorder,
        policy: MergePolicy,
        entries_created: usize,
        entries_merged: usize,
        entries_deleted: usize,
    ) -> Self {
        Self {
            generated_at: Utc::now(),
            policy,
            entries_created,
            entries_merged,
            entries_deleted,
            records: diags.records().to_vec(),
            new_items: diags.new_items().to_vec(),
            errors: diags.errors().to_vec(),
        }
    }

    /// All diagnostic records, in the order produced.
    #[must_use]
    pub fn records(&self) -> &[DiagnosticRecord] {
        &self.records
    }

    /// Controlled-vocabulary items created by the run.
    #[must_use]
    pub fn new_items(&self) -> &[NewItem] {
        &self.new_items
    }

    /// Raw error messages.
    #[must_use]
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// Conflicts recorded under keep-both.
    pub fn conflicts(&self) -> impl Iterator<Item = &DiagnosticRecord> {
        self.records
            .iter()
            .filter(|r| matches!(r, DiagnosticRecord::Conflict { .. }))
    }

    /// Truncation records.
    pub fn truncations(&self) -> impl Iterator<Item = &DiagnosticRecord> {
        self.records
            .iter()
            .filter(|r| matches!(r, DiagnosticRecord::Truncation { .. }))
    }

    /// Invalid-data records.
    pub fn invalid_data(&self) -> impl Iterator<Item = &DiagnosticRecord> {
        self.records
            .iter()
            .filter(|r| matches!(r, DiagnosticRecord::InvalidData { .. }))
    }

    /// Invalid-relation records.
    pub fn invalid_relations(&self) -> impl Iterator<Item = &DiagnosticRecord> {
        self.records
            .iter()
            .filter(|r| matches!(r, DiagnosticRecord::InvalidRelation { .. }))
    }

    /// Combined-collection records.
    pub fn combined_collections(&self) -> impl Iterator<Item = &DiagnosticRecord> {
        self.records
            .iter()
            .filter(|r| matches!(r, DiagnosticRecord::CombinedCollection { .. }))
    }

    /// True when the run produced no diagnostics at all.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.records.is_empty() && self.errors.is_empty()
    }

    /// Renders the report document. Section order is stable; empty sections
    /// are omitted.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!(
            "Import report ({})\n",
            self.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
        ));
        out.push_str(&format!(
            "Policy: {:?}. Entries created: {}, merged: {}, deleted: {}.\n",
            self.policy, self.entries_created, self.entries_merged, self.entries_deleted
        ));

        if !self.new_items.is_empty() {
            out.push_str("\n== New vocabulary items ==\n");
            for item in &self.new_items {
                out.push_str(&format!("  {} (in {})\n", item.label, item.list_name));
            }
        }

        self.render_section(&mut out, "Conflicts", |r| {
            if let DiagnosticRecord::Conflict {
                object,
                duplicate,
                field,
                existing,
                incoming,
                ..
            } = r
            {
                Some(format!(
                    "  {field} on {object}: kept {existing:?}, duplicate {duplicate} carries {incoming:?}"
                ))
            } else {
                None
            }
        });
        self.render_section(&mut out, "Truncated values", |r| {
            if let DiagnosticRecord::Truncation {
                object,
                field,
                ws,
                original,
                stored_len,
            } = r
            {
                Some(format!(
                    "  {field} ({ws}) on {object}: {original:?} stored as {stored_len} chars"
                ))
            } else {
                None
            }
        });
        self.render_section(&mut out, "Invalid data", |r| {
            if let DiagnosticRecord::InvalidData {
                context, detail, ..
            } = r
            {
                Some(format!("  {context}: {detail}"))
            } else {
                None
            }
        });
        self.render_section(&mut out, "Invalid relations", |r| {
            if let DiagnosticRecord::InvalidRelation {
                owner,
                relation_type,
                target,
            } = r
            {
                Some(format!(
                    "  {relation_type} on {owner}: target {target:?} not found"
                ))
            } else {
                None
            }
        });
        self.render_section(&mut out, "Combined collections", |r| {
            if let DiagnosticRecord::CombinedCollection {
                relation_type,
                group,
                detail,
            } = r
            {
                Some(format!("  {relation_type} ({group}): {detail}"))
            } else {
                None
            }
        });

        if !self.errors.is_empty() {
            out.push_str("\n== Errors ==\n");
            for e in &self.errors {
                out.push_str(&format!("  {e}\n"));
            }
        }
        out
    }

    fn render_section(
        &self,
        out: &mut String,
        title: &str,
        line: impl Fn(&DiagnosticRecord) -> Option<String>,
    ) {
        let lines: Vec<String> = self.records.iter().filter_map(&line).collect();
        if lines.is_empty() {
            return;
        }
        out.push_str(&format!("\n== {title} ==\n"));
        for l in lines {
            out.push_str(&l);
            out.push('\n');
        }
    }
}
