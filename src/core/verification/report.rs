//! Verification report structures
//!
//! A report lists every archive entry that failed a check, keyed by entry
//! name, with a typed reason.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write as _;
use thiserror::Error;

/// Why an archive entry failed verification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum FailureReason {
    /// The entry could not be read out of the archive
    #[error("Entry could not be read: {0}")]
    Unreadable(String),

    /// Name is not `records/<id>.xml` or carries an unusable id
    #[error("Entry name is not records/<id>.xml: {0}")]
    EntryName(String),

    /// An earlier entry already used the name
    #[error("Duplicate entry name")]
    DuplicateName,

    #[error("Entry is not valid UTF-8: {0}")]
    NotUtf8(String),

    /// quick-xml rejected the document
    #[error("Not well-formed XML: {0}")]
    Malformed(String),

    /// Anything other than exactly one `ClinicalDocument` root
    #[error("Expected a single ClinicalDocument root, found {0}")]
    Root(String),

    /// `id/@extension` missing or different from the entry name's id
    #[error("Document id {found:?} does not match entry id {expected:?}")]
    IdMismatch {
        expected: String,
        found: Option<String>,
    },

    /// Section codes out of order, missing or extra
    #[error("Sections {found:?} do not match the expected {expected:?}")]
    SectionOrder {
        expected: Vec<String>,
        found: Vec<String>,
    },

    /// Entry bytes differ from the SHA-256 recorded at export time
    #[error("Checksum mismatch")]
    ChecksumMismatch,

    /// Exported entry absent from the archive
    #[error("Entry missing from archive")]
    Missing,
}

impl FailureReason {
    /// Short label used to group failures
    pub fn kind(&self) -> &'static str {
        match self {
            FailureReason::Unreadable(_) => "unreadable",
            FailureReason::EntryName(_) => "entry_name",
            FailureReason::DuplicateName => "duplicate_name",
            FailureReason::NotUtf8(_) => "not_utf8",
            FailureReason::Malformed(_) => "malformed",
            FailureReason::Root(_) => "root",
            FailureReason::IdMismatch { .. } => "id_mismatch",
            FailureReason::SectionOrder { .. } => "section_order",
            FailureReason::ChecksumMismatch => "checksum_mismatch",
            FailureReason::Missing => "missing",
        }
    }
}

/// One archive entry that failed verification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationFailure {
    /// Archive entry name, or `#<index>` when the name could not be read
    pub entry: String,
    pub reason: FailureReason,
}

impl VerificationFailure {
    pub fn new(entry: impl Into<String>, reason: FailureReason) -> Self {
        Self {
            entry: entry.into(),
            reason,
        }
    }
}

/// Outcome of verifying one archive
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationReport {
    pub verified_at: DateTime<Utc>,

    /// Entries looked at, plus expected entries found missing
    pub total_verified: usize,

    /// Entries that passed every check including the checksum
    pub passed: usize,

    /// Entries that passed the structural checks with no checksum to compare
    pub unchecked: usize,

    pub failed: usize,

    pub failures: Vec<VerificationFailure>,

    pub duration_ms: u64,
}

impl VerificationReport {
    pub fn new() -> Self {
        Self {
            verified_at: Utc::now(),
            total_verified: 0,
            passed: 0,
            unchecked: 0,
            failed: 0,
            failures: Vec::new(),
            duration_ms: 0,
        }
    }

    pub fn record_pass(&mut self) {
        self.total_verified += 1;
        self.passed += 1;
    }

    pub fn record_unchecked(&mut self) {
        self.total_verified += 1;
        self.unchecked += 1;
    }

    pub fn record_failure(&mut self, failure: VerificationFailure) {
        self.total_verified += 1;
        self.failed += 1;
        self.failures.push(failure);
    }

    pub fn set_duration(&mut self, duration_ms: u64) {
        self.duration_ms = duration_ms;
    }

    /// True when no entry failed
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }

    /// Share of entries without a failure, in percent
    pub fn success_rate(&self) -> f64 {
        if self.total_verified == 0 {
            return 100.0;
        }
        ((self.passed + self.unchecked) as f64 / self.total_verified as f64) * 100.0
    }

    /// Failure counts per [`FailureReason::kind`]
    pub fn failures_by_kind(&self) -> BTreeMap<&'static str, usize> {
        let mut counts = BTreeMap::new();
        for failure in &self.failures {
            *counts.entry(failure.reason.kind()).or_insert(0) += 1;
        }
        counts
    }

    /// Entry names that failed with the given reason kind
    pub fn failed_entries(&self, kind: &str) -> impl Iterator<Item = &str> + '_ {
        let kind = kind.to_string();
        self.failures
            .iter()
            .filter(move |f| f.reason.kind() == kind)
            .map(|f| f.entry.as_str())
    }

    /// Human-readable summary for the console
    pub fn format_summary(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "🔎 Archive verification ({} ms)", self.duration_ms);
        let _ = writeln!(
            out,
            "  Entries: {}  passed: {}  structure only: {}  failed: {}",
            self.total_verified, self.passed, self.unchecked, self.failed
        );

        if self.failures.is_empty() {
            return out;
        }

        for (kind, count) in self.failures_by_kind() {
            let _ = writeln!(out, "  {kind}: {count}");
        }
        let _ = writeln!(out);
        for failure in &self.failures {
            let _ = writeln!(out, "  ❌ {}: {}", failure.entry, failure.reason);
        }
        out
    }
}

impl Default for VerificationReport {
    fn default() -> Self {
        Self::new()
    }
}
