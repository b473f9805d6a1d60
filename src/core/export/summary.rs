//! Export summary and reporting
//!
//! This module defines structures for tracking and reporting export results.

use crate::core::verification::report::VerificationReport;
use crate::domain::PhdcError;
use std::path::PathBuf;
use std::time::Duration;

/// One document written (or, in dry-run mode, built) for a patient
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedEntry {
    /// Patient id the document was built for
    pub patient_id: String,

    /// Archive entry name, `records/<patient_id>.xml`
    pub entry: String,

    /// Hex SHA-256 of the document bytes
    pub sha256: String,

    /// Document size in bytes
    pub size: usize,
}

/// Summary of an export operation
#[derive(Debug, Clone)]
pub struct ExportSummary {
    /// Jurisdiction path of the snapshot
    pub jurisdiction: String,

    /// Number of patients in the snapshot
    pub total_patients: usize,

    /// Number of documents written
    pub successful_exports: usize,

    /// Number of patients without a document
    pub failed_exports: usize,

    /// Number of patients skipped because their entry name was taken
    pub duplicates_skipped: usize,

    /// Duration of the export
    pub duration: Duration,

    /// Errors encountered during export, per patient where known
    pub errors: Vec<ExportError>,

    /// Documents produced, in archive order
    pub entries: Vec<ExportedEntry>,

    /// Archive written, `None` in dry-run mode
    pub output_path: Option<PathBuf>,

    /// Documents were built but no archive was written
    pub dry_run: bool,

    /// A shutdown signal stopped the export early
    pub interrupted: bool,

    /// Verification report (if verification was run)
    pub verification_report: Option<VerificationReport>,
}

impl ExportSummary {
    /// Create a new empty export summary
    pub fn new() -> Self {
        Self {
            jurisdiction: String::new(),
            total_patients: 0,
            successful_exports: 0,
            failed_exports: 0,
            duplicates_skipped: 0,
            duration: Duration::from_secs(0),
            errors: Vec::new(),
            entries: Vec::new(),
            output_path: None,
            dry_run: false,
            interrupted: false,
            verification_report: None,
        }
    }

    /// Set the duration
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Add an error
    pub fn add_error(&mut self, error: ExportError) {
        self.errors.push(error);
    }

    /// Set the verification report
    pub fn set_verification_report(&mut self, report: VerificationReport) {
        self.verification_report = Some(report);
    }

    /// Patients that did not get a document, with the reason
    pub fn failed_patients(&self) -> impl Iterator<Item = (&str, &str)> {
        self.errors.iter().filter_map(|error| {
            error
                .patient
                .as_deref()
                .map(|patient| (patient, error.message.as_str()))
        })
    }

    /// Check if the export was successful (no failures)
    pub fn is_successful(&self) -> bool {
        self.failed_exports == 0 && self.errors.is_empty() && !self.interrupted
    }

    /// Get success rate as a percentage
    pub fn success_rate(&self) -> f64 {
        let attempted = self.successful_exports + self.failed_exports;
        if attempted == 0 {
            return 100.0;
        }
        (self.successful_exports as f64 / attempted as f64) * 100.0
    }

    /// Log the summary
    pub fn log_summary(&self) {
        tracing::info!(
            jurisdiction = %self.jurisdiction,
            total_patients = self.total_patients,
            successful = self.successful_exports,
            failed = self.failed_exports,
            duplicates_skipped = self.duplicates_skipped,
            dry_run = self.dry_run,
            interrupted = self.interrupted,
            duration_secs = self.duration.as_secs(),
            success_rate = format!("{:.2}%", self.success_rate()),
            "Export completed"
        );

        if !self.errors.is_empty() {
            tracing::warn!(
                error_count = self.errors.len(),
                "Export completed with errors"
            );
            for error in &self.errors {
                tracing::warn!(
                    error_type = ?error.error_type,
                    patient_id = error.patient.as_deref().unwrap_or("-"),
                    message = %error.message,
                    "Export error"
                );
            }
        }
    }
}

impl Default for ExportSummary {
    fn default() -> Self {
        Self::new()
    }
}

/// Type of export error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportErrorType {
    /// Patient record without an identifier
    MissingIdentity,
    /// Document construction failed or panicked
    Document,
    /// Entry name already used by an earlier patient
    DuplicateEntry,
    /// Snapshot could not be loaded
    Snapshot,
    /// Archive stream failure
    Archive,
    /// Configuration error
    Configuration,
    /// Post-export verification could not run
    Verification,
    /// Unknown error
    Unknown,
}

impl From<&PhdcError> for ExportErrorType {
    fn from(error: &PhdcError) -> Self {
        match error {
            PhdcError::MissingPatientIdentity | PhdcError::UnusablePatientIdentity(_) => {
                ExportErrorType::MissingIdentity
            }
            PhdcError::Document(_) | PhdcError::Serialization(_) => ExportErrorType::Document,
            PhdcError::DuplicateEntry(_) => ExportErrorType::DuplicateEntry,
            PhdcError::Snapshot(_) => ExportErrorType::Snapshot,
            PhdcError::Archive { .. } | PhdcError::Io(_) => ExportErrorType::Archive,
            PhdcError::Configuration(_) | PhdcError::Validation(_) => {
                ExportErrorType::Configuration
            }
            PhdcError::Verification(_) => ExportErrorType::Verification,
            PhdcError::Vocabulary(_) | PhdcError::Other(_) => ExportErrorType::Unknown,
        }
    }
}

/// Export error with context
#[derive(Debug, Clone)]
pub struct ExportError {
    /// Type of error
    pub error_type: ExportErrorType,

    /// Error message
    pub message: String,

    /// Patient the error belongs to (id, or a positional label)
    pub patient: Option<String>,
}

impl ExportError {
    /// Create a new export error
    pub fn new(error_type: ExportErrorType, message: String) -> Self {
        Self {
            error_type,
            message,
            patient: None,
        }
    }

    /// Attach the patient the error belongs to
    pub fn with_patient(mut self, patient: impl Into<String>) -> Self {
        self.patient = Some(patient.into());
        self
    }
}

impl From<&PhdcError> for ExportError {
    fn from(error: &PhdcError) -> Self {
        ExportError::new(ExportErrorType::from(error), error.to_string())
    }
}
