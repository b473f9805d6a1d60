//! Batch serialization of patient documents
//!
//! One document per patient, one archive entry per document, in input order.
//! A failure while building one patient's document (an error or a panic) is
//! logged with the patient id and skipped; archive stream failures abort the
//! batch and name the patient that was in flight.

use crate::adapters::archive::{ArchiveWriter, EntryCompression};
use crate::config::PhdcConfig;
use crate::core::document::DocumentAssembler;
use crate::core::export::summary::{ExportError, ExportErrorType, ExportedEntry};
use crate::core::verification::checksum::calculate_checksum_bytes;
use crate::domain::{Jurisdiction, PatientBundle, PatientRecord, PhdcError, Result};
use std::any::Any;
use std::collections::HashSet;
use std::io::{Seek, Write};
use std::panic::{self, AssertUnwindSafe};
use std::str::FromStr;

/// Configuration for batch processing
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Documents built concurrently (1-64)
    pub parallel_documents: usize,
    /// Entry compression
    pub compression: EntryCompression,
    /// Build every document but write no archive
    pub dry_run: bool,
}

impl BatchConfig {
    /// Create a new batch configuration
    pub fn new(parallel_documents: usize, compression: EntryCompression, dry_run: bool) -> Self {
        Self {
            parallel_documents: parallel_documents.max(1),
            compression,
            dry_run,
        }
    }

    /// Create from the loaded configuration
    pub fn from_config(config: &PhdcConfig) -> Result<Self> {
        let compression = EntryCompression::from_str(&config.export.compression)?;
        Ok(Self::new(
            config.export.parallel_documents,
            compression,
            config.application.dry_run,
        ))
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self::new(1, EntryCompression::default(), false)
    }
}

/// Result of serializing a batch
#[derive(Debug, Clone, Default)]
pub struct BatchResult {
    /// Number of documents produced
    pub successful: usize,
    /// Number of patients without a document
    pub failed: usize,
    /// Patients skipped because their entry name was already taken
    pub duplicates_skipped: usize,
    /// Per-patient errors
    pub errors: Vec<ExportError>,
    /// Produced entries, in archive order
    pub entries: Vec<ExportedEntry>,
}

impl BatchResult {
    /// Create a new empty batch result
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a produced document
    pub fn add_success(&mut self, entry: ExportedEntry) {
        self.successful += 1;
        self.entries.push(entry);
    }

    /// Add a failed patient
    pub fn add_failure(&mut self, error: ExportError) {
        if error.error_type == ExportErrorType::DuplicateEntry {
            self.duplicates_skipped += 1;
        }
        self.failed += 1;
        self.errors.push(error);
    }

    /// Merge another batch result into this one
    pub fn merge(&mut self, other: BatchResult) {
        self.successful += other.successful;
        self.failed += other.failed;
        self.duplicates_skipped += other.duplicates_skipped;
        self.errors.extend(other.errors);
        self.entries.extend(other.entries);
    }
}

/// Builds one patient's document inside a `document` span
///
/// Panics raised while building are caught and returned as
/// [`PhdcError::Document`], so one bad record cannot take the batch down.
pub fn build_document(
    assembler: &DocumentAssembler,
    bundle: &PatientBundle,
    jurisdiction: &Jurisdiction,
    position: usize,
) -> Result<Vec<u8>> {
    let span = tracing::info_span!("document", patient_id = %bundle.patient.label(position));
    let _entered = span.enter();

    let assessments = bundle.symptomatic_assessments();
    panic::catch_unwind(AssertUnwindSafe(|| {
        assembler.assemble(&bundle.patient, jurisdiction, &assessments)
    }))
    .unwrap_or_else(|payload| {
        Err(PhdcError::Document(format!(
            "document construction panicked: {}",
            panic_message(payload.as_ref())
        )))
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}

/// Takes built documents in input order and commits them
///
/// Without an archive (dry run) documents are checksummed and counted only.
/// Duplicate entry names are detected in both modes.
pub struct EntryRecorder<'a, W: Write + Seek> {
    archive: Option<&'a mut ArchiveWriter<W>>,
    names: HashSet<String>,
    result: BatchResult,
}

impl<'a, W: Write + Seek> EntryRecorder<'a, W> {
    pub fn new(archive: Option<&'a mut ArchiveWriter<W>>) -> Self {
        Self {
            archive,
            names: HashSet::new(),
            result: BatchResult::new(),
        }
    }

    /// Records the outcome of one patient
    ///
    /// # Errors
    ///
    /// Only errors that are fatal for the batch are returned; per-patient
    /// failures are logged and recorded in the result.
    pub fn record(
        &mut self,
        position: usize,
        patient: &PatientRecord,
        built: Result<Vec<u8>>,
    ) -> Result<()> {
        let label = patient.label(position);

        let committed = built.and_then(|document| {
            let id = patient.identity()?;
            let entry = id.entry_name();
            if !self.names.insert(entry.clone()) {
                return Err(PhdcError::DuplicateEntry(entry));
            }
            if let Some(archive) = self.archive.as_mut() {
                archive.write_entry(id, &document)?;
            }
            Ok(ExportedEntry {
                patient_id: id.to_string(),
                entry,
                sha256: calculate_checksum_bytes(&document),
                size: document.len(),
            })
        });

        match committed {
            Ok(entry) => {
                tracing::debug!(patient_id = %label, entry = %entry.entry, "Document committed");
                self.result.add_success(entry);
                Ok(())
            }
            Err(error) if error.is_per_patient() => {
                tracing::warn!(
                    patient_id = %label,
                    error = %error,
                    "Skipping patient document"
                );
                self.result
                    .add_failure(ExportError::from(&error).with_patient(label));
                Ok(())
            }
            Err(error) => {
                tracing::error!(patient_id = %label, error = %error, "Archive write failed");
                Err(error)
            }
        }
    }

    /// Number of patients recorded so far
    pub fn recorded(&self) -> usize {
        self.result.successful + self.result.failed
    }

    pub fn into_result(self) -> BatchResult {
        self.result
    }
}

/// Sequential batch serializer
///
/// Builds and writes one document at a time, so memory use stays
/// proportional to a single document.
#[derive(Debug, Clone)]
pub struct BatchSerializer {
    assembler: DocumentAssembler,
}

impl BatchSerializer {
    /// Create a new batch serializer
    pub fn new(assembler: DocumentAssembler) -> Self {
        Self { assembler }
    }

    /// Serializes `patients` into `archive`, in input order
    ///
    /// The archive is left open; call [`ArchiveWriter::finish`] afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`PhdcError::Archive`] naming the in-flight patient when the
    /// archive stream fails. Entries written before the failure stay in the
    /// archive.
    pub fn serialize<W: Write + Seek>(
        &self,
        patients: &[PatientBundle],
        jurisdiction: &Jurisdiction,
        archive: &mut ArchiveWriter<W>,
    ) -> Result<BatchResult> {
        tracing::info!(
            patients = patients.len(),
            jurisdiction = %jurisdiction.path(),
            "Serializing batch"
        );

        let mut recorder = EntryRecorder::new(Some(archive));
        for (position, bundle) in patients.iter().enumerate() {
            let built = build_document(&self.assembler, bundle, jurisdiction, position);
            recorder.record(position, &bundle.patient, built)?;
        }

        let result = recorder.into_result();
        tracing::info!(
            successful = result.successful,
            failed = result.failed,
            "Batch serialized"
        );
        Ok(result)
    }
}
