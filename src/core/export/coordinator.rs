//! Export coordinator - main orchestrator for the export process
//!
//! Loads the snapshot, builds documents concurrently on the blocking pool and
//! writes archive entries strictly in input order.

use crate::adapters::archive::ArchiveWriter;
use crate::adapters::source::{JsonSnapshotSource, PatientSource};
use crate::config::PhdcConfig;
use crate::core::document::{AgeAsOf, DocumentAssembler};
use crate::core::export::batch::{build_document, BatchConfig, EntryRecorder};
use crate::core::export::summary::{ExportError, ExportErrorType, ExportSummary};
use crate::core::verification::Verifier;
use crate::domain::{PhdcError, Result};
use crate::vocabulary::VocabularyResolver;
use futures::stream::{self, StreamExt};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;

/// Export coordinator
pub struct ExportCoordinator {
    config: PhdcConfig,
    batch_config: BatchConfig,
    source: Arc<dyn PatientSource>,
    assembler: DocumentAssembler,
    shutdown_signal: watch::Receiver<bool>,
}

impl ExportCoordinator {
    /// Create a coordinator reading the snapshot named in the configuration
    pub fn new(config: PhdcConfig, shutdown_signal: watch::Receiver<bool>) -> Result<Self> {
        let source = Arc::new(JsonSnapshotSource::new(&config.export.input_path));
        Self::with_source(config, source, shutdown_signal)
    }

    /// Create a coordinator over an explicit snapshot source
    pub fn with_source(
        config: PhdcConfig,
        source: Arc<dyn PatientSource>,
        shutdown_signal: watch::Receiver<bool>,
    ) -> Result<Self> {
        let batch_config = BatchConfig::from_config(&config)?;

        let resolver = VocabularyResolver::builtin()?;
        let resolver = match &config.vocabulary.county_table {
            Some(path) => resolver.with_county_table(path)?,
            None => resolver,
        };

        let ages = match config.export.age_reference_date {
            Some(date) => AgeAsOf::new(date),
            None => AgeAsOf::today(),
        };
        tracing::debug!(as_of = %ages.as_of(), "Age reference date");

        let assembler = DocumentAssembler::new(Arc::new(resolver), Arc::new(ages));

        Ok(Self {
            config,
            batch_config,
            source,
            assembler,
            shutdown_signal,
        })
    }

    fn shutdown_requested(&self) -> bool {
        *self.shutdown_signal.borrow()
    }

    /// Execute the export
    ///
    /// 1. Loads the snapshot
    /// 2. Builds up to `parallel_documents` documents at a time
    /// 3. Writes each finished document to the archive in input order
    /// 4. Finalizes the archive, also after a shutdown signal
    /// 5. Optionally verifies the archive
    ///
    /// # Errors
    ///
    /// Snapshot and archive failures abort the export. Per-patient failures
    /// are reported in the returned summary.
    pub async fn execute_export(&self) -> Result<ExportSummary> {
        let start_time = Instant::now();
        let mut summary = ExportSummary::new();
        summary.dry_run = self.batch_config.dry_run;

        tracing::info!(source = %self.source.describe(), "Starting export process");

        if let Err(e) = self.config.validate() {
            summary.add_error(ExportError::new(ExportErrorType::Configuration, e));
            return Ok(summary.with_duration(start_time.elapsed()));
        }

        let snapshot = self.source.load().await?;
        summary.jurisdiction = snapshot.jurisdiction.path().to_string();
        summary.total_patients = snapshot.len();

        crate::log_export_start!(
            snapshot.jurisdiction.path(),
            snapshot.len(),
            self.batch_config.dry_run
        );

        let output_path = PathBuf::from(&self.config.export.output_path);
        let mut archive = if self.batch_config.dry_run {
            tracing::info!("Dry run mode enabled - no archive will be written");
            None
        } else {
            let writer = ArchiveWriter::create(&output_path)?;
            Some(writer.with_compression(self.batch_config.compression))
        };

        let jurisdiction = Arc::new(snapshot.jurisdiction);
        let mut documents = stream::iter(snapshot.patients.into_iter().enumerate())
            .map(|(position, bundle)| {
                let assembler = self.assembler.clone();
                let jurisdiction = Arc::clone(&jurisdiction);
                tokio::task::spawn_blocking(move || {
                    let built = build_document(&assembler, &bundle, &jurisdiction, position);
                    (position, bundle.patient, built)
                })
            })
            .buffered(self.batch_config.parallel_documents);

        let mut recorder = EntryRecorder::new(archive.as_mut());
        while let Some(joined) = documents.next().await {
            if self.shutdown_requested() {
                tracing::warn!(
                    recorded = recorder.recorded(),
                    "Shutdown signal received, finalizing archive with entries written so far"
                );
                summary.interrupted = true;
                break;
            }

            let (position, patient, built) = joined
                .map_err(|e| PhdcError::Other(format!("Document task failed: {e}")))?;
            recorder.record(position, &patient, built)?;
        }
        drop(documents);

        let result = recorder.into_result();
        if let Some(archive) = archive {
            archive.finish()?;
            summary.output_path = Some(output_path.clone());
        }

        summary.successful_exports = result.successful;
        summary.failed_exports = result.failed;
        summary.duplicates_skipped = result.duplicates_skipped;
        summary.errors.extend(result.errors);
        summary.entries = result.entries;

        if self.config.verification.verify_after_export {
            if summary.dry_run || summary.interrupted {
                tracing::warn!("Skipping verification: no complete archive was written");
            } else {
                self.verify(&mut summary, output_path).await;
            }
        }

        summary = summary.with_duration(start_time.elapsed());
        summary.log_summary();

        Ok(summary)
    }

    async fn verify(&self, summary: &mut ExportSummary, output_path: PathBuf) {
        tracing::info!("Running post-export verification");
        let verifier = Verifier::new().with_expected(&summary.entries);

        let outcome = tokio::task::spawn_blocking(move || verifier.verify_archive(&output_path))
            .await
            .map_err(|e| PhdcError::Verification(format!("Verification task failed: {e}")))
            .and_then(|report| report);

        match outcome {
            Ok(report) => {
                tracing::info!(
                    total_verified = report.total_verified,
                    passed = report.passed,
                    failed = report.failed,
                    success_rate = format!("{:.2}%", report.success_rate()),
                    "Verification completed"
                );
                for failure in &report.failures {
                    tracing::warn!(
                        entry = %failure.entry,
                        kind = failure.reason.kind(),
                        reason = %failure.reason,
                        "Verification failure"
                    );
                }
                summary.set_verification_report(report);
            }
            Err(e) => {
                tracing::error!(error = %e, "Verification failed");
                summary.add_error(ExportError::new(
                    ExportErrorType::Verification,
                    format!("Verification failed: {e}"),
                ));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::source::ExportSnapshot;
    use crate::domain::{Jurisdiction, PatientBundle, PatientId, PatientRecord};
    use tempfile::TempDir;

    fn config(dir: &TempDir, dry_run: bool) -> PhdcConfig {
        let mut config = PhdcConfig::default();
        config.application.dry_run = dry_run;
        config.export.output_path = dir.path().join("out.zip").display().to_string();
        config.export.parallel_documents = 3;
        config
    }

    fn snapshot(ids: &[u64]) -> Arc<ExportSnapshot> {
        let patients = ids
            .iter()
            .map(|id| {
                PatientBundle::new(
                    PatientRecord::builder().id(PatientId::from(*id)).build(),
                    vec![],
                )
            })
            .collect();
        Arc::new(ExportSnapshot::new(Jurisdiction::new("USA, State 1"), patients))
    }

    #[tokio::test]
    async fn test_entries_follow_input_order() {
        let dir = TempDir::new().unwrap();
        let (_tx, rx) = watch::channel(false);
        let ids = [5, 3, 9, 1, 7, 2];
        let coordinator =
            ExportCoordinator::with_source(config(&dir, false), snapshot(&ids), rx).unwrap();

        let summary = coordinator.execute_export().await.unwrap();

        assert!(summary.is_successful());
        assert_eq!(summary.total_patients, 6);
        let order: Vec<_> = summary.entries.iter().map(|e| e.patient_id.as_str()).collect();
        assert_eq!(order, vec!["5", "3", "9", "1", "7", "2"]);
        assert!(dir.path().join("out.zip").exists());
    }

    #[tokio::test]
    async fn test_dry_run_writes_no_archive() {
        let dir = TempDir::new().unwrap();
        let (_tx, rx) = watch::channel(false);
        let coordinator =
            ExportCoordinator::with_source(config(&dir, true), snapshot(&[1, 2]), rx).unwrap();

        let summary = coordinator.execute_export().await.unwrap();

        assert!(summary.dry_run);
        assert_eq!(summary.successful_exports, 2);
        assert!(summary.output_path.is_none());
        assert!(!dir.path().join("out.zip").exists());
    }

    #[tokio::test]
    async fn test_shutdown_before_start_finalizes_empty_archive() {
        let dir = TempDir::new().unwrap();
        let (tx, rx) = watch::channel(false);
        tx.send(true).unwrap();
        let coordinator =
            ExportCoordinator::with_source(config(&dir, false), snapshot(&[1, 2, 3]), rx)
                .unwrap();

        let summary = coordinator.execute_export().await.unwrap();

        assert!(summary.interrupted);
        assert_eq!(summary.successful_exports, 0);
        assert!(dir.path().join("out.zip").exists());
    }

    #[tokio::test]
    async fn test_invalid_config_is_reported() {
        let dir = TempDir::new().unwrap();
        let (_tx, rx) = watch::channel(false);
        let mut config = config(&dir, false);
        config.export.output_path = String::new();
        let coordinator = ExportCoordinator::with_source(config, snapshot(&[1]), rx).unwrap();

        let summary = coordinator.execute_export().await.unwrap();

        assert_eq!(summary.errors.len(), 1);
        assert_eq!(summary.errors[0].error_type, ExportErrorType::Configuration);
        assert_eq!(summary.total_patients, 0);
    }
}
