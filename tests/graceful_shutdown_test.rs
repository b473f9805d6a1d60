//! Integration tests for graceful shutdown
//!
//! These tests verify that:
//! - Shutdown signals propagate to every receiver
//! - A signal received during an export stops it before the next entry
//! - The interrupted archive is still finalized and readable

use async_trait::async_trait;
use phdc::adapters::source::{ExportSnapshot, PatientSource};
use phdc::config::PhdcConfig;
use phdc::core::export::{ExportCoordinator, ExportSummary};
use phdc::core::verification::verify_archive;
use phdc::domain::{Jurisdiction, PatientBundle, PatientId, PatientRecord, Result};
use std::sync::Arc;
use tempfile::TempDir;
use tokio::sync::watch;

/// Snapshot source that raises the shutdown signal while loading
struct SignallingSource {
    snapshot: ExportSnapshot,
    shutdown: watch::Sender<bool>,
}

#[async_trait]
impl PatientSource for SignallingSource {
    fn describe(&self) -> String {
        "signalling test source".to_string()
    }

    async fn load(&self) -> Result<ExportSnapshot> {
        let _ = self.shutdown.send(true);
        Ok(self.snapshot.clone())
    }
}

fn snapshot(count: u64) -> ExportSnapshot {
    let patients = (1..=count)
        .map(|id| {
            PatientBundle::new(
                PatientRecord::builder().id(PatientId::from(id)).build(),
                vec![],
            )
        })
        .collect();
    ExportSnapshot::new(Jurisdiction::new("USA, State 1"), patients)
}

fn config(dir: &TempDir) -> PhdcConfig {
    let mut config = PhdcConfig::default();
    config.export.output_path = dir.path().join("out.zip").display().to_string();
    config.export.age_reference_date = chrono::NaiveDate::from_ymd_opt(2021, 6, 1);
    config
}

#[tokio::test]
async fn test_shutdown_signal_propagation() {
    let (shutdown_tx, shutdown_rx1) = watch::channel(false);
    let shutdown_rx2 = shutdown_rx1.clone();

    assert!(!*shutdown_rx1.borrow());
    assert!(!*shutdown_rx2.borrow());

    shutdown_tx.send(true).unwrap();

    assert!(*shutdown_rx1.borrow());
    assert!(*shutdown_rx2.borrow());
}

#[tokio::test]
async fn test_signal_during_export_finalizes_archive() {
    let dir = TempDir::new().unwrap();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let source = Arc::new(SignallingSource {
        snapshot: snapshot(25),
        shutdown: shutdown_tx,
    });

    let coordinator = ExportCoordinator::with_source(config(&dir), source, shutdown_rx).unwrap();
    let summary = coordinator.execute_export().await.unwrap();

    assert!(summary.interrupted);
    assert!(!summary.is_successful());
    assert_eq!(summary.total_patients, 25);
    assert!(summary.successful_exports < 25);

    // Whatever was written is a complete, valid archive
    let report = verify_archive(dir.path().join("out.zip")).unwrap();
    assert!(report.is_success());
    assert_eq!(report.total_verified, summary.successful_exports);
}

#[tokio::test]
async fn test_export_without_signal_completes() {
    let dir = TempDir::new().unwrap();
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);

    let coordinator =
        ExportCoordinator::with_source(config(&dir), Arc::new(snapshot(25)), shutdown_rx)
            .unwrap();
    let summary = coordinator.execute_export().await.unwrap();

    assert!(!summary.interrupted);
    assert_eq!(summary.successful_exports, 25);
}

#[tokio::test]
async fn test_dropped_sender_does_not_interrupt() {
    let dir = TempDir::new().unwrap();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    drop(shutdown_tx);

    let coordinator =
        ExportCoordinator::with_source(config(&dir), Arc::new(snapshot(3)), shutdown_rx).unwrap();
    let summary = coordinator.execute_export().await.unwrap();

    assert!(!summary.interrupted);
    assert_eq!(summary.successful_exports, 3);
}

#[test]
fn test_interrupted_summary_is_not_successful() {
    let mut summary = ExportSummary::new();
    summary.total_patients = 10;
    summary.successful_exports = 4;
    assert!(summary.is_successful());

    summary.interrupted = true;
    assert!(!summary.is_successful());
    assert_eq!(summary.successful_exports, 4);
}
