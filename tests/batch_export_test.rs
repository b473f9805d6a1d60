//! Integration tests for batch export
//!
//! These tests verify that:
//! - N patients with unique ids produce exactly N `records/<id>.xml` entries
//! - A failing patient is skipped without stopping the batch
//! - Duplicate ids never overwrite an earlier entry
//! - Dry runs build documents without writing an archive
//! - Archives written by an export verify cleanly

mod common;

use common::{assembler, parse_document, utc};
use phdc::adapters::archive::{ArchiveReader, ArchiveWriter, EntryCompression};
use phdc::config::PhdcConfig;
use phdc::core::export::{BatchSerializer, ExportCoordinator, ExportErrorType};
use phdc::core::verification::{verify_archive, Verifier};
use phdc::domain::{
    Jurisdiction, PatientBundle, PatientId, PatientRecord, SymptomaticAssessment,
};
use std::io::Cursor;
use tempfile::TempDir;
use tokio::sync::watch;

fn bundle(id: Option<u64>) -> PatientBundle {
    let mut builder = PatientRecord::builder().name("Test", None, "Patient");
    if let Some(id) = id {
        builder = builder.id(PatientId::from(id));
    }
    PatientBundle::new(
        builder.build(),
        vec![
            SymptomaticAssessment::new(1, true, utc("2021-05-28T09:00:00Z")),
            SymptomaticAssessment::new(2, false, utc("2021-05-29T09:00:00Z")),
        ],
    )
}

fn entry_names(bytes: Vec<u8>) -> Vec<String> {
    let mut reader = ArchiveReader::new(Cursor::new(bytes)).unwrap();
    (0..reader.len())
        .map(|i| reader.entry(i).unwrap().name)
        .collect()
}

#[test]
fn test_one_entry_per_patient() {
    let patients: Vec<_> = [4, 8, 15, 16, 23, 42].into_iter().map(|id| bundle(Some(id))).collect();
    let mut archive = ArchiveWriter::new(Cursor::new(Vec::new()), EntryCompression::Deflated);

    let result = BatchSerializer::new(assembler())
        .serialize(&patients, &Jurisdiction::new("USA, State 1"), &mut archive)
        .unwrap();

    assert_eq!(result.successful, 6);
    assert_eq!(result.failed, 0);
    let names = entry_names(archive.finish().unwrap().into_inner());
    assert_eq!(
        names,
        vec![
            "records/4.xml",
            "records/8.xml",
            "records/15.xml",
            "records/16.xml",
            "records/23.xml",
            "records/42.xml",
        ]
    );
}

#[test]
fn test_symptomatic_filter_applies_to_entries() {
    let patients = vec![bundle(Some(1))];
    let mut archive = ArchiveWriter::new(Cursor::new(Vec::new()), EntryCompression::Stored);
    BatchSerializer::new(assembler())
        .serialize(&patients, &Jurisdiction::new("USA"), &mut archive)
        .unwrap();

    let mut reader = ArchiveReader::new(archive.finish().unwrap()).unwrap();
    let doc = parse_document(&reader.entry(0).unwrap().bytes);
    let symptoms = doc.sections()[3];
    assert_eq!(symptoms.children_named("entry").count(), 1);
}

#[test]
fn test_failing_patient_is_isolated() {
    let patients = vec![bundle(Some(1)), bundle(None), bundle(Some(3))];
    let mut archive = ArchiveWriter::new(Cursor::new(Vec::new()), EntryCompression::Deflated);

    let result = BatchSerializer::new(assembler())
        .serialize(&patients, &Jurisdiction::new("USA"), &mut archive)
        .unwrap();

    assert_eq!(result.successful, 2);
    assert_eq!(result.failed, 1);
    assert_eq!(result.errors[0].error_type, ExportErrorType::MissingIdentity);
    assert_eq!(
        entry_names(archive.finish().unwrap().into_inner()),
        vec!["records/1.xml", "records/3.xml"]
    );
}

#[test]
fn test_duplicate_id_keeps_first_entry() {
    let mut second = bundle(Some(5));
    second.patient.first_name = Some("Impostor".to_string());
    let patients = vec![bundle(Some(5)), second];
    let mut archive = ArchiveWriter::new(Cursor::new(Vec::new()), EntryCompression::Deflated);

    let result = BatchSerializer::new(assembler())
        .serialize(&patients, &Jurisdiction::new("USA"), &mut archive)
        .unwrap();

    assert_eq!(result.successful, 1);
    assert_eq!(result.duplicates_skipped, 1);

    let mut reader = ArchiveReader::new(archive.finish().unwrap()).unwrap();
    assert_eq!(reader.len(), 1);
    let doc = parse_document(&reader.entry(0).unwrap().bytes);
    let given = doc
        .path("recordTarget/patientRole/patient/name/given")
        .unwrap();
    assert_eq!(given.text, "Test");
}

fn write_snapshot(dir: &TempDir, ids: &[u64]) -> String {
    let patients: Vec<_> = ids
        .iter()
        .map(|id| {
            serde_json::json!({
                "id": id,
                "first_name": "Snap",
                "last_name": "Shot",
                "date_of_birth": "1980-02-29",
                "white": true,
                "updated_at": "2021-06-01T12:00:00Z",
                "created_at": "2021-05-01T08:00:00Z",
                "assessments": [
                    { "id": 1, "symptomatic": true, "updated_at": "2021-05-20T10:00:00Z" }
                ]
            })
        })
        .collect();
    let snapshot = serde_json::json!({
        "jurisdiction": { "path": "USA, State 2" },
        "patients": patients,
    });
    let path = dir.path().join("snapshot.json");
    std::fs::write(&path, serde_json::to_vec_pretty(&snapshot).unwrap()).unwrap();
    path.display().to_string()
}

fn config(dir: &TempDir, ids: &[u64]) -> PhdcConfig {
    let mut config = PhdcConfig::default();
    config.export.input_path = write_snapshot(dir, ids);
    config.export.output_path = dir.path().join("export.zip").display().to_string();
    config.export.parallel_documents = 4;
    config.export.age_reference_date = chrono::NaiveDate::from_ymd_opt(2021, 6, 1);
    config
}

#[tokio::test]
async fn test_export_then_verify_round_trip() {
    let dir = TempDir::new().unwrap();
    let mut config = config(&dir, &[10, 20, 30, 40, 50]);
    config.verification.verify_after_export = true;
    let (_tx, rx) = watch::channel(false);

    let summary = ExportCoordinator::new(config, rx)
        .unwrap()
        .execute_export()
        .await
        .unwrap();

    assert!(summary.is_successful());
    assert_eq!(summary.jurisdiction, "USA, State 2");
    assert_eq!(summary.successful_exports, 5);
    let report = summary.verification_report.as_ref().unwrap();
    assert!(report.is_success());
    assert_eq!(report.passed, 5);

    // Standalone verification of the same archive
    let path = dir.path().join("export.zip");
    let report = verify_archive(&path).unwrap();
    assert_eq!(report.failed, 0);
    assert_eq!(report.total_verified, 5);

    let report = Verifier::new()
        .with_expected(&summary.entries)
        .verify_archive(&path)
        .unwrap();
    assert!(report.is_success());
}

#[tokio::test]
async fn test_repeated_exports_are_byte_identical() {
    let first_dir = TempDir::new().unwrap();
    let second_dir = TempDir::new().unwrap();
    let ids = [3, 1, 2];

    for dir in [&first_dir, &second_dir] {
        let (_tx, rx) = watch::channel(false);
        ExportCoordinator::new(config(dir, &ids), rx)
            .unwrap()
            .execute_export()
            .await
            .unwrap();
    }

    let first = std::fs::read(first_dir.path().join("export.zip")).unwrap();
    let second = std::fs::read(second_dir.path().join("export.zip")).unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_dry_run_detects_duplicates_without_archive() {
    let dir = TempDir::new().unwrap();
    let mut config = config(&dir, &[1, 2, 2]);
    config.application.dry_run = true;
    let (_tx, rx) = watch::channel(false);

    let summary = ExportCoordinator::new(config, rx)
        .unwrap()
        .execute_export()
        .await
        .unwrap();

    assert!(summary.dry_run);
    assert_eq!(summary.successful_exports, 2);
    assert_eq!(summary.duplicates_skipped, 1);
    let failed: Vec<_> = summary.failed_patients().map(|(id, _)| id).collect();
    assert_eq!(failed, vec!["2"]);
    assert!(!dir.path().join("export.zip").exists());
}

#[tokio::test]
async fn test_unusable_ids_in_snapshot_fail_only_their_patients() {
    let dir = TempDir::new().unwrap();
    let mut config = config(&dir, &[]);
    let snapshot = serde_json::json!({
        "jurisdiction": { "path": "USA, State 2" },
        "patients": [
            { "id": 1, "last_name": "One" },
            { "id": "", "last_name": "Blank" },
            { "id": "../escape", "last_name": "Path" },
            { "id": 3, "last_name": "Three" },
        ],
    });
    std::fs::write(&config.export.input_path, serde_json::to_vec(&snapshot).unwrap()).unwrap();
    config.export.parallel_documents = 2;
    let (_tx, rx) = watch::channel(false);

    let summary = ExportCoordinator::new(config, rx)
        .unwrap()
        .execute_export()
        .await
        .unwrap();

    assert_eq!(summary.total_patients, 4);
    assert_eq!(summary.successful_exports, 2);
    assert_eq!(summary.failed_exports, 2);
    assert!(summary
        .errors
        .iter()
        .all(|e| e.error_type == ExportErrorType::MissingIdentity));
    let failed: Vec<_> = summary.failed_patients().map(|(id, _)| id).collect();
    assert_eq!(failed, vec!["<unidentified #1>", "../escape"]);

    let bytes = std::fs::read(dir.path().join("export.zip")).unwrap();
    assert_eq!(entry_names(bytes), vec!["records/1.xml", "records/3.xml"]);
}

#[tokio::test]
async fn test_unreadable_snapshot_is_fatal() {
    let dir = TempDir::new().unwrap();
    let mut config = config(&dir, &[1]);
    config.export.input_path = dir.path().join("missing.json").display().to_string();
    let (_tx, rx) = watch::channel(false);

    let result = ExportCoordinator::new(config, rx)
        .unwrap()
        .execute_export()
        .await;

    assert!(matches!(result, Err(phdc::domain::PhdcError::Snapshot(_))));
}
