//! JSON snapshot files

use super::traits::{ExportSnapshot, PatientSource};
use crate::domain::{PhdcError, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Reads an [`ExportSnapshot`] from a JSON file
///
/// ```json
/// {
///   "jurisdiction": { "path": "USA, State 1" },
///   "patients": [
///     { "id": 42, "first_name": "Jane", "assessments": [] }
///   ]
/// }
/// ```
#[derive(Debug, Clone)]
pub struct JsonSnapshotSource {
    path: PathBuf,
}

impl JsonSnapshotSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl PatientSource for JsonSnapshotSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    async fn load(&self) -> Result<ExportSnapshot> {
        let content = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            PhdcError::Snapshot(format!(
                "Failed to read snapshot {}: {e}",
                self.path.display()
            ))
        })?;

        let snapshot: ExportSnapshot = serde_json::from_str(&content).map_err(|e| {
            PhdcError::Snapshot(format!(
                "Failed to parse snapshot {}: {e}",
                self.path.display()
            ))
        })?;

        tracing::info!(
            path = %self.path.display(),
            patients = snapshot.len(),
            jurisdiction = %snapshot.jurisdiction.path(),
            "Loaded patient snapshot"
        );

        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn test_load_snapshot() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "jurisdiction": {{ "path": "USA, State 1" }},
                "patients": [
                    {{
                        "id": 42,
                        "first_name": "Jane",
                        "last_name": "Doe",
                        "date_of_birth": "1990-01-01",
                        "white": true,
                        "created_at": "2021-05-01T08:00:00Z",
                        "updated_at": "2021-06-01T12:00:00Z",
                        "assessments": [
                            {{ "id": 1, "symptomatic": true, "updated_at": "2021-05-02T09:00:00-04:00" }},
                            {{ "id": 2, "symptomatic": false, "updated_at": "2021-05-03T09:00:00-04:00" }}
                        ]
                    }},
                    {{ "id": "abc-7" }}
                ]
            }}"#
        )
        .unwrap();

        let snapshot = JsonSnapshotSource::new(file.path()).load().await.unwrap();
        assert_eq!(snapshot.jurisdiction.path(), "USA, State 1");
        assert_eq!(snapshot.len(), 2);

        let jane = &snapshot.patients[0];
        assert_eq!(jane.patient.id.as_ref().unwrap().as_str(), "42");
        assert!(jane.patient.white);
        assert_eq!(jane.assessments.len(), 2);
        assert_eq!(jane.symptomatic_assessments().len(), 1);

        let second = &snapshot.patients[1];
        assert_eq!(second.patient.id.as_ref().unwrap().as_str(), "abc-7");
        assert!(second.assessments.is_empty());
    }

    #[tokio::test]
    async fn test_unusable_ids_do_not_fail_the_snapshot() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"jurisdiction": {{"path": "USA"}}, "patients": [{{"id": 1}}, {{"id": ""}}, {{"id": "a/b"}}, {{"id": 3}}]}}"#
        )
        .unwrap();

        let snapshot = JsonSnapshotSource::new(file.path()).load().await.unwrap();
        assert_eq!(snapshot.len(), 4);
        assert!(snapshot.patients[1].patient.id.is_none());
        assert!(snapshot.patients[2].patient.identity().is_err());
    }

    #[tokio::test]
    async fn test_missing_file_is_snapshot_error() {
        let source = JsonSnapshotSource::new("/nonexistent/snapshot.json");
        let result = source.load().await;
        assert!(matches!(result, Err(PhdcError::Snapshot(_))));
    }

    #[tokio::test]
    async fn test_malformed_file_is_snapshot_error() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{{ \"patients\": 3 }}").unwrap();

        let result = JsonSnapshotSource::new(file.path()).load().await;
        assert!(matches!(result, Err(PhdcError::Snapshot(_))));
    }
}
