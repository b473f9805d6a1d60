//! Snapshot source abstraction
//!
//! This module defines the trait that snapshot readers must implement to
//! feed the exporter.

use crate::domain::{Jurisdiction, PatientBundle, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Everything needed for one export run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportSnapshot {
    /// Jurisdiction the export is produced for
    pub jurisdiction: Jurisdiction,

    /// Patients in export order
    #[serde(default)]
    pub patients: Vec<PatientBundle>,
}

impl ExportSnapshot {
    /// Creates a snapshot from its parts
    pub fn new(jurisdiction: Jurisdiction, patients: Vec<PatientBundle>) -> Self {
        Self {
            jurisdiction,
            patients,
        }
    }

    /// Number of patients in the snapshot
    pub fn len(&self) -> usize {
        self.patients.len()
    }

    /// Whether the snapshot holds no patients
    pub fn is_empty(&self) -> bool {
        self.patients.is_empty()
    }
}

/// Source of export snapshots
///
/// Implementations must return patients in a stable order; archive entries
/// are written in exactly that order.
#[async_trait]
pub trait PatientSource: Send + Sync {
    /// Human readable description used in logs
    fn describe(&self) -> String;

    /// Loads the full snapshot
    ///
    /// # Errors
    ///
    /// Returns [`crate::domain::PhdcError::Snapshot`] if the snapshot cannot be
    /// read or does not have the expected shape.
    async fn load(&self) -> Result<ExportSnapshot>;
}

#[async_trait]
impl PatientSource for ExportSnapshot {
    fn describe(&self) -> String {
        format!("in-memory snapshot ({} patients)", self.len())
    }

    async fn load(&self) -> Result<ExportSnapshot> {
        Ok(self.clone())
    }
}
