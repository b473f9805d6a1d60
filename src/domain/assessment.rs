//! Assessment domain model

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// A daily report submitted by a patient
///
/// Only reports with `symptomatic = true` reach the document; the filter is
/// applied by [`PatientBundle::symptomatic_assessments`](super::PatientBundle::symptomatic_assessments).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymptomaticAssessment {
    /// Assessment identifier
    pub id: u64,

    /// Whether the report met the symptom threshold
    #[serde(default)]
    pub symptomatic: bool,

    /// Last modification time of the report
    pub updated_at: DateTime<FixedOffset>,
}

impl SymptomaticAssessment {
    /// Creates a new assessment
    pub fn new(id: u64, symptomatic: bool, updated_at: DateTime<FixedOffset>) -> Self {
        Self {
            id,
            symptomatic,
            updated_at,
        }
    }
}
