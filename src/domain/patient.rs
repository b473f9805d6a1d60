//! Patient domain model
//!
//! A read-only snapshot of one monitored patient as handed over by the
//! monitoring system. Optional text fields are `Option<String>`; a field that
//! is `None` or whitespace-only counts as blank and its element is omitted from
//! the document.

use super::assessment::SymptomaticAssessment;
use super::errors::PhdcError;
use super::ids::PatientId;
use super::result::Result;
use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};

/// Returns the trimmed field value, or `None` when the field is blank
pub fn non_blank(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Snapshot of a monitored patient
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PatientRecord {
    /// Patient identifier; required to build a document
    ///
    /// A blank id reads as absent.
    #[serde(deserialize_with = "super::ids::deserialize_optional")]
    pub id: Option<PatientId>,

    // Identity
    pub first_name: Option<String>,
    pub middle_name: Option<String>,
    pub last_name: Option<String>,

    // Demographics
    pub date_of_birth: Option<NaiveDate>,
    pub sex: Option<String>,
    pub white: bool,
    pub black_or_african_american: bool,
    pub american_indian_or_alaska_native: bool,
    pub asian: bool,
    pub native_hawaiian_or_other_pacific_islander: bool,
    pub ethnicity: Option<String>,
    pub primary_language: Option<String>,
    pub gender_identity: Option<String>,

    // Home address (domestic)
    pub address_line_1: Option<String>,
    pub address_city: Option<String>,
    pub address_state: Option<String>,
    pub address_zip: Option<String>,
    pub address_county: Option<String>,

    // Monitored address (domestic)
    pub monitored_address_line_1: Option<String>,
    pub monitored_address_city: Option<String>,
    pub monitored_address_state: Option<String>,
    pub monitored_address_zip: Option<String>,
    pub monitored_address_county: Option<String>,

    // Home address (foreign)
    pub foreign_address_line_1: Option<String>,
    pub foreign_address_city: Option<String>,
    pub foreign_address_country: Option<String>,
    pub foreign_address_zip: Option<String>,

    // Contact
    pub primary_telephone: Option<String>,
    pub secondary_telephone: Option<String>,

    // Exposure
    pub potential_exposure_country: Option<String>,
    pub potential_exposure_location: Option<String>,
    pub exposure_notes: Option<String>,

    // Identifiers
    pub user_defined_id_statelocal: Option<String>,

    // Timestamps
    pub created_at: DateTime<FixedOffset>,
    pub updated_at: DateTime<FixedOffset>,
}

/// Race flags in the order their codes are written to the document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RaceFlag {
    White,
    BlackOrAfricanAmerican,
    AmericanIndianOrAlaskaNative,
    Asian,
    NativeHawaiianOrOtherPacificIslander,
}

impl RaceFlag {
    /// All flags in document order
    pub const ALL: [RaceFlag; 5] = [
        RaceFlag::White,
        RaceFlag::BlackOrAfricanAmerican,
        RaceFlag::AmericanIndianOrAlaskaNative,
        RaceFlag::Asian,
        RaceFlag::NativeHawaiianOrOtherPacificIslander,
    ];
}

impl PatientRecord {
    /// Creates a new builder for constructing a PatientRecord
    pub fn builder() -> PatientRecordBuilder {
        PatientRecordBuilder::default()
    }

    /// Whether the given race flag is set
    pub fn has_race(&self, flag: RaceFlag) -> bool {
        match flag {
            RaceFlag::White => self.white,
            RaceFlag::BlackOrAfricanAmerican => self.black_or_african_american,
            RaceFlag::AmericanIndianOrAlaskaNative => self.american_indian_or_alaska_native,
            RaceFlag::Asian => self.asian,
            RaceFlag::NativeHawaiianOrOtherPacificIslander => {
                self.native_hawaiian_or_other_pacific_islander
            }
        }
    }

    /// Race flags that are set, in fixed document order
    pub fn races(&self) -> impl Iterator<Item = RaceFlag> + '_ {
        RaceFlag::ALL.into_iter().filter(|flag| self.has_race(*flag))
    }

    /// Primary telephone, falling back to the secondary one
    pub fn contact_telephone(&self) -> Option<&str> {
        non_blank(&self.primary_telephone).or_else(|| non_blank(&self.secondary_telephone))
    }

    /// The id this patient's document is filed under
    ///
    /// # Errors
    ///
    /// [`PhdcError::MissingPatientIdentity`] without an id and
    /// [`PhdcError::UnusablePatientIdentity`] when the id cannot name an
    /// archive entry.
    pub fn identity(&self) -> Result<&PatientId> {
        let id = self.id.as_ref().ok_or(PhdcError::MissingPatientIdentity)?;
        id.validate().map_err(PhdcError::UnusablePatientIdentity)?;
        Ok(id)
    }

    /// Label used in logs and failure reports
    ///
    /// Records without an id are labelled by their position in the batch.
    pub fn label(&self, position: usize) -> String {
        match &self.id {
            Some(id) => id.to_string(),
            None => format!("<unidentified #{position}>"),
        }
    }
}

/// A patient together with the assessments reported for them
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PatientBundle {
    /// The patient snapshot
    #[serde(flatten)]
    pub patient: PatientRecord,

    /// All assessments reported by the patient, in snapshot order
    #[serde(default)]
    pub assessments: Vec<SymptomaticAssessment>,
}

impl PatientBundle {
    /// Creates a bundle from a patient and its assessments
    pub fn new(patient: PatientRecord, assessments: Vec<SymptomaticAssessment>) -> Self {
        Self {
            patient,
            assessments,
        }
    }

    /// Assessments flagged symptomatic, in the order supplied
    pub fn symptomatic_assessments(&self) -> Vec<SymptomaticAssessment> {
        self.assessments
            .iter()
            .filter(|a| a.symptomatic)
            .cloned()
            .collect()
    }
}

/// Builder for constructing PatientRecord instances
#[derive(Debug, Default)]
pub struct PatientRecordBuilder {
    record: PatientRecord,
}

impl PatientRecordBuilder {
    /// Creates a new PatientRecordBuilder
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the patient ID
    pub fn id(mut self, id: PatientId) -> Self {
        self.record.id = Some(id);
        self
    }

    /// Sets first, middle and last name
    pub fn name(mut self, first: &str, middle: Option<&str>, last: &str) -> Self {
        self.record.first_name = Some(first.to_string());
        self.record.middle_name = middle.map(str::to_string);
        self.record.last_name = Some(last.to_string());
        self
    }

    /// Sets the date of birth
    pub fn date_of_birth(mut self, date_of_birth: NaiveDate) -> Self {
        self.record.date_of_birth = Some(date_of_birth);
        self
    }

    /// Sets the sex
    pub fn sex(mut self, sex: &str) -> Self {
        self.record.sex = Some(sex.to_string());
        self
    }

    /// Sets a race flag
    pub fn race(mut self, flag: RaceFlag) -> Self {
        match flag {
            RaceFlag::White => self.record.white = true,
            RaceFlag::BlackOrAfricanAmerican => self.record.black_or_african_american = true,
            RaceFlag::AmericanIndianOrAlaskaNative => {
                self.record.american_indian_or_alaska_native = true
            }
            RaceFlag::Asian => self.record.asian = true,
            RaceFlag::NativeHawaiianOrOtherPacificIslander => {
                self.record.native_hawaiian_or_other_pacific_islander = true
            }
        }
        self
    }

    /// Sets the ethnicity
    pub fn ethnicity(mut self, ethnicity: &str) -> Self {
        self.record.ethnicity = Some(ethnicity.to_string());
        self
    }

    /// Sets the primary language
    pub fn primary_language(mut self, language: &str) -> Self {
        self.record.primary_language = Some(language.to_string());
        self
    }

    /// Sets the gender identity
    pub fn gender_identity(mut self, gender_identity: &str) -> Self {
        self.record.gender_identity = Some(gender_identity.to_string());
        self
    }

    /// Sets the domestic home address
    pub fn home_address(
        mut self,
        line_1: &str,
        city: &str,
        state: &str,
        zip: &str,
        county: &str,
    ) -> Self {
        self.record.address_line_1 = Some(line_1.to_string());
        self.record.address_city = Some(city.to_string());
        self.record.address_state = Some(state.to_string());
        self.record.address_zip = Some(zip.to_string());
        self.record.address_county = Some(county.to_string());
        self
    }

    /// Sets the primary telephone
    pub fn primary_telephone(mut self, telephone: &str) -> Self {
        self.record.primary_telephone = Some(telephone.to_string());
        self
    }

    /// Sets the secondary telephone
    pub fn secondary_telephone(mut self, telephone: &str) -> Self {
        self.record.secondary_telephone = Some(telephone.to_string());
        self
    }

    /// Sets exposure country and location
    pub fn exposure(mut self, country: Option<&str>, location: Option<&str>) -> Self {
        self.record.potential_exposure_country = country.map(str::to_string);
        self.record.potential_exposure_location = location.map(str::to_string);
        self
    }

    /// Sets exposure notes
    pub fn exposure_notes(mut self, notes: &str) -> Self {
        self.record.exposure_notes = Some(notes.to_string());
        self
    }

    /// Sets the state/local user-defined id
    pub fn state_local_id(mut self, id: &str) -> Self {
        self.record.user_defined_id_statelocal = Some(id.to_string());
        self
    }

    /// Sets the creation timestamp
    pub fn created_at(mut self, created_at: DateTime<FixedOffset>) -> Self {
        self.record.created_at = created_at;
        self
    }

    /// Sets the last-updated timestamp
    pub fn updated_at(mut self, updated_at: DateTime<FixedOffset>) -> Self {
        self.record.updated_at = updated_at;
        self
    }

    /// Builds the PatientRecord
    pub fn build(self) -> PatientRecord {
        self.record
    }
}
