//! Document assembler
//!
//! Composes the header, record target, author, custodian and the four body
//! sections into one [`ClinicalDocument`] per patient, then serializes it.
//! The result depends only on the inputs and the injected collaborators.

use super::age::AgeCalculator;
use super::nodes::{
    coded_value, format_date, format_timestamp, CodedElement, ElementName, Section,
};
use super::sections;
use super::writer;
use crate::domain::{
    non_blank, Jurisdiction, PatientRecord, Result, SymptomaticAssessment,
};
use crate::vocabulary::codes::{self, header, oid};
use crate::vocabulary::{CodeableValue, VocabularyResolver};
use std::sync::Arc;

/// Fixed header block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub id: String,
    pub code: CodeableValue,
    pub title: String,
    pub effective_time: String,
}

/// Home address; `None` parts are left out of the document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Address {
    pub street: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub county: Option<String>,
    pub country: String,
}

/// Legal name; `None` parts are left out of the document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersonName {
    pub given: Option<String>,
    pub middle: Option<String>,
    pub family: Option<String>,
}

/// Patient demographics inside the record target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Demographics {
    pub name: PersonName,
    pub gender: Option<CodedElement>,
    pub birth_time: Option<String>,
    /// One coded entry per race flag, in the fixed race order
    ///
    /// CDA allows a single `raceCode` per patient, so only the first entry is
    /// written as `raceCode`. Every further race is an `sdtc:raceCode`
    /// sibling. Readers that want all races must collect both element names.
    pub races: Vec<CodedElement>,
    pub ethnicity: Option<CodedElement>,
}

/// Record target / patient role
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordTarget {
    pub patient_id: String,
    pub address: Address,
    pub telecom: Option<String>,
    pub patient: Demographics,
}

/// Organization named in the author and custodian blocks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Organization {
    pub id_root: &'static str,
    pub name: String,
}

/// Author block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Author {
    pub time: String,
    pub organization: Organization,
}

/// Root of a PHDC document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClinicalDocument {
    pub header: Header,
    pub record_target: RecordTarget,
    pub author: Author,
    pub custodian: Organization,
    /// Social History, Clinical Information, Exposure, Signs and Symptoms
    pub sections: [Section; 4],
}

/// Builds PHDC documents for single patients
///
/// Cloning is cheap; the resolver and age calculator are shared.
#[derive(Clone)]
pub struct DocumentAssembler {
    resolver: Arc<VocabularyResolver>,
    ages: Arc<dyn AgeCalculator>,
}

impl std::fmt::Debug for DocumentAssembler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentAssembler").finish_non_exhaustive()
    }
}

impl DocumentAssembler {
    /// Creates an assembler over shared collaborators
    pub fn new(resolver: Arc<VocabularyResolver>, ages: Arc<dyn AgeCalculator>) -> Self {
        Self { resolver, ages }
    }

    /// Builds the document model for one patient
    ///
    /// `assessments` must already be filtered to symptomatic reports and
    /// ordered as they should appear.
    ///
    /// # Errors
    ///
    /// Returns [`crate::domain::PhdcError::MissingPatientIdentity`] if the patient has no id
    /// and [`crate::domain::PhdcError::UnusablePatientIdentity`] if the id cannot name an
    /// archive entry.
    /// Absent optional data never fails.
    pub fn build(
        &self,
        patient: &PatientRecord,
        jurisdiction: &Jurisdiction,
        assessments: &[SymptomaticAssessment],
    ) -> Result<ClinicalDocument> {
        let id = patient.identity()?.as_str();

        let organization_name = format!("{}{}", header::ORGANIZATION_PREFIX, jurisdiction.path());

        Ok(ClinicalDocument {
            header: Header {
                id: id.to_string(),
                code: codes::document_type(),
                title: header::TITLE.to_string(),
                effective_time: format_timestamp(&patient.updated_at),
            },
            record_target: RecordTarget {
                patient_id: id.to_string(),
                address: self.address(patient),
                telecom: patient.contact_telephone().map(str::to_string),
                patient: demographics(patient),
            },
            author: Author {
                time: format_timestamp(&patient.created_at),
                organization: Organization {
                    id_root: oid::AUTHOR_ID_ROOT,
                    name: organization_name.clone(),
                },
            },
            custodian: Organization {
                id_root: oid::CUSTODIAN_ID_ROOT,
                name: organization_name,
            },
            sections: [
                sections::social_history(patient, id, self.ages.as_ref()),
                sections::clinical_information(patient, id),
                sections::exposure(patient, id, &self.resolver),
                sections::signs_and_symptoms(assessments, id),
            ],
        })
    }

    /// Builds and serializes the document for one patient
    ///
    /// Returns the UTF-8 bytes of the complete XML document.
    pub fn assemble(
        &self,
        patient: &PatientRecord,
        jurisdiction: &Jurisdiction,
        assessments: &[SymptomaticAssessment],
    ) -> Result<Vec<u8>> {
        let document = self.build(patient, jurisdiction, assessments)?;
        writer::to_xml(&document)
    }

    fn address(&self, patient: &PatientRecord) -> Address {
        let state_name = non_blank(&patient.address_state);
        let county = non_blank(&patient.address_county).map(|county| {
            self.resolver
                .county_code(state_name.unwrap_or_default(), county)
                .code()
                .to_string()
        });

        Address {
            street: non_blank(&patient.address_line_1).map(str::to_string),
            city: non_blank(&patient.address_city).map(str::to_string),
            state: state_name.map(|name| self.resolver.state_code(name).code().to_string()),
            postal_code: non_blank(&patient.address_zip).map(str::to_string),
            county,
            country: header::COUNTRY_UNITED_STATES.to_string(),
        }
    }
}

fn demographics(patient: &PatientRecord) -> Demographics {
    // CDA allows one raceCode; further races go to sdtc:raceCode.
    let races = patient
        .races()
        .enumerate()
        .map(|(i, flag)| {
            let element = if i == 0 {
                ElementName::RaceCode
            } else {
                ElementName::SdtcRaceCode
            };
            coded_value(codes::race(flag), element)
        })
        .collect();

    Demographics {
        name: PersonName {
            given: non_blank(&patient.first_name).map(str::to_string),
            middle: non_blank(&patient.middle_name).map(str::to_string),
            family: non_blank(&patient.last_name).map(str::to_string),
        },
        gender: non_blank(&patient.sex)
            .and_then(codes::administrative_gender)
            .map(|value| coded_value(value, ElementName::AdministrativeGenderCode)),
        birth_time: patient.date_of_birth.as_ref().map(format_date),
        races,
        ethnicity: non_blank(&patient.ethnicity)
            .map(|text| coded_value(codes::ethnicity(text), ElementName::EthnicGroupCode)),
    }
}
