//! Typed vocabulary table
//!
//! Every OID, LOINC/SNOMED code and local NBS question code written into a
//! document lives here. Builders refer to codes by symbol; these values are a
//! contract with the receiving surveillance system and must not drift.

use crate::domain::RaceFlag;
use serde::{Deserialize, Serialize};

/// Object identifiers for code systems and identifier roots
pub mod oid {
    /// LOINC
    pub const LOINC: &str = "2.16.840.1.113883.6.1";
    /// SNOMED CT
    pub const SNOMED_CT: &str = "2.16.840.1.113883.6.96";
    /// CDC Race & Ethnicity
    pub const RACE_AND_ETHNICITY: &str = "2.16.840.1.113883.6.238";
    /// HL7 AdministrativeGender
    pub const ADMINISTRATIVE_GENDER: &str = "2.16.840.1.113883.5.1";
    /// HL7 Confidentiality
    pub const CONFIDENTIALITY: &str = "2.16.840.1.113883.5.25";
    /// HL7 NullFlavor
    pub const NULL_FLAVOR: &str = "2.16.840.1.113883.5.1008";
    /// HL7 Yes/No Indicator (table 0136)
    pub const YES_NO_INDICATOR: &str = "2.16.840.1.113883.12.136";
    /// UCUM units
    pub const UCUM: &str = "2.16.840.1.113883.6.8";
    /// ISO 639-2 language codes
    pub const ISO_639_2: &str = "1.0.639.2";
    /// ISO 3166-1 alpha-3 country codes
    pub const ISO_3166_ALPHA_3: &str = "1.0.3166.1.2.3";
    /// FIPS 5-2 state codes
    pub const FIPS_STATE: &str = "2.16.840.1.113883.6.92";
    /// FIPS 6-4 county codes
    pub const FIPS_COUNTY: &str = "2.16.840.1.113883.6.93";
    /// NEDSS Base System question identifiers
    pub const NEDSS_BASE_SYSTEM: &str = "2.16.840.1.114222.4.5.1";
    /// Placeholder code system used by NBS for repeating-question blocks
    pub const LOCAL_CODE_SYSTEM: &str = "Local-codesystem-oid";
    /// CDA R2 type identifier root
    pub const CDA_TYPE_ID: &str = "2.16.840.1.113883.1.3";
    /// Root for document, set and section identifiers
    pub const DOCUMENT_ID_ROOT: &str = "2.16.840.1.113883.19";
    /// Root for the authoring system identifier
    pub const AUTHOR_ID_ROOT: &str = "2.16.840.1.113883.19.5";
    /// Root for the custodian organization identifier
    pub const CUSTODIAN_ID_ROOT: &str = "2.16.840.1.113883.19.6";
}

/// Fixed header values of every document
pub mod header {
    /// Realm of the document
    pub const REALM: &str = "US";
    /// CDA R2 type identifier extension
    pub const TYPE_ID_EXTENSION: &str = "POCD_HD000040";
    /// Document title
    pub const TITLE: &str = "Public Health Case Report - Data from Sara Alert";
    /// Confidentiality code (normal)
    pub const CONFIDENTIALITY: &str = "N";
    /// Document language
    pub const LANGUAGE: &str = "ENG";
    /// Document version
    pub const VERSION_NUMBER: &str = "1";
    /// Address use (home)
    pub const ADDRESS_USE: &str = "H";
    /// Telecom use (primary home)
    pub const TELECOM_USE: &str = "HP";
    /// Name use (legal)
    pub const NAME_USE: &str = "L";
    /// Country written on every address (ISO 3166-1 numeric, United States)
    pub const COUNTRY_UNITED_STATES: &str = "840";
    /// Prefix of the author and custodian organization name
    pub const ORGANIZATION_PREFIX: &str = "Sara Alert NBS Export: ";
    /// Stylesheet referenced by the processing instruction
    pub const STYLESHEET: &str = "PHDC.xsl";
    /// HL7 v3 namespace
    pub const NAMESPACE: &str = "urn:hl7-org:v3";
    /// SDTC extension namespace
    pub const SDTC_NAMESPACE: &str = "urn:hl7-org:sdtc";
    /// XML Schema instance namespace
    pub const XSI_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";
    /// Schema location hint
    pub const SCHEMA_LOCATION: &str = "urn:hl7-org:v3 CDA_SDTC.xsd";
}

/// The fundamental coded unit of a document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeableValue {
    pub code: String,
    pub code_system: String,
    pub code_system_name: Option<String>,
    pub display_name: String,
}

impl CodeableValue {
    /// Creates a coded value without a code system name
    pub fn new(
        code: impl Into<String>,
        code_system: impl Into<String>,
        display_name: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            code_system: code_system.into(),
            code_system_name: None,
            display_name: display_name.into(),
        }
    }

    /// Sets the human-readable code system name
    pub fn with_system_name(mut self, name: impl Into<String>) -> Self {
        self.code_system_name = Some(name.into());
        self
    }

    /// HL7 null-flavor "Unknown", used for unmapped lookups
    pub fn unknown() -> Self {
        Self::new("UNK", oid::NULL_FLAVOR, "Unknown").with_system_name("NullFlavor")
    }

    /// Whether both code and code system are present
    pub fn is_complete(&self) -> bool {
        !self.code.trim().is_empty() && !self.code_system.trim().is_empty()
    }
}

fn loinc(code: &str, display: &str) -> CodeableValue {
    CodeableValue::new(code, oid::LOINC, display).with_system_name("LOINC")
}

fn nbs(code: &str, display: &str) -> CodeableValue {
    CodeableValue::new(code, oid::NEDSS_BASE_SYSTEM, display).with_system_name("NEDSS Base System")
}

fn local(code: &str, display: &str) -> CodeableValue {
    CodeableValue::new(code, oid::LOCAL_CODE_SYSTEM, display).with_system_name("LocalSystem")
}

/// Document type code
pub fn document_type() -> CodeableValue {
    loinc("55751-2", "Public Health Case Report")
}

/// The four body sections, in document order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionCode {
    SocialHistory,
    ClinicalInformation,
    Exposure,
    SignsAndSymptoms,
}

impl SectionCode {
    /// Sections in the order they appear in the body
    pub const ORDER: [SectionCode; 4] = [
        SectionCode::SocialHistory,
        SectionCode::ClinicalInformation,
        SectionCode::Exposure,
        SectionCode::SignsAndSymptoms,
    ];

    pub fn codeable(self) -> CodeableValue {
        match self {
            SectionCode::SocialHistory => loinc("29762-2", "Social History"),
            SectionCode::ClinicalInformation => loinc("55752-0", "Clinical Information"),
            SectionCode::Exposure => local("1234567-RPT", "Generic Repeating questions Section"),
            SectionCode::SignsAndSymptoms => loinc("10187-3", "Signs and Symptoms"),
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            SectionCode::SocialHistory => "SOCIAL HISTORY INFORMATION",
            SectionCode::ClinicalInformation => "CLINICAL INFORMATION",
            SectionCode::Exposure => "REPEATING QUESTIONS",
            SectionCode::SignsAndSymptoms => "SIGNS AND SYMPTOMS",
        }
    }
}

/// Observation and organizer codes (NBS questions and local groupings)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionCode {
    PrimaryLanguage,
    SpeaksEnglish,
    ReportedAge,
    ReportedAgeUnits,
    GenderIdentity,
    StateCaseId,
    LocalPatientId,
    ExposureInformation,
    CountryOfExposure,
    CityOfExposure,
    ExposureNotesGroup,
    ExposureNotes,
    DailyReport,
}

impl QuestionCode {
    pub fn codeable(self) -> CodeableValue {
        match self {
            QuestionCode::PrimaryLanguage => nbs("DEM142", "Patient Primary Language"),
            QuestionCode::SpeaksEnglish => nbs("NBS214", "Patient Speaks English"),
            QuestionCode::ReportedAge => nbs("INV2001", "Reported Age"),
            QuestionCode::ReportedAgeUnits => nbs("INV2002", "Reported Age Units"),
            QuestionCode::GenderIdentity => nbs("NBS274", "Gender Identity"),
            QuestionCode::StateCaseId => nbs("INV173", "State Case ID"),
            QuestionCode::LocalPatientId => nbs("DEM197", "Local Patient ID"),
            QuestionCode::ExposureInformation => local("EXPOSURE_INFO", "Exposure Information"),
            QuestionCode::CountryOfExposure => nbs("INV502", "Country of Exposure"),
            QuestionCode::CityOfExposure => nbs("INV504", "City of Exposure"),
            QuestionCode::ExposureNotesGroup => local("EXPOSURE_NOTES", "Exposure Notes"),
            QuestionCode::ExposureNotes => nbs("INV167", "Exposure Notes"),
            QuestionCode::DailyReport => local("DAILY_REPORT", "Daily Report"),
        }
    }
}

/// Fixed coded answers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerCode {
    English,
    Yes,
    Year,
    Symptomatic,
}

impl AnswerCode {
    pub fn codeable(self) -> CodeableValue {
        match self {
            AnswerCode::English => {
                CodeableValue::new("ENG", oid::ISO_639_2, "English").with_system_name("ISO 639-2")
            }
            AnswerCode::Yes => CodeableValue::new("Y", oid::YES_NO_INDICATOR, "Yes")
                .with_system_name("Yes/No Indicator (HL7)"),
            AnswerCode::Year => CodeableValue::new("a", oid::UCUM, "Year").with_system_name("UCUM"),
            AnswerCode::Symptomatic => {
                CodeableValue::new("264931009", oid::SNOMED_CT, "Symptomatic")
                    .with_system_name("SNOMED CT")
            }
        }
    }
}

/// CDC race codes, one per race flag
pub fn race(flag: RaceFlag) -> CodeableValue {
    let (code, display) = match flag {
        RaceFlag::White => ("2106-3", "White"),
        RaceFlag::BlackOrAfricanAmerican => ("2054-5", "Black or African American"),
        RaceFlag::AmericanIndianOrAlaskaNative => ("1002-5", "American Indian or Alaska Native"),
        RaceFlag::Asian => ("2028-9", "Asian"),
        RaceFlag::NativeHawaiianOrOtherPacificIslander => {
            ("2076-8", "Native Hawaiian or Other Pacific Islander")
        }
    };
    CodeableValue::new(code, oid::RACE_AND_ETHNICITY, display)
        .with_system_name("Race & Ethnicity - CDC")
}

/// CDC ethnicity code for the stored ethnicity text
///
/// Any text containing `"Not"` maps to "Not Hispanic or Latino"; every other
/// non-blank value maps to "Hispanic or Latino".
pub fn ethnicity(text: &str) -> CodeableValue {
    let (code, display) = if text.contains("Not") {
        ("2186-5", "Not Hispanic or Latino")
    } else {
        ("2135-2", "Hispanic or Latino")
    };
    CodeableValue::new(code, oid::RACE_AND_ETHNICITY, display)
        .with_system_name("Race & Ethnicity - CDC")
}

/// Administrative gender from the first character of the stored sex
///
/// The character is uppercased, since AdministrativeGender codes are `M`,
/// `F` and `U`; a stored "male" therefore codes as `M`. The display name
/// keeps the stored text, trimmed.
pub fn administrative_gender(sex: &str) -> Option<CodeableValue> {
    let first = sex.trim().chars().next()?;
    Some(
        CodeableValue::new(
            first.to_uppercase().to_string(),
            oid::ADMINISTRATIVE_GENDER,
            sex.trim(),
        )
        .with_system_name("AdministrativeGender"),
    )
}

/// Country of exposure coded as ISO 3166-1 alpha-3
pub fn country(alpha3: &str, display: &str) -> CodeableValue {
    CodeableValue::new(alpha3, oid::ISO_3166_ALPHA_3, display).with_system_name("ISO 3166-1 alpha-3")
}
