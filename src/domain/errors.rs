//! Domain error types
//!
//! This module defines the error hierarchy for PHDC exports.
//! All errors are domain-specific and don't expose third-party types.

use thiserror::Error;

/// Main PHDC error type
///
/// This is the primary error type used throughout the application.
/// Errors raised while building a single patient's document are isolated
/// by the batch serializer; archive errors abort the whole batch.
#[derive(Debug, Error)]
pub enum PhdcError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// A patient record without an identifier was handed to the assembler
    #[error("Patient record has no identifier")]
    MissingPatientIdentity,

    /// The patient id cannot name an archive entry
    #[error("Patient identifier is unusable: {0}")]
    UnusablePatientIdentity(String),

    /// Document construction failed for one patient
    #[error("Document error: {0}")]
    Document(String),

    /// Reference vocabulary table could not be loaded
    #[error("Vocabulary error: {0}")]
    Vocabulary(String),

    /// Input snapshot could not be read or parsed
    #[error("Snapshot error: {0}")]
    Snapshot(String),

    /// Archive stream failure, fatal for the batch
    #[error("Archive error (patient {}): {message}", patient_id.as_deref().unwrap_or("none"))]
    Archive {
        /// Patient whose entry was in flight, if any
        patient_id: Option<String>,
        /// Underlying failure
        message: String,
    },

    /// Two patients mapped to the same archive entry name
    #[error("Duplicate archive entry: {0}")]
    DuplicateEntry(String),

    /// Archive verification errors
    #[error("Verification error: {0}")]
    Verification(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

impl PhdcError {
    /// Builds an archive error for the entry of `patient_id`
    pub fn archive(patient_id: Option<&str>, message: impl Into<String>) -> Self {
        PhdcError::Archive {
            patient_id: patient_id.map(str::to_string),
            message: message.into(),
        }
    }

    /// Whether the error only invalidates one patient's document
    ///
    /// Everything except archive stream failures is recoverable at the batch
    /// boundary.
    pub fn is_per_patient(&self) -> bool {
        !matches!(self, PhdcError::Archive { .. } | PhdcError::Io(_))
    }
}

// Conversion from std::io::Error
impl From<std::io::Error> for PhdcError {
    fn from(err: std::io::Error) -> Self {
        PhdcError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for PhdcError {
    fn from(err: serde_json::Error) -> Self {
        PhdcError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for PhdcError {
    fn from(err: toml::de::Error) -> Self {
        PhdcError::Configuration(format!("TOML parse error: {err}"))
    }
}

// Conversion from XML writer/reader errors
impl From<quick_xml::Error> for PhdcError {
    fn from(err: quick_xml::Error) -> Self {
        PhdcError::Serialization(format!("XML error: {err}"))
    }
}

// Conversion from ZIP errors (no patient context available here)
impl From<zip::result::ZipError> for PhdcError {
    fn from(err: zip::result::ZipError) -> Self {
        PhdcError::archive(None, err.to_string())
    }
}

// Conversion from reference table parse errors
impl From<csv::Error> for PhdcError {
    fn from(err: csv::Error) -> Self {
        PhdcError::Vocabulary(format!("CSV parse error: {err}"))
    }
}
