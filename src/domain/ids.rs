//! Domain identifier types with validation
//!
//! Newtype wrapper for patient identifiers. The patient id is reused verbatim
//! as the document id, the set id, every section id and the archive entry name.
//! Snapshot ids are accepted as written and checked with
//! [`PatientId::validate`] when the patient's document is built.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Patient identifier newtype wrapper
///
/// Snapshots carry numeric ids; string ids are accepted as well.
///
/// # Examples
///
/// ```
/// use phdc::domain::ids::PatientId;
/// use std::str::FromStr;
///
/// let id = PatientId::from_str("42").unwrap();
/// assert_eq!(id.as_str(), "42");
/// assert_eq!(id.entry_name(), "records/42.xml");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "RawPatientId", into = "String")]
pub struct PatientId(String);

impl PatientId {
    /// Creates a new PatientId from a string
    ///
    /// The value is kept verbatim.
    ///
    /// # Returns
    ///
    /// Returns `Ok(PatientId)` if the ID is usable as an archive path segment,
    /// `Err` otherwise
    pub fn new(id: impl Into<String>) -> Result<Self, String> {
        let id = Self(id.into());
        id.validate()?;
        Ok(id)
    }

    /// Checks that the id can name an archive entry
    ///
    /// Deserialized ids are not checked on the way in, so one unusable id
    /// fails its own document instead of the whole snapshot.
    pub fn validate(&self) -> Result<(), String> {
        let id = self.0.as_str();
        if id.trim().is_empty() {
            return Err("Patient ID cannot be empty".to_string());
        }
        if id.contains(['/', '\\']) || id == "." || id == ".." {
            return Err(format!("Patient ID cannot contain path separators: {id}"));
        }
        Ok(())
    }

    /// Returns the patient ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Archive entry path for this patient's document
    pub fn entry_name(&self) -> String {
        format!("records/{}.xml", self.0)
    }

    /// Consumes self and returns the inner String
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl From<u64> for PatientId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl From<PatientId> for String {
    fn from(id: PatientId) -> Self {
        id.0
    }
}

impl fmt::Display for PatientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for PatientId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for PatientId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawPatientId {
    Number(u64),
    Text(String),
}

impl From<RawPatientId> for PatientId {
    fn from(raw: RawPatientId) -> Self {
        match raw {
            RawPatientId::Number(n) => PatientId::from(n),
            RawPatientId::Text(s) => PatientId(s),
        }
    }
}

/// Deserializes an optional patient id, treating a blank string as absent
pub fn deserialize_optional<'de, D>(deserializer: D) -> Result<Option<PatientId>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawPatientId>::deserialize(deserializer)?;
    Ok(raw
        .map(PatientId::from)
        .filter(|id| !id.as_str().trim().is_empty()))
}
