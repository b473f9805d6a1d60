//! Domain models and types for PHDC.
//!
//! This module contains the read-only input snapshot handed over by the
//! monitoring system, plus the error hierarchy shared by the whole crate.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Strongly-typed identifiers** ([`PatientId`])
//! - **Input snapshot models** ([`PatientRecord`], [`SymptomaticAssessment`], [`Jurisdiction`], [`PatientBundle`])
//! - **Error types** ([`PhdcError`])
//! - **Result type alias** ([`Result`])
//!
//! # Builder Pattern
//!
//! ```rust
//! use phdc::domain::{PatientId, PatientRecord, RaceFlag};
//!
//! let patient = PatientRecord::builder()
//!     .id(PatientId::from(42))
//!     .name("Jane", None, "Doe")
//!     .race(RaceFlag::White)
//!     .primary_telephone("+15551234567")
//!     .build();
//! assert_eq!(patient.contact_telephone(), Some("+15551234567"));
//! ```

pub mod assessment;
pub mod errors;
pub mod ids;
pub mod jurisdiction;
pub mod patient;
pub mod result;

// Re-export commonly used types for convenience
pub use assessment::SymptomaticAssessment;
pub use errors::PhdcError;
pub use ids::PatientId;
pub use jurisdiction::Jurisdiction;
pub use patient::{non_blank, PatientBundle, PatientRecord, PatientRecordBuilder, RaceFlag};
pub use result::Result;
