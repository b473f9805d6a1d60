//! Patient snapshot input
//!
//! The monitoring system hands over a read-only snapshot of one
//! jurisdiction: the jurisdiction path plus every patient with their
//! assessments.

pub mod json;
pub mod traits;

pub use json::JsonSnapshotSource;
pub use traits::{ExportSnapshot, PatientSource};
