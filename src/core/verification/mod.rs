//! Post-export archive verification
//!
//! Re-opens a written archive and checks every entry: name, uniqueness,
//! well-formedness, document identity and section layout. When the export
//! summary is at hand, entry checksums are compared as well.

pub mod checksum;
pub mod report;
pub mod verify;

pub use report::{FailureReason, VerificationFailure, VerificationReport};
pub use verify::{verify_archive, Verifier};
