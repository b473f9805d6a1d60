//! PHDC document construction
//!
//! Converts one patient snapshot into an HL7 CDA Public Health Case Report.
//!
//! - [`nodes`] - primitive node types and builders
//! - [`sections`] - the four body sections
//! - [`assembler`] - header, record target, author, custodian and body
//! - [`writer`] - XML serialization
//! - [`age`] - whole-years age calculation
//!
//! # Example
//!
//! ```rust
//! use phdc::core::document::{AgeAsOf, DocumentAssembler};
//! use phdc::domain::{Jurisdiction, PatientId, PatientRecord};
//! use phdc::vocabulary::VocabularyResolver;
//! use chrono::NaiveDate;
//! use std::sync::Arc;
//!
//! # fn example() -> phdc::domain::Result<()> {
//! let assembler = DocumentAssembler::new(
//!     Arc::new(VocabularyResolver::builtin()?),
//!     Arc::new(AgeAsOf::new(NaiveDate::from_ymd_opt(2021, 6, 1).unwrap())),
//! );
//! let patient = PatientRecord::builder().id(PatientId::from(42)).build();
//! let xml = assembler.assemble(&patient, &Jurisdiction::new("USA, State 1"), &[])?;
//! assert!(xml.starts_with(b"<?xml"));
//! # Ok(())
//! # }
//! ```

pub mod age;
pub mod assembler;
pub mod nodes;
pub mod sections;
pub mod writer;

pub use age::{AgeAsOf, AgeCalculator};
pub use assembler::{ClinicalDocument, DocumentAssembler};
pub use nodes::DocumentNode;
pub use writer::{node_to_xml, to_xml};
