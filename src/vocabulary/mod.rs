//! Coded vocabulary for PHDC documents.
//!
//! - [`codes`] - the typed table of fixed codes and OIDs
//! - [`resolver`] - geography name to FIPS / ISO 3166 code lookups
//!
//! # Example
//!
//! ```rust
//! use phdc::vocabulary::{GeoCode, VocabularyResolver};
//!
//! # fn example() -> phdc::domain::Result<()> {
//! let resolver = VocabularyResolver::builtin()?;
//! assert_eq!(resolver.state_code("Massachusetts"), GeoCode::Known("25".to_string()));
//! assert_eq!(resolver.country_alpha3("Nowhere").code(), "UNK");
//! # Ok(())
//! # }
//! ```

pub mod codes;
pub mod resolver;

pub use codes::{AnswerCode, CodeableValue, QuestionCode, SectionCode};
pub use resolver::{GeoCode, VocabularyResolver};
