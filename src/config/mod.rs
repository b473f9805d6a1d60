//! Configuration management for PHDC exports.
//!
//! This module provides TOML-based configuration loading, parsing, and
//! validation.
//!
//! # Overview
//!
//! PHDC uses TOML configuration files with support for:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - `PHDC_<SECTION>_<KEY>` environment overrides
//! - Default values for every setting
//! - Validation on load
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use phdc::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("phdc.toml")?;
//! println!("Snapshot: {}", config.export.input_path);
//! println!("Archive: {}", config.export.output_path);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration Structure
//!
//! - [`ApplicationConfig`] - log level and dry-run mode
//! - [`ExportConfig`] - input, output, concurrency, compression, age reference date
//! - [`VocabularyConfig`] - external county FIPS table
//! - [`VerificationConfig`] - post-export archive verification
//! - [`LoggingConfig`] - local JSON log files
//!
//! # Example Configuration
//!
//! ```toml
//! [application]
//! log_level = "info"
//!
//! [export]
//! input_path = "${PHDC_SNAPSHOT}"
//! output_path = "phdc-export.zip"
//! parallel_documents = 4
//!
//! [vocabulary]
//! county_table = "county_overrides.csv"
//! ```

pub mod loader;
pub mod schema;

// Re-export commonly used types
pub use loader::load_config;
pub use schema::{
    ApplicationConfig, ExportConfig, LoggingConfig, PhdcConfig, VerificationConfig,
    VocabularyConfig,
};
