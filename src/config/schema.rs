//! Configuration schema types
//!
//! This module defines the configuration structure for PHDC exports.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Upper bound for concurrently built documents
pub const MAX_PARALLEL_DOCUMENTS: usize = 64;

/// Main PHDC configuration
///
/// This is the root configuration structure that maps to the TOML file.
/// Every section has defaults, so an empty file is a valid configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PhdcConfig {
    /// Application-level settings
    #[serde(default)]
    pub application: ApplicationConfig,

    /// Export settings
    #[serde(default)]
    pub export: ExportConfig,

    /// Reference vocabulary settings
    #[serde(default)]
    pub vocabulary: VocabularyConfig,

    /// Archive verification configuration
    #[serde(default)]
    pub verification: VerificationConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl PhdcConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid
    pub fn validate(&self) -> Result<(), String> {
        self.application.validate()?;
        self.export.validate()?;
        self.vocabulary.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

/// Application-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Dry run mode (build documents, write no archive)
    #[serde(default)]
    pub dry_run: bool,
}

impl ApplicationConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            ));
        }
        Ok(())
    }
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            dry_run: false,
        }
    }
}

/// Export configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// JSON snapshot to read patients from
    #[serde(default = "default_input_path")]
    pub input_path: String,

    /// ZIP archive to write
    #[serde(default = "default_output_path")]
    pub output_path: String,

    /// Documents built concurrently (1-64)
    #[serde(default = "default_parallel_documents")]
    pub parallel_documents: usize,

    /// Entry compression (deflated or stored)
    #[serde(default = "default_compression")]
    pub compression: String,

    /// Date ages are computed against; today when unset
    #[serde(default)]
    pub age_reference_date: Option<NaiveDate>,

    /// Graceful shutdown timeout in seconds (default: 30)
    /// This is the maximum time to wait for the entry in flight and the
    /// archive finalization after a shutdown signal.
    #[serde(default = "default_shutdown_timeout_secs")]
    pub shutdown_timeout_secs: u64,
}

impl ExportConfig {
    fn validate(&self) -> Result<(), String> {
        if self.input_path.trim().is_empty() {
            return Err("export.input_path cannot be empty".to_string());
        }

        if self.output_path.trim().is_empty() {
            return Err("export.output_path cannot be empty".to_string());
        }

        if self.parallel_documents == 0 || self.parallel_documents > MAX_PARALLEL_DOCUMENTS {
            return Err(format!(
                "export.parallel_documents must be between 1 and {MAX_PARALLEL_DOCUMENTS}, got {}",
                self.parallel_documents
            ));
        }

        let valid_compressions = ["deflated", "stored"];
        if !valid_compressions.contains(&self.compression.to_lowercase().as_str()) {
            return Err(format!(
                "Invalid export.compression '{}'. Must be one of: {}",
                self.compression,
                valid_compressions.join(", ")
            ));
        }

        if self.shutdown_timeout_secs == 0 {
            return Err("export.shutdown_timeout_secs must be > 0".to_string());
        }

        Ok(())
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            input_path: default_input_path(),
            output_path: default_output_path(),
            parallel_documents: default_parallel_documents(),
            compression: default_compression(),
            age_reference_date: None,
            shutdown_timeout_secs: default_shutdown_timeout_secs(),
        }
    }
}

/// Reference vocabulary configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct VocabularyConfig {
    /// Extra county FIPS rows (`state,county,fips` CSV) layered over the
    /// built-in table
    #[serde(default)]
    pub county_table: Option<String>,
}

impl VocabularyConfig {
    fn validate(&self) -> Result<(), String> {
        if let Some(path) = &self.county_table {
            if path.trim().is_empty() {
                return Err("vocabulary.county_table cannot be empty when set".to_string());
            }
        }
        Ok(())
    }
}

/// Archive verification configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct VerificationConfig {
    /// Re-open and verify the archive after export
    #[serde(default)]
    pub verify_after_export: bool,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Enable local file logging
    #[serde(default)]
    pub local_enabled: bool,

    /// Local log directory
    #[serde(default = "default_local_path")]
    pub local_path: String,

    /// Log rotation strategy (daily or hourly)
    #[serde(default = "default_local_rotation")]
    pub local_rotation: String,
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_rotations = ["daily", "hourly"];
        if !valid_rotations.contains(&self.local_rotation.as_str()) {
            return Err(format!(
                "Invalid logging.local_rotation '{}'. Must be one of: {}",
                self.local_rotation,
                valid_rotations.join(", ")
            ));
        }

        if self.local_enabled && self.local_path.trim().is_empty() {
            return Err("logging.local_path cannot be empty when local logging is enabled".to_string());
        }

        Ok(())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            local_enabled: false,
            local_path: default_local_path(),
            local_rotation: default_local_rotation(),
        }
    }
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_input_path() -> String {
    "snapshot.json".to_string()
}

fn default_output_path() -> String {
    "phdc-export.zip".to_string()
}

fn default_parallel_documents() -> usize {
    4
}

fn default_compression() -> String {
    "deflated".to_string()
}

fn default_shutdown_timeout_secs() -> u64 {
    30
}

fn default_local_path() -> String {
    "/var/log/phdc".to_string()
}

fn default_local_rotation() -> String {
    "daily".to_string()
}
