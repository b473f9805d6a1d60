//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::PhdcConfig;
use crate::domain::{PhdcError, Result};
use chrono::NaiveDate;
use regex::Regex;
use std::fs;
use std::path::Path;
use std::str::FromStr;

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (${VAR} syntax)
/// 3. Parses the TOML into PhdcConfig
/// 4. Applies environment variable overrides (PHDC_* prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns an error if:
/// - File cannot be read
/// - TOML parsing fails
/// - A referenced environment variable is not set
/// - Configuration validation fails
///
/// # Examples
///
/// ```no_run
/// use phdc::config::loader::load_config;
///
/// let config = load_config("phdc.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<PhdcConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(PhdcError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        PhdcError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    let contents = substitute_env_vars(&contents)?;

    let mut config: PhdcConfig = toml::from_str(&contents)
        .map_err(|e| PhdcError::Configuration(format!("Failed to parse TOML: {}", e)))?;

    apply_env_overrides(&mut config)?;

    config.validate().map_err(|e| {
        PhdcError::Configuration(format!("Configuration validation failed: {}", e))
    })?;

    Ok(config)
}

/// Substitutes environment variables in the format ${VAR_NAME}
///
/// Comment lines are left untouched.
///
/// # Errors
///
/// Returns an error naming every referenced variable that is not set
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
        .map_err(|e| PhdcError::Configuration(format!("Invalid substitution pattern: {e}")))?;
    let mut result = String::new();
    let mut missing_vars: Vec<String> = Vec::new();

    for line in input.lines() {
        if line.trim_start().starts_with('#') {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        let mut processed_line = line.to_string();
        for cap in re.captures_iter(line) {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => {
                    let placeholder = format!("${{{}}}", var_name);
                    processed_line = processed_line.replace(&placeholder, &value);
                }
                Err(_) => {
                    if !missing_vars.iter().any(|v| v == var_name) {
                        missing_vars.push(var_name.to_string());
                    }
                }
            }
        }
        result.push_str(&processed_line);
        result.push('\n');
    }

    if !missing_vars.is_empty() {
        return Err(PhdcError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

fn env_parsed<T: FromStr>(name: &str) -> Result<Option<T>> {
    match std::env::var(name) {
        Ok(val) => val.trim().parse().map(Some).map_err(|_| {
            PhdcError::Configuration(format!("Invalid value '{}' for {}", val, name))
        }),
        Err(_) => Ok(None),
    }
}

/// Applies environment variable overrides using PHDC_* prefix
///
/// Environment variables follow the pattern: PHDC_<SECTION>_<KEY>
/// For example: PHDC_EXPORT_OUTPUT_PATH, PHDC_APPLICATION_DRY_RUN
fn apply_env_overrides(config: &mut PhdcConfig) -> Result<()> {
    // Application overrides
    if let Ok(val) = std::env::var("PHDC_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }
    if let Some(dry_run) = env_parsed("PHDC_APPLICATION_DRY_RUN")? {
        config.application.dry_run = dry_run;
    }

    // Export overrides
    if let Ok(val) = std::env::var("PHDC_EXPORT_INPUT_PATH") {
        config.export.input_path = val;
    }
    if let Ok(val) = std::env::var("PHDC_EXPORT_OUTPUT_PATH") {
        config.export.output_path = val;
    }
    if let Some(parallel) = env_parsed("PHDC_EXPORT_PARALLEL_DOCUMENTS")? {
        config.export.parallel_documents = parallel;
    }
    if let Ok(val) = std::env::var("PHDC_EXPORT_COMPRESSION") {
        config.export.compression = val;
    }
    if let Some(date) = env_parsed::<NaiveDate>("PHDC_EXPORT_AGE_REFERENCE_DATE")? {
        config.export.age_reference_date = Some(date);
    }
    if let Some(timeout) = env_parsed("PHDC_EXPORT_SHUTDOWN_TIMEOUT_SECS")? {
        config.export.shutdown_timeout_secs = timeout;
    }

    // Vocabulary overrides
    if let Ok(val) = std::env::var("PHDC_VOCABULARY_COUNTY_TABLE") {
        config.vocabulary.county_table = Some(val);
    }

    // Verification overrides
    if let Some(verify) = env_parsed("PHDC_VERIFICATION_VERIFY_AFTER_EXPORT")? {
        config.verification.verify_after_export = verify;
    }

    // Logging overrides
    if let Some(enabled) = env_parsed("PHDC_LOGGING_LOCAL_ENABLED")? {
        config.logging.local_enabled = enabled;
    }
    if let Ok(val) = std::env::var("PHDC_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }
    if let Ok(val) = std::env::var("PHDC_LOGGING_LOCAL_ROTATION") {
        config.logging.local_rotation = val;
    }

    Ok(())
}
