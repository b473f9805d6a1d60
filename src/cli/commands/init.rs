//! Init command implementation
//!
//! This module implements the `init` command for generating a sample
//! configuration file.

use clap::Args;
use std::fs;
use std::path::Path;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path where to create the configuration file
    #[arg(short, long, default_value = "phdc.toml")]
    pub output: String,

    /// Include comments explaining every setting
    #[arg(long)]
    pub with_examples: bool,

    /// Overwrite existing file
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    /// Execute the init command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(output = %self.output, "Initializing configuration file");

        println!("📝 Initializing PHDC configuration");
        println!();

        if Path::new(&self.output).exists() && !self.force {
            println!("❌ Configuration file already exists: {}", self.output);
            println!("   Use --force to overwrite");
            return Ok(2);
        }

        let config_content = if self.with_examples {
            Self::generate_config_with_examples()
        } else {
            Self::generate_minimal_config()
        };

        match fs::write(&self.output, config_content) {
            Ok(_) => {
                println!("✅ Configuration file created: {}", self.output);
                println!();
                println!("Next steps:");
                println!("  1. Point export.input_path at your patient snapshot");
                println!("  2. Validate configuration: phdc validate-config");
                println!("  3. Run export: phdc export");
                println!();
                Ok(0)
            }
            Err(e) => {
                println!("❌ Failed to write configuration file");
                println!("   Error: {}", e);
                Ok(5)
            }
        }
    }

    /// Generate minimal configuration
    fn generate_minimal_config() -> String {
        r#"# PHDC Configuration File

[application]
log_level = "info"
dry_run = false

[export]
input_path = "snapshot.json"
output_path = "phdc-export.zip"
parallel_documents = 4
compression = "deflated"
shutdown_timeout_secs = 30

[vocabulary]
# county_table = "county_overrides.csv"

[verification]
verify_after_export = false

[logging]
local_enabled = false
local_path = "/var/log/phdc"
local_rotation = "daily"
"#
        .to_string()
    }

    /// Generate configuration with comments
    fn generate_config_with_examples() -> String {
        r#"# PHDC Configuration File
# Public Health Case Report exporter
#
# Values of the form ${VAR} are replaced with environment variables.
# Every key can also be overridden with PHDC_<SECTION>_<KEY>,
# for example PHDC_EXPORT_OUTPUT_PATH.

# ============================================================================
# Application Settings
# ============================================================================
[application]
# Log level (trace, debug, info, warn, error)
log_level = "info"

# Build every document but write no archive
dry_run = false

# ============================================================================
# Export Configuration
# ============================================================================
[export]
# JSON snapshot holding the jurisdiction and its patients
input_path = "snapshot.json"

# ZIP archive receiving one records/<patient_id>.xml entry per patient
output_path = "phdc-export.zip"

# Documents built concurrently (1-64). Entries are always written in
# snapshot order.
parallel_documents = 4

# Entry compression: "deflated" or "stored"
compression = "deflated"

# Date ages are computed against (YYYY-MM-DD). Defaults to today.
# Set it to make repeated exports byte-identical.
# age_reference_date = "2020-12-31"

# Seconds to wait for the archive to be finalized after Ctrl+C or SIGTERM
shutdown_timeout_secs = 30

# ============================================================================
# Reference Vocabulary
# ============================================================================
[vocabulary]
# Extra county FIPS rows (state,county,fips header). Rows add to or
# replace the built-in table, e.g. for counties created after it.
# county_table = "county_overrides.csv"

# ============================================================================
# Verification
# ============================================================================
[verification]
# Re-open the archive after export and check names, XML and checksums
verify_after_export = false

# ============================================================================
# Logging Configuration
# ============================================================================
[logging]
# Write JSON log files in addition to console output
local_enabled = false

# Log directory
local_path = "/var/log/phdc"

# Log rotation (daily or hourly)
local_rotation = "daily"
"#
        .to_string()
    }
}
