//! Validate config command implementation
//!
//! This module implements the `validate-config` command for validating
//! the PHDC configuration file.

use crate::config::load_config;
use crate::vocabulary::VocabularyResolver;
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("🔍 Validating configuration file: {config_path}");
        println!();

        // load_config validates as part of loading
        let config = match load_config(config_path) {
            Ok(c) => {
                println!("✅ Configuration is valid");
                c
            }
            Err(e) => {
                println!("❌ Configuration is invalid");
                println!("   Error: {e}");
                return Ok(2);
            }
        };

        if let Some(table) = &config.vocabulary.county_table {
            let loaded = VocabularyResolver::builtin().and_then(|r| r.with_county_table(table));
            if let Err(e) = loaded {
                println!("❌ County table could not be loaded");
                println!("   Error: {e}");
                return Ok(2);
            }
            println!("✅ County table loaded: {table}");
        }

        println!();
        println!("Configuration Summary:");
        println!("  Log Level: {}", config.application.log_level);
        println!("  Dry Run: {}", config.application.dry_run);
        println!("  Snapshot: {}", config.export.input_path);
        println!("  Archive: {}", config.export.output_path);
        println!("  Parallel Documents: {}", config.export.parallel_documents);
        println!("  Compression: {}", config.export.compression);
        println!(
            "  Age Reference Date: {}",
            config
                .export
                .age_reference_date
                .map(|d| d.to_string())
                .unwrap_or_else(|| "today".to_string())
        );
        println!(
            "  Verify After Export: {}",
            config.verification.verify_after_export
        );
        println!();
        Ok(0)
    }
}
