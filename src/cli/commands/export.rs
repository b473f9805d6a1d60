//! Export command implementation
//!
//! This module implements the `export` command, which turns a patient
//! snapshot into a ZIP archive of PHDC documents.

use crate::config::{load_config, PhdcConfig};
use crate::core::export::{ExportCoordinator, ExportSummary};
use clap::Args;
use std::time::Duration;
use tokio::sync::watch;

/// Maximum failed patients listed in the console summary
const MAX_LISTED_FAILURES: usize = 20;

/// Arguments for the export command
#[derive(Args, Debug, Default)]
pub struct ExportArgs {
    /// Override the snapshot to read
    #[arg(short, long, value_name = "PATH")]
    pub input: Option<String>,

    /// Override the archive to write
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<String>,

    /// Dry run mode - build every document but write no archive
    #[arg(long)]
    pub dry_run: bool,

    /// Override the number of documents built concurrently
    #[arg(long, value_name = "N")]
    pub parallel: Option<usize>,

    /// Verify the archive after writing it
    #[arg(long)]
    pub verify: bool,
}

impl ExportArgs {
    fn apply_overrides(&self, config: &mut PhdcConfig) {
        if let Some(input) = &self.input {
            tracing::info!(input = %input, "Overriding snapshot path from CLI");
            config.export.input_path = input.clone();
        }
        if let Some(output) = &self.output {
            tracing::info!(output = %output, "Overriding archive path from CLI");
            config.export.output_path = output.clone();
        }
        if let Some(parallel) = self.parallel {
            tracing::info!(parallel, "Overriding parallel documents from CLI");
            config.export.parallel_documents = parallel;
        }
        if self.dry_run {
            tracing::info!("Enabling dry-run mode from CLI");
            config.application.dry_run = true;
        }
        if self.verify {
            config.verification.verify_after_export = true;
        }
    }

    /// Execute the export command
    pub async fn execute(
        &self,
        config_path: &str,
        shutdown_signal: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        tracing::info!("Starting export command");

        let mut config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                crate::log_error_with_context!(&e, "Failed to load configuration");
                eprintln!("Failed to load configuration: {e}");
                return Ok(2);
            }
        };

        self.apply_overrides(&mut config);

        if let Err(e) = config.validate() {
            tracing::error!(error = %e, "Configuration validation failed");
            eprintln!("Configuration validation failed: {e}");
            return Ok(2);
        }

        if config.application.dry_run {
            println!("🔍 DRY RUN MODE - No archive will be written");
            println!();
        }

        let shutdown_timeout = Duration::from_secs(config.export.shutdown_timeout_secs);

        let coordinator = match ExportCoordinator::new(config, shutdown_signal.clone()) {
            Ok(c) => c,
            Err(e) => {
                crate::log_error_with_context!(&e, "Failed to create export coordinator");
                eprintln!("Failed to initialize export: {e}");
                return Ok(2);
            }
        };

        println!("🚀 Starting export...");
        println!();

        // The timeout only starts once a shutdown signal arrives
        let export = coordinator.execute_export();
        tokio::pin!(export);
        let early = tokio::select! {
            result = &mut export => Some(result),
            _ = wait_for_shutdown(shutdown_signal) => None,
        };
        let outcome = match early {
            Some(result) => result,
            None => {
                tracing::info!(
                    timeout_secs = shutdown_timeout.as_secs(),
                    "Waiting for the archive to be finalized"
                );
                match tokio::time::timeout(shutdown_timeout, &mut export).await {
                    Ok(result) => result,
                    Err(_) => {
                        tracing::error!("Shutdown timeout elapsed before the archive was finalized");
                        eprintln!("⚠️  Shutdown timed out; the archive may be incomplete");
                        return Ok(130);
                    }
                }
            }
        };

        let summary = match outcome {
            Ok(s) => s,
            Err(e) => {
                crate::log_error_with_context!(&e, "Export failed");
                eprintln!("Export failed: {e}");
                return Ok(5);
            }
        };

        print_summary(&summary);
        Ok(exit_code(&summary))
    }
}

async fn wait_for_shutdown(mut signal: watch::Receiver<bool>) {
    if signal.wait_for(|requested| *requested).await.is_err() {
        // Sender gone, no signal can arrive any more
        std::future::pending::<()>().await;
    }
}

fn print_summary(summary: &ExportSummary) {
    println!();
    println!("📊 Export Summary:");
    println!("  Jurisdiction: {}", summary.jurisdiction);
    println!("  Total Patients: {}", summary.total_patients);
    println!("  Successful: {}", summary.successful_exports);
    println!("  Failed: {}", summary.failed_exports);
    println!("  Duplicates Skipped: {}", summary.duplicates_skipped);
    println!("  Duration: {:.2}s", summary.duration.as_secs_f64());
    println!("  Success Rate: {:.2}%", summary.success_rate());
    if let Some(path) = &summary.output_path {
        println!("  Archive: {}", path.display());
    }
    println!();

    let failed: Vec<_> = summary.failed_patients().collect();
    if !failed.is_empty() {
        println!("⚠️  Patients without a document:");
        for (patient, reason) in failed.iter().take(MAX_LISTED_FAILURES) {
            println!("  - {patient}: {reason}");
        }
        if failed.len() > MAX_LISTED_FAILURES {
            println!("  ... and {} more", failed.len() - MAX_LISTED_FAILURES);
        }
        println!();
    }

    for error in summary.errors.iter().filter(|e| e.patient.is_none()) {
        println!("⚠️  {:?}: {}", error.error_type, error.message);
    }

    if let Some(report) = &summary.verification_report {
        println!("{}", report.format_summary());
    }
}

/// Maps an export summary to the process exit code
///
/// 0 success, 1 some patients failed, 2 configuration error,
/// 3 verification failure, 130 interrupted.
pub fn exit_code(summary: &ExportSummary) -> i32 {
    use crate::core::export::ExportErrorType;

    if summary.interrupted {
        println!("⚠️  Export interrupted. The archive holds the documents written so far.");
        return 130;
    }
    if summary
        .errors
        .iter()
        .any(|e| e.error_type == ExportErrorType::Configuration)
    {
        return 2;
    }
    let verification_failed = summary
        .verification_report
        .as_ref()
        .is_some_and(|r| !r.is_success())
        || summary
            .errors
            .iter()
            .any(|e| e.error_type == ExportErrorType::Verification);
    if verification_failed {
        println!("❌ Archive verification failed");
        return 3;
    }
    if summary.failed_exports > 0 {
        println!("⚠️  Export completed with failures");
        return 1;
    }
    println!("✅ Export completed successfully!");
    0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::export::{ExportError, ExportErrorType};
    use crate::core::verification::{FailureReason, VerificationFailure, VerificationReport};

    #[test]
    fn test_overrides_applied() {
        let args = ExportArgs {
            input: Some("in.json".to_string()),
            output: Some("out.zip".to_string()),
            dry_run: true,
            parallel: Some(2),
            verify: true,
        };
        let mut config = PhdcConfig::default();
        args.apply_overrides(&mut config);

        assert_eq!(config.export.input_path, "in.json");
        assert_eq!(config.export.output_path, "out.zip");
        assert_eq!(config.export.parallel_documents, 2);
        assert!(config.application.dry_run);
        assert!(config.verification.verify_after_export);
    }

    #[test]
    fn test_no_overrides_keep_config() {
        let mut config = PhdcConfig::default();
        ExportArgs::default().apply_overrides(&mut config);
        assert_eq!(config.export.output_path, "phdc-export.zip");
        assert!(!config.application.dry_run);
    }

    #[test]
    fn test_exit_codes() {
        let mut summary = ExportSummary::new();
        summary.successful_exports = 2;
        assert_eq!(exit_code(&summary), 0);

        summary.failed_exports = 1;
        assert_eq!(exit_code(&summary), 1);

        let mut report = VerificationReport::new();
        report.record_failure(VerificationFailure::new(
            "records/1.xml",
            FailureReason::ChecksumMismatch,
        ));
        summary.set_verification_report(report);
        assert_eq!(exit_code(&summary), 3);

        summary.interrupted = true;
        assert_eq!(exit_code(&summary), 130);

        let mut summary = ExportSummary::new();
        summary.add_error(ExportError::new(
            ExportErrorType::Configuration,
            "bad".to_string(),
        ));
        assert_eq!(exit_code(&summary), 2);
    }

    #[tokio::test]
    async fn test_wait_for_shutdown_returns_on_signal() {
        let (tx, rx) = watch::channel(false);
        let waiter = tokio::spawn(wait_for_shutdown(rx));
        tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
    }
}
