//! Verify command implementation
//!
//! Re-opens an archive written by `export` and checks every entry.

use crate::core::verification::verify_archive;
use clap::Args;
use std::path::PathBuf;

/// Arguments for the verify command
#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// Archive to verify
    #[arg(value_name = "ARCHIVE")]
    pub archive: PathBuf,
}

impl VerifyArgs {
    /// Execute the verify command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(archive = %self.archive.display(), "Verifying archive");
        println!("🔍 Verifying archive: {}", self.archive.display());
        println!();

        let path = self.archive.clone();
        let report = match tokio::task::spawn_blocking(move || verify_archive(&path)).await? {
            Ok(report) => report,
            Err(e) => {
                crate::log_error_with_context!(&e, "Archive could not be read");
                println!("❌ Archive could not be read");
                println!("   Error: {e}");
                return Ok(3);
            }
        };

        println!("{}", report.format_summary());

        if report.is_success() {
            println!("✅ Archive is valid");
            Ok(0)
        } else {
            println!("❌ Archive verification failed");
            Ok(3)
        }
    }
}
