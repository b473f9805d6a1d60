//! Core business logic for PHDC.
//!
//! # Modules
//!
//! - [`document`] - Builds one PHDC document from a patient snapshot
//! - [`export`] - Batch export with failure isolation and ordered archive writes
//! - [`verification`] - Re-reads an archive and checks every entry
//!
//! # Export Workflow
//!
//! 1. **Load**: Read the jurisdiction and patients from the snapshot
//! 2. **Build**: Assemble documents concurrently on the blocking pool
//! 3. **Write**: Append each document to the archive in snapshot order
//! 4. **Finalize**: Close the archive, also after a shutdown signal
//! 5. **Verify** (optional): Re-open the archive and check every entry
//! 6. **Report**: Produce an export summary
//!
//! # Example
//!
//! ```rust,no_run
//! use phdc::config::load_config;
//! use phdc::core::export::ExportCoordinator;
//! use tokio::sync::watch;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("phdc.toml")?;
//! let (_tx, rx) = watch::channel(false);
//! let summary = ExportCoordinator::new(config, rx)?.execute_export().await?;
//! summary.log_summary();
//! # Ok(())
//! # }
//! ```

pub mod document;
pub mod export;
pub mod verification;
