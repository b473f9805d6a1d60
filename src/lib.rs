// PHDC - Public Health Case Report Exporter
// Copyright (c) 2025 PHDC Contributors
// Licensed under the MIT License

//! # PHDC - Public Health Case Report Exporter
//!
//! PHDC turns a snapshot of monitored patients into HL7 CDA R2 Public Health
//! Case Report documents and writes them into a single ZIP archive, one
//! `records/<patient_id>.xml` entry per patient.
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Document construction, batch export and archive verification
//! - [`adapters`] - Snapshot sources and the ZIP archive
//! - [`vocabulary`] - Fixed code tables and geography code lookups
//! - [`domain`] - Input snapshot types and errors
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use phdc::config::load_config;
//! use phdc::core::export::ExportCoordinator;
//! use tokio::sync::watch;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config("phdc.toml")?;
//!     let (_shutdown_tx, shutdown_rx) = watch::channel(false);
//!
//!     let coordinator = ExportCoordinator::new(config, shutdown_rx)?;
//!     let summary = coordinator.execute_export().await?;
//!
//!     println!("Exported {} documents", summary.successful_exports);
//!     Ok(())
//! }
//! ```
//!
//! ## Failure Isolation
//!
//! A patient whose document cannot be built is logged and left out of the
//! archive; the rest of the batch continues. Only a failure of the archive
//! stream itself aborts the export. See [`core::export::BatchSerializer`].
//!
//! ## Determinism
//!
//! With a fixed `export.age_reference_date` the same snapshot produces a
//! byte-identical archive: attribute order is fixed, entry timestamps are
//! constant and entries follow snapshot order.

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
pub mod vocabulary;
