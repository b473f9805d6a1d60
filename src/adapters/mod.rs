//! External collaborators of the exporter.
//!
//! - [`source`] - where patient snapshots come from
//! - [`archive`] - the ZIP archive documents are written into
//!
//! # Design Pattern
//!
//! Adapters isolate external formats so that document construction stays
//! free of I/O. The snapshot input sits behind the [`source::PatientSource`]
//! trait so tests can hand in in-memory snapshots.
//!
//! ```rust,no_run
//! use phdc::adapters::source::{JsonSnapshotSource, PatientSource};
//!
//! # async fn example() -> phdc::domain::Result<()> {
//! let snapshot = JsonSnapshotSource::new("snapshot.json").load().await?;
//! println!("{} patients", snapshot.len());
//! # Ok(())
//! # }
//! ```

pub mod archive;
pub mod source;
