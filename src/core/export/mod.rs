//! Export orchestration and batch processing
//!
//! - [`batch`] - sequential serialization with per-patient failure isolation
//! - [`coordinator`] - concurrent document construction with ordered writes
//! - [`summary`] - export reporting

pub mod batch;
pub mod coordinator;
pub mod summary;

pub use batch::{build_document, BatchConfig, BatchResult, BatchSerializer, EntryRecorder};
pub use coordinator::ExportCoordinator;
pub use summary::{ExportError, ExportErrorType, ExportSummary, ExportedEntry};
