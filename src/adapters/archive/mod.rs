//! ZIP archive of PHDC documents
//!
//! One archive per export, one `records/<patient_id>.xml` entry per patient.

pub mod reader;
pub mod writer;

pub use reader::{ArchiveEntry, ArchiveReader};
pub use writer::{ArchiveWriter, EntryCompression};
