//! Streaming archive writer
//!
//! Entries are written one at a time and never buffered beyond the entry in
//! flight. Entry timestamps are pinned to the ZIP epoch so that identical
//! inputs produce identical archives.

use crate::domain::{PatientId, PhdcError, Result};
use std::collections::HashSet;
use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Seek, Write};
use std::path::Path;
use std::str::FromStr;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Compression applied to every entry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EntryCompression {
    #[default]
    Deflated,
    Stored,
}

impl EntryCompression {
    fn method(self) -> CompressionMethod {
        match self {
            EntryCompression::Deflated => CompressionMethod::Deflated,
            EntryCompression::Stored => CompressionMethod::Stored,
        }
    }
}

impl FromStr for EntryCompression {
    type Err = PhdcError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "deflated" => Ok(EntryCompression::Deflated),
            "stored" => Ok(EntryCompression::Stored),
            _ => Err(PhdcError::Configuration(format!(
                "Invalid compression: {s}. Must be 'deflated' or 'stored'"
            ))),
        }
    }
}

impl fmt::Display for EntryCompression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryCompression::Deflated => write!(f, "deflated"),
            EntryCompression::Stored => write!(f, "stored"),
        }
    }
}

/// Writes PHDC documents into a ZIP archive
pub struct ArchiveWriter<W: Write + Seek> {
    zip: ZipWriter<W>,
    options: SimpleFileOptions,
    names: HashSet<String>,
}

impl ArchiveWriter<BufWriter<File>> {
    /// Creates (or truncates) an archive file
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| {
            PhdcError::archive(
                None,
                format!("Failed to create archive {}: {e}", path.display()),
            )
        })?;
        Ok(Self::new(BufWriter::new(file), EntryCompression::default()))
    }
}

impl<W: Write + Seek> ArchiveWriter<W> {
    /// Wraps a seekable sink
    pub fn new(inner: W, compression: EntryCompression) -> Self {
        let options = SimpleFileOptions::default()
            .compression_method(compression.method())
            .last_modified_time(zip::DateTime::default());

        Self {
            zip: ZipWriter::new(inner),
            options,
            names: HashSet::new(),
        }
    }

    /// Same writer with a different entry compression
    pub fn with_compression(mut self, compression: EntryCompression) -> Self {
        self.options = self.options.compression_method(compression.method());
        self
    }

    /// Whether an entry for `patient_id` has already been written
    pub fn contains(&self, patient_id: &PatientId) -> bool {
        self.names.contains(&patient_id.entry_name())
    }

    /// Number of entries written so far
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Appends the document of one patient and returns the entry name
    ///
    /// # Errors
    ///
    /// [`PhdcError::DuplicateEntry`] if the entry name is already taken; the
    /// archive is left untouched. Any stream failure is returned as
    /// [`PhdcError::Archive`] naming the patient.
    pub fn write_entry(&mut self, patient_id: &PatientId, document: &[u8]) -> Result<String> {
        let name = patient_id.entry_name();
        if self.names.contains(&name) {
            return Err(PhdcError::DuplicateEntry(name));
        }

        let in_flight = Some(patient_id.as_str());
        self.zip
            .start_file(name.as_str(), self.options)
            .map_err(|e| PhdcError::archive(in_flight, e.to_string()))?;
        self.zip
            .write_all(document)
            .map_err(|e| PhdcError::archive(in_flight, e.to_string()))?;

        tracing::debug!(entry = %name, bytes = document.len(), "Wrote archive entry");
        self.names.insert(name.clone());
        Ok(name)
    }

    /// Writes the central directory and returns the sink
    pub fn finish(self) -> Result<W> {
        let entries = self.names.len();
        let mut inner = self
            .zip
            .finish()
            .map_err(|e| PhdcError::archive(None, format!("Failed to finalize archive: {e}")))?;
        inner
            .flush()
            .map_err(|e| PhdcError::archive(None, format!("Failed to flush archive: {e}")))?;

        tracing::debug!(entries, "Archive finalized");
        Ok(inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use test_case::test_case;

    fn writer() -> ArchiveWriter<Cursor<Vec<u8>>> {
        ArchiveWriter::new(Cursor::new(Vec::new()), EntryCompression::Deflated)
    }

    #[test_case("deflated", EntryCompression::Deflated ; "deflated")]
    #[test_case("STORED", EntryCompression::Stored ; "stored any case")]
    fn test_compression_from_str(input: &str, expected: EntryCompression) {
        assert_eq!(input.parse::<EntryCompression>().unwrap(), expected);
    }

    #[test]
    fn test_invalid_compression() {
        assert!("bzip2".parse::<EntryCompression>().is_err());
    }

    #[test]
    fn test_entry_names() {
        let mut archive = writer();
        let name = archive.write_entry(&PatientId::from(42), b"<a/>").unwrap();
        assert_eq!(name, "records/42.xml");
        assert!(archive.contains(&PatientId::from(42)));
        assert_eq!(archive.len(), 1);

        let bytes = archive.finish().unwrap().into_inner();
        let mut zip = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(zip.len(), 1);
        assert_eq!(zip.by_index(0).unwrap().name(), "records/42.xml");
    }

    #[test]
    fn test_duplicate_entry_rejected() {
        let mut archive = writer();
        archive.write_entry(&PatientId::from(1), b"<a/>").unwrap();
        let result = archive.write_entry(&PatientId::from(1), b"<b/>");
        assert!(matches!(result, Err(PhdcError::DuplicateEntry(name)) if name == "records/1.xml"));
        assert_eq!(archive.len(), 1);
    }

    #[test]
    fn test_archives_are_reproducible() {
        let build = || {
            let mut archive = writer();
            archive.write_entry(&PatientId::from(1), b"<a/>").unwrap();
            archive.write_entry(&PatientId::from(2), b"<b/>").unwrap();
            archive.finish().unwrap().into_inner()
        };
        assert_eq!(build(), build());
    }
}
