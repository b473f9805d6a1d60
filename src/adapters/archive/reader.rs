//! Archive reader used by verification

use crate::domain::{PhdcError, Result};
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;
use zip::ZipArchive;

/// One decompressed archive entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub name: String,
    pub bytes: Vec<u8>,
}

/// Reads entries back from a PHDC archive in stored order
pub struct ArchiveReader<R: Read + Seek> {
    zip: ZipArchive<R>,
}

impl ArchiveReader<BufReader<File>> {
    /// Opens an archive file
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            PhdcError::Verification(format!("Failed to open archive {}: {e}", path.display()))
        })?;
        Self::new(BufReader::new(file))
    }
}

impl<R: Read + Seek> ArchiveReader<R> {
    pub fn new(inner: R) -> Result<Self> {
        let zip = ZipArchive::new(inner)
            .map_err(|e| PhdcError::Verification(format!("Not a readable archive: {e}")))?;
        Ok(Self { zip })
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.zip.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zip.len() == 0
    }

    /// Reads the entry at `index`
    pub fn entry(&mut self, index: usize) -> Result<ArchiveEntry> {
        let mut file = self
            .zip
            .by_index(index)
            .map_err(|e| PhdcError::Verification(format!("Unreadable entry #{index}: {e}")))?;

        let name = file.name().to_string();
        let mut bytes = Vec::with_capacity(usize::try_from(file.size()).unwrap_or_default());
        file.read_to_end(&mut bytes)
            .map_err(|e| PhdcError::Verification(format!("Failed to read {name}: {e}")))?;

        Ok(ArchiveEntry { name, bytes })
    }
}
