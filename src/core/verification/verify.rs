//! Archive verification
//!
//! Every entry of a PHDC archive must satisfy:
//!
//! - its name is `records/<id>.xml` with a valid patient id
//! - no other entry has the same name
//! - it is well-formed UTF-8 XML with exactly one `ClinicalDocument` root
//! - the root's `id/@extension` equals `<id>`
//! - its structured body holds the four sections in the fixed order
//!
//! When expected checksums are supplied, each entry's SHA-256 must match and
//! every expected entry must be present.

use crate::adapters::archive::{ArchiveEntry, ArchiveReader};
use crate::core::export::summary::ExportedEntry;
use crate::core::verification::checksum::matches_checksum;
use crate::core::verification::report::{FailureReason, VerificationFailure, VerificationReport};
use crate::domain::{PatientId, Result};
use crate::vocabulary::SectionCode;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::{HashMap, HashSet};
use std::io::{Read, Seek};
use std::path::Path;
use std::time::Instant;

const ENTRY_PREFIX: &str = "records/";
const ENTRY_SUFFIX: &str = ".xml";
const ROOT_ELEMENT: &str = "ClinicalDocument";
const SECTION_PATH: [&str; 5] = [
    ROOT_ELEMENT,
    "component",
    "structuredBody",
    "component",
    "section",
];

/// Verifies the archive at `path` structurally
pub fn verify_archive(path: impl AsRef<Path>) -> Result<VerificationReport> {
    Verifier::new().verify_archive(path)
}

/// Archive verifier
#[derive(Debug, Clone, Default)]
pub struct Verifier {
    /// Entry name to hex SHA-256
    expected: Option<HashMap<String, String>>,
}

impl Verifier {
    /// Create a verifier that only checks structure
    pub fn new() -> Self {
        Self::default()
    }

    /// Also compare entries against the checksums recorded at export time
    pub fn with_expected(mut self, entries: &[ExportedEntry]) -> Self {
        self.expected = Some(
            entries
                .iter()
                .map(|e| (e.entry.clone(), e.sha256.clone()))
                .collect(),
        );
        self
    }

    /// Verifies the archive file at `path`
    ///
    /// # Errors
    ///
    /// Returns an error only if the file is not a readable archive; problems
    /// with individual entries are reported as failures.
    pub fn verify_archive(&self, path: impl AsRef<Path>) -> Result<VerificationReport> {
        let path = path.as_ref();
        tracing::info!(archive = %path.display(), "Starting archive verification");
        self.verify_reader(ArchiveReader::open(path)?)
    }

    /// Verifies an already opened archive
    pub fn verify_reader<R: Read + Seek>(
        &self,
        mut reader: ArchiveReader<R>,
    ) -> Result<VerificationReport> {
        let start = Instant::now();
        let mut report = VerificationReport::new();
        let mut seen = HashSet::new();

        for index in 0..reader.len() {
            let entry = match reader.entry(index) {
                Ok(entry) => entry,
                Err(e) => {
                    report.record_failure(VerificationFailure::new(
                        format!("#{index}"),
                        FailureReason::Unreadable(e.to_string()),
                    ));
                    continue;
                }
            };

            if !seen.insert(entry.name.clone()) {
                report.record_failure(VerificationFailure::new(
                    entry.name.as_str(),
                    FailureReason::DuplicateName,
                ));
                continue;
            }

            match self.check_entry(&entry) {
                Ok(true) => report.record_pass(),
                Ok(false) => report.record_unchecked(),
                Err(reason) => {
                    tracing::debug!(
                        entry = %entry.name,
                        reason = %reason,
                        "Entry failed verification"
                    );
                    report.record_failure(VerificationFailure::new(entry.name.as_str(), reason));
                }
            }
        }

        if let Some(expected) = &self.expected {
            let mut missing: Vec<&String> = expected
                .keys()
                .filter(|name| !seen.contains(name.as_str()))
                .collect();
            missing.sort();
            for name in missing {
                report.record_failure(VerificationFailure::new(
                    name.as_str(),
                    FailureReason::Missing,
                ));
            }
        }

        report.set_duration(u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX));
        tracing::info!(
            total_verified = report.total_verified,
            passed = report.passed,
            failed = report.failed,
            "Archive verification completed"
        );
        Ok(report)
    }

    /// `Ok(true)` when the checksum was compared, `Ok(false)` when no
    /// checksum was available
    fn check_entry(&self, entry: &ArchiveEntry) -> std::result::Result<bool, FailureReason> {
        let id = entry_patient_id(&entry.name)?;

        let xml = std::str::from_utf8(&entry.bytes)
            .map_err(|e| FailureReason::NotUtf8(e.to_string()))?;
        let outline = DocumentOutline::parse(xml)?;
        outline.check(id.as_str())?;

        match self
            .expected
            .as_ref()
            .and_then(|expected| expected.get(&entry.name))
        {
            Some(checksum) if matches_checksum(&entry.bytes, checksum) => Ok(true),
            Some(_) => Err(FailureReason::ChecksumMismatch),
            None => Ok(false),
        }
    }
}

fn entry_patient_id(name: &str) -> std::result::Result<PatientId, FailureReason> {
    let id = name
        .strip_prefix(ENTRY_PREFIX)
        .and_then(|rest| rest.strip_suffix(ENTRY_SUFFIX))
        .ok_or_else(|| FailureReason::EntryName(name.to_string()))?;
    PatientId::new(id).map_err(FailureReason::EntryName)
}

/// The parts of a document verification looks at
#[derive(Debug, Default)]
struct DocumentOutline {
    roots: Vec<String>,
    document_id: Option<String>,
    section_codes: Vec<String>,
}

impl DocumentOutline {
    fn parse(xml: &str) -> std::result::Result<Self, FailureReason> {
        let mut reader = Reader::from_str(xml);
        reader.trim_text(true);

        let mut outline = DocumentOutline::default();
        let mut path: Vec<String> = Vec::new();

        loop {
            let event = reader.read_event().map_err(|e| {
                FailureReason::Malformed(format!("at byte {}: {e}", reader.buffer_position()))
            })?;

            match event {
                Event::Start(start) => {
                    let name = element_name(&start);
                    outline.observe(&path, &name, &start)?;
                    path.push(name);
                }
                Event::Empty(start) => {
                    let name = element_name(&start);
                    outline.observe(&path, &name, &start)?;
                }
                Event::End(_) => {
                    if path.pop().is_none() {
                        return Err(FailureReason::Malformed(
                            "closing tag without an open element".to_string(),
                        ));
                    }
                }
                Event::Text(_) | Event::CData(_) if path.is_empty() => {
                    return Err(FailureReason::Malformed(
                        "text outside the root element".to_string(),
                    ));
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if let Some(open) = path.last() {
            return Err(FailureReason::Malformed(format!("unclosed element <{open}>")));
        }
        Ok(outline)
    }

    fn observe(
        &mut self,
        path: &[String],
        name: &str,
        start: &BytesStart<'_>,
    ) -> std::result::Result<(), FailureReason> {
        if path.is_empty() {
            self.roots.push(name.to_string());
        } else if path.len() == 1 && path[0] == ROOT_ELEMENT && name == "id" {
            self.document_id = attribute(start, "extension")?;
        } else if name == "code" && path.iter().map(String::as_str).eq(SECTION_PATH) {
            let code = attribute(start, "code")?.unwrap_or_default();
            self.section_codes.push(code);
        }
        Ok(())
    }

    fn check(&self, patient_id: &str) -> std::result::Result<(), FailureReason> {
        match self.roots.as_slice() {
            [root] if root == ROOT_ELEMENT => {}
            [root] => return Err(FailureReason::Root(format!("<{root}>"))),
            [] => return Err(FailureReason::Root("no element".to_string())),
            roots => return Err(FailureReason::Root(format!("{} elements", roots.len()))),
        }

        if self.document_id.as_deref() != Some(patient_id) {
            return Err(FailureReason::IdMismatch {
                expected: patient_id.to_string(),
                found: self.document_id.clone(),
            });
        }

        let expected: Vec<String> = SectionCode::ORDER
            .iter()
            .map(|section| section.codeable().code)
            .collect();
        if self.section_codes != expected {
            return Err(FailureReason::SectionOrder {
                expected,
                found: self.section_codes.clone(),
            });
        }
        Ok(())
    }
}

fn element_name(start: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(start.name().as_ref()).into_owned()
}

fn attribute(
    start: &BytesStart<'_>,
    key: &str,
) -> std::result::Result<Option<String>, FailureReason> {
    let attribute = start.try_get_attribute(key).map_err(|e| {
        FailureReason::Malformed(format!("attribute on <{}>: {e}", element_name(start)))
    })?;
    attribute
        .map(|a| {
            a.unescape_value()
                .map(|value| value.into_owned())
                .map_err(|e| FailureReason::Malformed(format!("attribute value: {e}")))
        })
        .transpose()
}
