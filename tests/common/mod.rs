//! Shared helpers for integration tests

#![allow(dead_code)]

use chrono::{DateTime, FixedOffset, NaiveDate};
use phdc::core::document::{AgeAsOf, DocumentAssembler};
use phdc::vocabulary::VocabularyResolver;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::sync::Arc;

/// Minimal element tree built from a parsed document
#[derive(Debug, Clone, Default)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub text: String,
    pub children: Vec<Element>,
}

impl Element {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// Follows a `/`-separated path of first matching children
    pub fn path(&self, path: &str) -> Option<&Element> {
        path.split('/').try_fold(self, |node, name| node.child(name))
    }

    /// Every descendant (depth first) with the given name
    pub fn descendants<'a>(&'a self, name: &str) -> Vec<&'a Element> {
        let mut found = Vec::new();
        self.collect(name, &mut found);
        found
    }

    fn collect<'a>(&'a self, name: &str, found: &mut Vec<&'a Element>) {
        for child in &self.children {
            if child.name == name {
                found.push(child);
            }
            child.collect(name, found);
        }
    }

    /// The four body sections, in document order
    pub fn sections(&self) -> Vec<&Element> {
        self.path("component/structuredBody")
            .map(|body| {
                body.children_named("component")
                    .filter_map(|c| c.child("section"))
                    .collect()
            })
            .unwrap_or_default()
    }
}

fn element(start: &BytesStart<'_>) -> Element {
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let attributes = start
        .attributes()
        .map(|attr| {
            let attr = attr.expect("well-formed attribute");
            (
                String::from_utf8_lossy(attr.key.as_ref()).into_owned(),
                attr.unescape_value().expect("valid attribute value").into_owned(),
            )
        })
        .collect();
    Element {
        name,
        attributes,
        ..Element::default()
    }
}

/// Parses document bytes and returns every top-level element
///
/// Panics on malformed XML.
pub fn parse_roots(bytes: &[u8]) -> Vec<Element> {
    let xml = std::str::from_utf8(bytes).expect("document is UTF-8");
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut stack: Vec<Element> = Vec::new();
    let mut roots = Vec::new();
    loop {
        match reader.read_event().expect("well-formed XML") {
            Event::Start(start) => stack.push(element(&start)),
            Event::Empty(start) => {
                let node = element(&start);
                match stack.last_mut() {
                    Some(parent) => parent.children.push(node),
                    None => roots.push(node),
                }
            }
            Event::Text(text) => {
                if let Some(node) = stack.last_mut() {
                    node.text.push_str(&text.unescape().expect("valid text"));
                }
            }
            Event::End(_) => {
                let node = stack.pop().expect("balanced tags");
                match stack.last_mut() {
                    Some(parent) => parent.children.push(node),
                    None => roots.push(node),
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    assert!(stack.is_empty(), "unclosed elements at end of document");
    roots
}

/// Parses document bytes that must hold exactly one root
pub fn parse_document(bytes: &[u8]) -> Element {
    let mut roots = parse_roots(bytes);
    assert_eq!(roots.len(), 1, "expected exactly one document root");
    roots.remove(0)
}

pub fn utc(date: &str) -> DateTime<FixedOffset> {
    DateTime::parse_from_rfc3339(date).expect("RFC 3339 timestamp")
}

pub fn assembler() -> DocumentAssembler {
    let resolver = VocabularyResolver::builtin().expect("built-in vocabulary");
    let as_of = NaiveDate::from_ymd_opt(2021, 6, 1).expect("valid date");
    DocumentAssembler::new(Arc::new(resolver), Arc::new(AgeAsOf::new(as_of)))
}
