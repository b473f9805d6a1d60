//! XML serialization of PHDC documents
//!
//! Writes a [`ClinicalDocument`] with `quick-xml`. Elements and attributes are
//! emitted in a fixed order so identical documents produce identical bytes.
//! Text and attribute values are escaped by the writer and nowhere else.

use super::assembler::{Address, ClinicalDocument, Demographics, Organization, RecordTarget};
use super::nodes::{
    CodedElement, Component, DocumentNode, Entry, EntryContent, Observation, ObservationValue,
    Organizer, Section,
};
use crate::domain::Result;
use crate::vocabulary::codes::{header, oid};
use crate::vocabulary::CodeableValue;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

/// Serializes a complete document, XML declaration and stylesheet included
pub fn to_xml(document: &ClinicalDocument) -> Result<Vec<u8>> {
    let mut xml = XmlEmitter::new();
    xml.prolog()?;
    xml.document(document)?;
    Ok(xml.finish())
}

/// Serializes a single body node as an XML fragment
pub fn node_to_xml(node: &DocumentNode) -> Result<Vec<u8>> {
    let mut xml = XmlEmitter::new();
    match node {
        DocumentNode::Observation(obs) => xml.observation(obs)?,
        DocumentNode::Organizer(org) => xml.organizer(org)?,
        DocumentNode::Section(section) => xml.section(section)?,
    }
    Ok(xml.finish())
}

struct XmlEmitter {
    writer: Writer<Vec<u8>>,
}

impl XmlEmitter {
    fn new() -> Self {
        Self {
            writer: Writer::new_with_indent(Vec::new(), b' ', 2),
        }
    }

    fn finish(self) -> Vec<u8> {
        self.writer.into_inner()
    }

    fn start(&mut self, name: &str, attributes: &[(&str, &str)]) -> Result<()> {
        let mut element = BytesStart::new(name);
        for attribute in attributes {
            element.push_attribute(*attribute);
        }
        self.writer.write_event(Event::Start(element))?;
        Ok(())
    }

    fn end(&mut self, name: &str) -> Result<()> {
        self.writer.write_event(Event::End(BytesEnd::new(name)))?;
        Ok(())
    }

    fn empty(&mut self, name: &str, attributes: &[(&str, &str)]) -> Result<()> {
        let mut element = BytesStart::new(name);
        for attribute in attributes {
            element.push_attribute(*attribute);
        }
        self.writer.write_event(Event::Empty(element))?;
        Ok(())
    }

    fn text_element(&mut self, name: &str, attributes: &[(&str, &str)], text: &str) -> Result<()> {
        self.start(name, attributes)?;
        self.writer.write_event(Event::Text(BytesText::new(text)))?;
        self.end(name)
    }

    fn optional_text(&mut self, name: &str, text: Option<&str>) -> Result<()> {
        match text {
            Some(text) => self.text_element(name, &[], text),
            None => Ok(()),
        }
    }

    fn coded(&mut self, name: &str, prefix: &[(&str, &str)], value: &CodeableValue) -> Result<()> {
        let mut attributes: Vec<(&str, &str)> = prefix.to_vec();
        attributes.push(("code", value.code.as_str()));
        attributes.push(("codeSystem", value.code_system.as_str()));
        if let Some(system_name) = &value.code_system_name {
            attributes.push(("codeSystemName", system_name.as_str()));
        }
        attributes.push(("displayName", value.display_name.as_str()));
        self.empty(name, &attributes)
    }

    fn coded_element(&mut self, element: &CodedElement) -> Result<()> {
        self.coded(element.element.as_str(), &[], &element.value)
    }

    fn prolog(&mut self) -> Result<()> {
        self.writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        let stylesheet = format!(
            "xml-stylesheet type=\"text/xsl\" href=\"{}\"",
            header::STYLESHEET
        );
        self.writer
            .write_event(Event::PI(BytesText::from_escaped(stylesheet.as_str())))?;
        Ok(())
    }

    fn document(&mut self, doc: &ClinicalDocument) -> Result<()> {
        self.start(
            "ClinicalDocument",
            &[
                ("xmlns", header::NAMESPACE),
                ("xmlns:sdtc", header::SDTC_NAMESPACE),
                ("xmlns:xsi", header::XSI_NAMESPACE),
                ("xsi:schemaLocation", header::SCHEMA_LOCATION),
            ],
        )?;

        self.empty("realmCode", &[("code", header::REALM)])?;
        self.empty(
            "typeId",
            &[
                ("root", oid::CDA_TYPE_ID),
                ("extension", header::TYPE_ID_EXTENSION),
            ],
        )?;
        self.empty(
            "id",
            &[("root", oid::DOCUMENT_ID_ROOT), ("extension", doc.header.id.as_str())],
        )?;
        self.coded("code", &[], &doc.header.code)?;
        self.text_element("title", &[], &doc.header.title)?;
        self.empty("effectiveTime", &[("value", doc.header.effective_time.as_str())])?;
        self.empty(
            "confidentialityCode",
            &[
                ("code", header::CONFIDENTIALITY),
                ("codeSystem", oid::CONFIDENTIALITY),
            ],
        )?;
        self.empty("languageCode", &[("code", header::LANGUAGE)])?;
        self.empty(
            "setId",
            &[("root", oid::DOCUMENT_ID_ROOT), ("extension", doc.header.id.as_str())],
        )?;
        self.empty("versionNumber", &[("value", header::VERSION_NUMBER)])?;

        self.record_target(&doc.record_target)?;

        self.start("author", &[])?;
        self.empty("time", &[("value", doc.author.time.as_str())])?;
        self.start("assignedAuthor", &[])?;
        self.empty("id", &[("root", doc.author.organization.id_root)])?;
        self.start("representedOrganization", &[])?;
        self.text_element("name", &[], &doc.author.organization.name)?;
        self.end("representedOrganization")?;
        self.end("assignedAuthor")?;
        self.end("author")?;

        self.custodian(&doc.custodian)?;

        self.start("component", &[])?;
        self.start("structuredBody", &[])?;
        for section in &doc.sections {
            self.start("component", &[])?;
            self.section(section)?;
            self.end("component")?;
        }
        self.end("structuredBody")?;
        self.end("component")?;

        self.end("ClinicalDocument")
    }

    fn record_target(&mut self, target: &RecordTarget) -> Result<()> {
        self.start("recordTarget", &[])?;
        self.start("patientRole", &[])?;
        self.empty(
            "id",
            &[("root", oid::DOCUMENT_ID_ROOT), ("extension", target.patient_id.as_str())],
        )?;
        self.address(&target.address)?;
        if let Some(telephone) = &target.telecom {
            self.empty(
                "telecom",
                &[("use", header::TELECOM_USE), ("value", telephone.as_str())],
            )?;
        }
        self.patient(&target.patient)?;
        self.end("patientRole")?;
        self.end("recordTarget")
    }

    fn address(&mut self, address: &Address) -> Result<()> {
        self.start("addr", &[("use", header::ADDRESS_USE)])?;
        self.optional_text("streetAddressLine", address.street.as_deref())?;
        self.optional_text("city", address.city.as_deref())?;
        self.optional_text("state", address.state.as_deref())?;
        self.optional_text("postalCode", address.postal_code.as_deref())?;
        self.optional_text("county", address.county.as_deref())?;
        self.text_element("country", &[], &address.country)?;
        self.end("addr")
    }

    fn patient(&mut self, patient: &Demographics) -> Result<()> {
        self.start("patient", &[])?;

        self.start("name", &[("use", header::NAME_USE)])?;
        self.optional_text("given", patient.name.given.as_deref())?;
        self.optional_text("given", patient.name.middle.as_deref())?;
        self.optional_text("family", patient.name.family.as_deref())?;
        self.end("name")?;

        if let Some(gender) = &patient.gender {
            self.coded_element(gender)?;
        }
        if let Some(birth_time) = &patient.birth_time {
            self.empty("birthTime", &[("value", birth_time.as_str())])?;
        }
        for race in &patient.races {
            self.coded_element(race)?;
        }
        if let Some(ethnicity) = &patient.ethnicity {
            self.coded_element(ethnicity)?;
        }

        self.end("patient")
    }

    fn custodian(&mut self, organization: &Organization) -> Result<()> {
        self.start("custodian", &[])?;
        self.start("assignedCustodian", &[])?;
        self.start("representedCustodianOrganization", &[])?;
        self.empty("id", &[("root", organization.id_root)])?;
        self.text_element("name", &[], &organization.name)?;
        self.end("representedCustodianOrganization")?;
        self.end("assignedCustodian")?;
        self.end("custodian")
    }

    fn section(&mut self, section: &Section) -> Result<()> {
        self.start("section", &[])?;
        self.empty(
            "id",
            &[("root", oid::DOCUMENT_ID_ROOT), ("extension", section.id.as_str())],
        )?;
        self.coded("code", &[], &section.code)?;
        self.text_element("title", &[], &section.title)?;
        for entry in &section.entries {
            self.entry(entry)?;
        }
        self.end("section")
    }

    fn entry(&mut self, entry: &Entry) -> Result<()> {
        match entry.type_code {
            Some(type_code) => self.start("entry", &[("typeCode", type_code.as_str())])?,
            None => self.start("entry", &[])?,
        }
        match &entry.content {
            EntryContent::Observation(obs) => self.observation(obs)?,
            EntryContent::Organizer(org) => self.organizer(org)?,
        }
        self.end("entry")
    }

    fn organizer(&mut self, organizer: &Organizer) -> Result<()> {
        self.start(
            "organizer",
            &[
                ("classCode", organizer.class_code.as_str()),
                ("moodCode", organizer.mood_code.as_str()),
            ],
        )?;
        self.coded("code", &[], &organizer.code)?;
        self.empty("statusCode", &[("code", organizer.status.as_str())])?;
        for component in &organizer.components {
            self.component(component)?;
        }
        self.end("organizer")
    }

    fn component(&mut self, component: &Component) -> Result<()> {
        self.start("component", &[])?;
        self.observation(&component.observation)?;
        self.end("component")
    }

    fn observation(&mut self, obs: &Observation) -> Result<()> {
        self.start(
            "observation",
            &[
                ("classCode", obs.class_code.as_str()),
                ("moodCode", obs.mood_code.as_str()),
            ],
        )?;
        self.coded("code", &[], &obs.code)?;
        if let Some(time) = &obs.effective_time {
            self.empty("effectiveTime", &[("value", time.as_str())])?;
        }
        match &obs.value {
            ObservationValue::Coded(value) => {
                self.coded("value", &[("xsi:type", obs.value.xsi_type())], value)?
            }
            ObservationValue::Text(text) => {
                self.text_element("value", &[("xsi:type", obs.value.xsi_type())], text)?
            }
        }
        self.end("observation")
    }
}
