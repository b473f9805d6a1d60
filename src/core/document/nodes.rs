//! Primitive CDA nodes and their builders
//!
//! Every builder returns a finished value; parents are assembled from
//! already-built children and nothing is modified afterwards. Child order
//! inside a parent is significant and is decided by the caller.

use crate::vocabulary::CodeableValue;
use chrono::{DateTime, FixedOffset, NaiveDate};

/// Element name under which a coded value is written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementName {
    Code,
    AdministrativeGenderCode,
    RaceCode,
    /// Additional race codes beyond the first (SDTC extension)
    SdtcRaceCode,
    EthnicGroupCode,
}

impl ElementName {
    pub fn as_str(self) -> &'static str {
        match self {
            ElementName::Code => "code",
            ElementName::AdministrativeGenderCode => "administrativeGenderCode",
            ElementName::RaceCode => "raceCode",
            ElementName::SdtcRaceCode => "sdtc:raceCode",
            ElementName::EthnicGroupCode => "ethnicGroupCode",
        }
    }
}

/// A coded value tagged with its element name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodedElement {
    pub element: ElementName,
    pub value: CodeableValue,
}

/// Value of an observation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObservationValue {
    /// `xsi:type="CE"`
    Coded(CodeableValue),
    /// `xsi:type="ST"`, written as literal child text
    Text(String),
}

impl ObservationValue {
    /// The `xsi:type` of the value element
    pub fn xsi_type(&self) -> &'static str {
        match self {
            ObservationValue::Coded(_) => "CE",
            ObservationValue::Text(_) => "ST",
        }
    }
}

/// Kind of act
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActClass {
    Observation,
    Cluster,
}

impl ActClass {
    pub fn as_str(self) -> &'static str {
        match self {
            ActClass::Observation => "OBS",
            ActClass::Cluster => "CLUSTER",
        }
    }
}

/// Mood of an act
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActMood {
    /// Something that already happened
    Event,
}

impl ActMood {
    pub fn as_str(self) -> &'static str {
        match self {
            ActMood::Event => "EVN",
        }
    }
}

/// Act relationship of an entry wrapper
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relationship {
    /// "has component"
    Component,
}

impl Relationship {
    pub fn as_str(self) -> &'static str {
        match self {
            Relationship::Component => "COMP",
        }
    }
}

/// Completion status of an organizer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    Completed,
}

impl StatusCode {
    pub fn as_str(self) -> &'static str {
        match self {
            StatusCode::Completed => "completed",
        }
    }
}

/// An atomic fact
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observation {
    pub class_code: ActClass,
    pub mood_code: ActMood,
    pub code: CodeableValue,
    pub effective_time: Option<String>,
    pub value: ObservationValue,
}

impl Observation {
    /// Returns the observation stamped with an effective time
    pub fn at(self, effective_time: String) -> Self {
        Self {
            effective_time: Some(effective_time),
            ..self
        }
    }
}

/// A component holding one observation, the child shape of an organizer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Component {
    pub observation: Observation,
}

/// A grouping of facts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Organizer {
    pub class_code: ActClass,
    pub mood_code: ActMood,
    pub code: CodeableValue,
    pub status: StatusCode,
    pub components: Vec<Component>,
}

/// Content of a section entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryContent {
    Observation(Observation),
    Organizer(Organizer),
}

/// Act-relationship wrapper around one observation or organizer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub type_code: Option<Relationship>,
    pub content: EntryContent,
}

/// A body section
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub id: String,
    pub code: CodeableValue,
    pub title: String,
    pub entries: Vec<Entry>,
}

/// Any node of the body tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentNode {
    Observation(Observation),
    Organizer(Organizer),
    Section(Section),
}

/// Coded element carrying `code`, `codeSystem`, optional `codeSystemName`
/// and `displayName` under the given element name
pub fn coded_value(value: CodeableValue, element: ElementName) -> CodedElement {
    CodedElement { element, value }
}

/// Coded observation value
pub fn coded_content(value: CodeableValue) -> ObservationValue {
    ObservationValue::Coded(value)
}

/// Free-text observation value
pub fn text_content(text: impl Into<String>) -> ObservationValue {
    ObservationValue::Text(text.into())
}

/// Act-relationship wrapper around entry content
pub fn entry_wrapper(type_code: Option<Relationship>, content: EntryContent) -> Entry {
    Entry { type_code, content }
}

/// Observation without an effective time
pub fn observation(
    class_code: ActClass,
    mood_code: ActMood,
    code: CodeableValue,
    value: ObservationValue,
) -> Observation {
    Observation {
        class_code,
        mood_code,
        code,
        effective_time: None,
        value,
    }
}

/// Organizer over already-built components
pub fn organizer(
    class_code: ActClass,
    mood_code: ActMood,
    code: CodeableValue,
    status: StatusCode,
    components: Vec<Component>,
) -> Organizer {
    Organizer {
        class_code,
        mood_code,
        code,
        status,
        components,
    }
}

/// One component wrapping one observation with one code/value pair
pub fn coded_observation_entry(
    class_code: ActClass,
    mood_code: ActMood,
    code: CodeableValue,
    value: ObservationValue,
) -> Component {
    Component {
        observation: observation(class_code, mood_code, code, value),
    }
}

/// Section entry holding a single event observation
pub fn observation_entry(code: CodeableValue, value: ObservationValue) -> Entry {
    entry_wrapper(
        Some(Relationship::Component),
        EntryContent::Observation(observation(
            ActClass::Observation,
            ActMood::Event,
            code,
            value,
        )),
    )
}

/// Runs `build` only when `condition` holds
pub fn include_if<T>(condition: bool, build: impl FnOnce() -> T) -> Option<T> {
    condition.then(build)
}

/// HL7 TS timestamp, `YYYYMMDDHHMMSS±ZZZZ`
pub fn format_timestamp(timestamp: &DateTime<FixedOffset>) -> String {
    timestamp.format("%Y%m%d%H%M%S%z").to_string()
}

/// HL7 TS date, `YYYYMMDD`
pub fn format_date(date: &NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vocabulary::{AnswerCode, QuestionCode};
    use chrono::TimeZone;

    #[test]
    fn test_format_timestamp_keeps_offset() {
        let ts = FixedOffset::west_opt(4 * 3600)
            .unwrap()
            .with_ymd_and_hms(2021, 6, 1, 8, 5, 9)
            .unwrap();
        assert_eq!(format_timestamp(&ts), "20210601080509-0400");

        let utc = FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2021, 6, 1, 12, 0, 0)
            .unwrap();
        assert_eq!(format_timestamp(&utc), "20210601120000+0000");
    }

    #[test]
    fn test_format_date() {
        let dob = NaiveDate::from_ymd_opt(1990, 1, 1).unwrap();
        assert_eq!(format_date(&dob), "19900101");
    }

    #[test]
    fn test_include_if_is_lazy() {
        let mut called = false;
        let skipped: Option<()> = include_if(false, || called = true);
        assert!(skipped.is_none());
        assert!(!called);
        assert_eq!(include_if(true, || 3), Some(3));
    }

    #[test]
    fn test_coded_observation_entry_shape() {
        let component = coded_observation_entry(
            ActClass::Observation,
            ActMood::Event,
            QuestionCode::SpeaksEnglish.codeable(),
            coded_content(AnswerCode::Yes.codeable()),
        );
        assert_eq!(component.observation.class_code.as_str(), "OBS");
        assert_eq!(component.observation.mood_code.as_str(), "EVN");
        assert_eq!(component.observation.value.xsi_type(), "CE");
        assert!(component.observation.effective_time.is_none());
    }

    #[test]
    fn test_observation_at_sets_time_only() {
        let base = observation(
            ActClass::Observation,
            ActMood::Event,
            QuestionCode::DailyReport.codeable(),
            text_content("x"),
        );
        let stamped = base.clone().at("20210601120000+0000".to_string());
        assert_eq!(stamped.code, base.code);
        assert_eq!(stamped.effective_time.as_deref(), Some("20210601120000+0000"));
    }
}
