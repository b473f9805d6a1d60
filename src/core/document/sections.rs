//! Section builders
//!
//! Each builder returns a complete [`Section`]. Entries are included
//! independently of each other, based only on whether their source field is
//! present.

use super::age::AgeCalculator;
use super::nodes::{
    coded_content, coded_observation_entry, entry_wrapper, format_timestamp, include_if,
    observation, observation_entry, organizer, text_content, ActClass, ActMood, Entry,
    EntryContent, Relationship, Section, StatusCode,
};
use crate::domain::{non_blank, PatientRecord, SymptomaticAssessment};
use crate::vocabulary::codes::country;
use crate::vocabulary::{AnswerCode, QuestionCode, SectionCode, VocabularyResolver};

fn section(id: &str, code: SectionCode, entries: Vec<Entry>) -> Section {
    Section {
        id: id.to_string(),
        code: code.codeable(),
        title: code.title().to_string(),
        entries,
    }
}

/// Social History: primary language, age and gender identity
///
/// The language entries are only written for a primary language stored
/// literally as `"English"`.
pub fn social_history(patient: &PatientRecord, id: &str, ages: &dyn AgeCalculator) -> Section {
    let language = include_if(
        non_blank(&patient.primary_language) == Some("English"),
        || {
            vec![
                observation_entry(
                    QuestionCode::PrimaryLanguage.codeable(),
                    coded_content(AnswerCode::English.codeable()),
                ),
                observation_entry(
                    QuestionCode::SpeaksEnglish.codeable(),
                    coded_content(AnswerCode::Yes.codeable()),
                ),
            ]
        },
    );

    let age = patient.date_of_birth.map(|dob| {
        vec![
            observation_entry(
                QuestionCode::ReportedAge.codeable(),
                text_content(ages.age_in_years(dob).to_string()),
            ),
            observation_entry(
                QuestionCode::ReportedAgeUnits.codeable(),
                coded_content(AnswerCode::Year.codeable()),
            ),
        ]
    });

    let gender_identity = non_blank(&patient.gender_identity).map(|text| {
        vec![observation_entry(
            QuestionCode::GenderIdentity.codeable(),
            text_content(text),
        )]
    });

    let entries = [language, age, gender_identity]
        .into_iter()
        .flatten()
        .flatten()
        .collect();

    section(id, SectionCode::SocialHistory, entries)
}

/// Clinical Information: the state/local id under two question codes
pub fn clinical_information(patient: &PatientRecord, id: &str) -> Section {
    let entries = non_blank(&patient.user_defined_id_statelocal)
        .map(|state_local_id| {
            vec![
                observation_entry(
                    QuestionCode::StateCaseId.codeable(),
                    text_content(state_local_id),
                ),
                observation_entry(
                    QuestionCode::LocalPatientId.codeable(),
                    text_content(state_local_id),
                ),
            ]
        })
        .unwrap_or_default();

    section(id, SectionCode::ClinicalInformation, entries)
}

/// Exposure ("Generic Repeating Questions")
///
/// The exposure-information organizer is written when a country or a city of
/// exposure is present; the notes organizer is independent of it.
pub fn exposure(patient: &PatientRecord, id: &str, resolver: &VocabularyResolver) -> Section {
    let country_of_exposure = non_blank(&patient.potential_exposure_country).map(|name| {
        let alpha3 = resolver.country_alpha3(name);
        coded_observation_entry(
            ActClass::Observation,
            ActMood::Event,
            QuestionCode::CountryOfExposure.codeable(),
            coded_content(country(alpha3.code(), name)),
        )
    });

    let city_of_exposure = non_blank(&patient.potential_exposure_location).map(|city| {
        coded_observation_entry(
            ActClass::Observation,
            ActMood::Event,
            QuestionCode::CityOfExposure.codeable(),
            text_content(city),
        )
    });

    let components: Vec<_> = [country_of_exposure, city_of_exposure]
        .into_iter()
        .flatten()
        .collect();

    let information = include_if(!components.is_empty(), || {
        grouped(QuestionCode::ExposureInformation, components)
    });

    let notes = non_blank(&patient.exposure_notes).map(|notes| {
        grouped(
            QuestionCode::ExposureNotesGroup,
            vec![coded_observation_entry(
                ActClass::Observation,
                ActMood::Event,
                QuestionCode::ExposureNotes.codeable(),
                text_content(notes),
            )],
        )
    });

    let entries = [information, notes].into_iter().flatten().collect();

    section(id, SectionCode::Exposure, entries)
}

fn grouped(code: QuestionCode, components: Vec<super::nodes::Component>) -> Entry {
    entry_wrapper(
        Some(Relationship::Component),
        EntryContent::Organizer(organizer(
            ActClass::Cluster,
            ActMood::Event,
            code.codeable(),
            StatusCode::Completed,
            components,
        )),
    )
}

/// Signs and Symptoms: one daily-report observation per symptomatic assessment
///
/// Entries follow the order of `assessments`; no sorting happens here.
pub fn signs_and_symptoms(assessments: &[SymptomaticAssessment], id: &str) -> Section {
    let entries = assessments
        .iter()
        .map(|assessment| {
            let daily_report = observation(
                ActClass::Observation,
                ActMood::Event,
                QuestionCode::DailyReport.codeable(),
                coded_content(AnswerCode::Symptomatic.codeable()),
            )
            .at(format_timestamp(&assessment.updated_at));
            entry_wrapper(
                Some(Relationship::Component),
                EntryContent::Observation(daily_report),
            )
        })
        .collect();

    section(id, SectionCode::SignsAndSymptoms, entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::document::age::AgeAsOf;
    use crate::core::document::nodes::ObservationValue;
    use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone};

    fn ages() -> AgeAsOf {
        AgeAsOf::new(NaiveDate::from_ymd_opt(2021, 6, 1).unwrap())
    }

    fn at(hour: u32) -> DateTime<FixedOffset> {
        FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2021, 6, 1, hour, 0, 0)
            .unwrap()
    }

    fn observation_of(entry: &Entry) -> &crate::core::document::nodes::Observation {
        match &entry.content {
            EntryContent::Observation(obs) => obs,
            EntryContent::Organizer(_) => panic!("expected observation entry"),
        }
    }

    #[test]
    fn test_social_history_empty_for_blank_patient() {
        let section = social_history(&PatientRecord::default(), "1", &ages());
        assert!(section.entries.is_empty());
        assert_eq!(section.id, "1");
        assert_eq!(section.code.code, "29762-2");
    }

    #[test]
    fn test_social_history_full() {
        let patient = PatientRecord::builder()
            .primary_language("English")
            .date_of_birth(NaiveDate::from_ymd_opt(1990, 1, 1).unwrap())
            .gender_identity("Transgender Female")
            .build();

        let section = social_history(&patient, "42", &ages());
        let codes: Vec<&str> = section
            .entries
            .iter()
            .map(|e| observation_of(e).code.code.as_str())
            .collect();
        assert_eq!(codes, vec!["DEM142", "NBS214", "INV2001", "INV2002", "NBS274"]);

        assert_eq!(
            observation_of(&section.entries[2]).value,
            ObservationValue::Text("31".to_string())
        );
        assert_eq!(
            observation_of(&section.entries[4]).value,
            ObservationValue::Text("Transgender Female".to_string())
        );
    }

    #[test]
    fn test_social_history_language_is_literal_match() {
        let patient = PatientRecord::builder().primary_language("english").build();
        assert!(social_history(&patient, "1", &ages()).entries.is_empty());

        let patient = PatientRecord::builder().primary_language("Spanish").build();
        assert!(social_history(&patient, "1", &ages()).entries.is_empty());
    }

    #[test]
    fn test_clinical_information() {
        assert!(clinical_information(&PatientRecord::default(), "1")
            .entries
            .is_empty());

        let patient = PatientRecord::builder().state_local_id("EX-771").build();
        let section = clinical_information(&patient, "1");
        assert_eq!(section.entries.len(), 2);
        let first = observation_of(&section.entries[0]);
        let second = observation_of(&section.entries[1]);
        assert_ne!(first.code.code, second.code.code);
        assert_eq!(first.value, ObservationValue::Text("EX-771".to_string()));
        assert_eq!(second.value, first.value);
    }

    #[test]
    fn test_exposure_organizers_are_independent() {
        let resolver = VocabularyResolver::from_entries([], [], [("Italy", "ITA")]);

        let patient = PatientRecord::builder().exposure_notes("Cruise ship").build();
        let section = exposure(&patient, "1", &resolver);
        assert_eq!(section.entries.len(), 1);
        match &section.entries[0].content {
            EntryContent::Organizer(org) => {
                assert_eq!(org.code.display_name, "Exposure Notes");
                assert_eq!(org.components.len(), 1);
            }
            EntryContent::Observation(_) => panic!("expected organizer"),
        }

        let patient = PatientRecord::builder()
            .exposure(Some("Italy"), Some("Milan"))
            .build();
        let section = exposure(&patient, "1", &resolver);
        assert_eq!(section.entries.len(), 1);
        match &section.entries[0].content {
            EntryContent::Organizer(org) => {
                assert_eq!(org.status, StatusCode::Completed);
                assert_eq!(org.components.len(), 2);
                match &org.components[0].observation.value {
                    ObservationValue::Coded(value) => assert_eq!(value.code, "ITA"),
                    ObservationValue::Text(_) => panic!("country must be coded"),
                }
            }
            EntryContent::Observation(_) => panic!("expected organizer"),
        }
    }

    #[test]
    fn test_exposure_unmapped_country_uses_sentinel() {
        let resolver = VocabularyResolver::default();
        let patient = PatientRecord::builder().exposure(Some("Atlantis"), None).build();
        let section = exposure(&patient, "1", &resolver);
        match &section.entries[0].content {
            EntryContent::Organizer(org) => {
                assert_eq!(org.components.len(), 1);
                match &org.components[0].observation.value {
                    ObservationValue::Coded(value) => {
                        assert_eq!(value.code, "UNK");
                        assert_eq!(value.display_name, "Atlantis");
                    }
                    ObservationValue::Text(_) => panic!("country must be coded"),
                }
            }
            EntryContent::Observation(_) => panic!("expected organizer"),
        }
    }

    #[test]
    fn test_signs_and_symptoms_keeps_input_order() {
        let assessments = vec![
            SymptomaticAssessment::new(1, true, at(15)),
            SymptomaticAssessment::new(2, true, at(9)),
        ];
        let section = signs_and_symptoms(&assessments, "1");
        let times: Vec<&str> = section
            .entries
            .iter()
            .map(|e| observation_of(e).effective_time.as_deref().unwrap())
            .collect();
        assert_eq!(times, vec!["20210601150000+0000", "20210601090000+0000"]);
    }
}
