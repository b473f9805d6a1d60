//! Geographic vocabulary resolver
//!
//! Maps the human-readable geography stored on patient records to standard
//! codes: FIPS state and county codes and ISO 3166-1 alpha-3 country codes.
//! Tables are loaded once at construction and only read afterwards, so one
//! resolver can be shared across any number of document builds.

use crate::domain::{PhdcError, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

const STATES_CSV: &str = include_str!("../../reference/us_states.csv");
const COUNTIES_CSV: &str = include_str!("../../reference/us_counties.csv");
const COUNTRIES_CSV: &str = include_str!("../../reference/countries.csv");

/// Designations dropped when a county name does not match as written
const COUNTY_SUFFIXES: [&str; 6] = [
    " city and borough",
    " census area",
    " municipality",
    " borough",
    " parish",
    " county",
];

/// Result of a vocabulary lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeoCode {
    /// The name was found in the reference table
    Known(String),
    /// The name is not in the reference table
    Unknown,
}

impl GeoCode {
    /// Sentinel written in place of an unmapped code (HL7 null-flavor)
    pub const UNKNOWN_CODE: &'static str = "UNK";

    /// Code to write into the document
    pub fn code(&self) -> &str {
        match self {
            GeoCode::Known(code) => code,
            GeoCode::Unknown => Self::UNKNOWN_CODE,
        }
    }

    pub fn is_known(&self) -> bool {
        matches!(self, GeoCode::Known(_))
    }
}

#[derive(Debug, Deserialize)]
struct StateRow {
    name: String,
    abbreviation: String,
    fips: String,
}

#[derive(Debug, Deserialize)]
struct CountyRow {
    state: String,
    county: String,
    fips: String,
}

#[derive(Debug, Deserialize)]
struct CountryRow {
    name: String,
    alpha3: String,
}

fn key(name: &str) -> String {
    name.trim().to_lowercase()
}

fn county_key(name: &str) -> String {
    let key = key(name);
    match key.strip_prefix("saint ") {
        Some(rest) => format!("st. {rest}"),
        None => key,
    }
}

/// Read-only lookup tables for geographic codes
#[derive(Debug, Clone, Default)]
pub struct VocabularyResolver {
    states: HashMap<String, String>,
    counties: HashMap<(String, String), String>,
    countries: HashMap<String, String>,
}

impl VocabularyResolver {
    /// Resolver with the embedded state, county and country tables
    ///
    /// An external county table loaded with
    /// [`with_county_table`](Self::with_county_table) adds to or replaces
    /// the embedded rows.
    pub fn builtin() -> Result<Self> {
        let mut resolver = Self::default();

        let mut states = csv::Reader::from_reader(STATES_CSV.as_bytes());
        for row in states.deserialize::<StateRow>() {
            let row = row?;
            resolver.states.insert(key(&row.name), row.fips.clone());
            resolver.states.insert(key(&row.abbreviation), row.fips);
        }

        let mut countries = csv::Reader::from_reader(COUNTRIES_CSV.as_bytes());
        for row in countries.deserialize::<CountryRow>() {
            let row = row?;
            resolver.countries.insert(key(&row.name), row.alpha3);
        }

        let resolver = resolver.load_counties(COUNTIES_CSV.as_bytes())?;

        tracing::debug!(
            states = resolver.states.len(),
            counties = resolver.counties.len(),
            countries = resolver.countries.len(),
            "Loaded builtin vocabulary tables"
        );

        Ok(resolver)
    }

    /// Builds a resolver from in-memory tables
    ///
    /// Entries are `(name, code)` for states and countries and
    /// `(state, county, code)` for counties.
    pub fn from_entries<'a>(
        states: impl IntoIterator<Item = (&'a str, &'a str)>,
        counties: impl IntoIterator<Item = (&'a str, &'a str, &'a str)>,
        countries: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Self {
        let mut resolver = Self {
            states: states
                .into_iter()
                .map(|(name, code)| (key(name), code.to_string()))
                .collect(),
            counties: HashMap::new(),
            countries: countries
                .into_iter()
                .map(|(name, code)| (key(name), code.to_string()))
                .collect(),
        };
        for (state, county, code) in counties {
            let entry = (resolver.state_key(state), county_key(county));
            resolver.counties.insert(entry, code.to_string());
        }
        resolver
    }

    /// Loads a county table (`state,county,fips` CSV with header) from a file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or a row is malformed
    pub fn with_county_table(self, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            PhdcError::Vocabulary(format!(
                "Failed to open county table {}: {}",
                path.display(),
                e
            ))
        })?;
        self.load_counties(file)
    }

    /// Loads a county table from any reader
    pub fn load_counties<R: Read>(mut self, reader: R) -> Result<Self> {
        let mut rows = csv::Reader::from_reader(reader);
        let before = self.counties.len();
        for row in rows.deserialize::<CountyRow>() {
            let row = row?;
            if row.fips.trim().is_empty() {
                return Err(PhdcError::Vocabulary(format!(
                    "County '{}' in '{}' has no FIPS code",
                    row.county, row.state
                )));
            }
            let entry = (self.state_key(&row.state), county_key(&row.county));
            self.counties.insert(entry, row.fips.trim().to_string());
        }
        tracing::debug!(
            counties = self.counties.len() - before,
            "Loaded county vocabulary table"
        );
        Ok(self)
    }

    /// FIPS state code for a state name or postal abbreviation
    pub fn state_code(&self, name: &str) -> GeoCode {
        Self::lookup(&self.states, &key(name), "state", name)
    }

    /// Five-digit FIPS county code for a county within a state
    ///
    /// The state may be a name or postal abbreviation. A county written with
    /// its designation ("Suffolk County", "Orleans Parish") matches the bare
    /// name unless the designated name is itself in the table.
    pub fn county_code(&self, state_name: &str, county_name: &str) -> GeoCode {
        let state = self.state_key(state_name);
        let county = county_key(county_name);
        let code = self
            .counties
            .get(&(state.clone(), county.clone()))
            .or_else(|| {
                COUNTY_SUFFIXES
                    .iter()
                    .find_map(|suffix| county.strip_suffix(suffix))
                    .and_then(|bare| self.counties.get(&(state, bare.to_string())))
            })
            .cloned();
        match code {
            Some(code) => GeoCode::Known(code),
            None => {
                tracing::warn!(
                    state = %state_name,
                    county = %county_name,
                    "Unmapped county name, writing null-flavor code"
                );
                GeoCode::Unknown
            }
        }
    }

    /// Counties are keyed by state FIPS code when the state is known
    fn state_key(&self, state_name: &str) -> String {
        let state = key(state_name);
        self.states.get(&state).cloned().unwrap_or(state)
    }

    /// ISO 3166-1 alpha-3 code for a country name
    pub fn country_alpha3(&self, name: &str) -> GeoCode {
        Self::lookup(&self.countries, &key(name), "country", name)
    }

    fn lookup(table: &HashMap<String, String>, key: &str, kind: &str, name: &str) -> GeoCode {
        match table.get(key) {
            Some(code) => GeoCode::Known(code.clone()),
            None => {
                tracing::warn!(
                    kind = kind,
                    name = %name,
                    "Unmapped geography name, writing null-flavor code"
                );
                GeoCode::Unknown
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;
    use test_case::test_case;

    #[test_case("Massachusetts", "25")]
    #[test_case("massachusetts", "25")]
    #[test_case("  NEW YORK ", "36")]
    #[test_case("DC", "11")]
    #[test_case("Puerto Rico", "72")]
    fn test_builtin_state_codes(name: &str, expected: &str) {
        let resolver = VocabularyResolver::builtin().unwrap();
        assert_eq!(resolver.state_code(name), GeoCode::Known(expected.to_string()));
    }

    #[test_case("United States", "USA")]
    #[test_case("mexico", "MEX")]
    #[test_case("Virgin Islands, British", "VGB")]
    fn test_builtin_country_codes(name: &str, expected: &str) {
        let resolver = VocabularyResolver::builtin().unwrap();
        assert_eq!(resolver.country_alpha3(name).code(), expected);
    }

    #[test]
    fn test_unmapped_names_return_sentinel() {
        let resolver = VocabularyResolver::builtin().unwrap();
        let code = resolver.state_code("Atlantis");
        assert_eq!(code, GeoCode::Unknown);
        assert_eq!(code.code(), "UNK");
        assert_eq!(resolver.country_alpha3("").code(), "UNK");
        assert!(!resolver.county_code("Massachusetts", "Gotham").is_known());
        assert!(!resolver.county_code("Atlantis", "Suffolk").is_known());
    }

    #[test_case("Massachusetts", "Suffolk", "25025" ; "by state name")]
    #[test_case("MA", "suffolk county", "25025" ; "by abbreviation with designation")]
    #[test_case("Illinois", "Cook", "17031" ; "cook")]
    #[test_case("Texas", "Harris County", "48201" ; "harris")]
    #[test_case("Louisiana", "Orleans Parish", "22071" ; "parish")]
    #[test_case("Alaska", "Anchorage Municipality", "02020" ; "alaska municipality")]
    #[test_case("Virginia", "Fairfax County", "51059" ; "virginia county")]
    #[test_case("Virginia", "Fairfax City", "51600" ; "virginia independent city")]
    #[test_case("Missouri", "Saint Louis", "29189" ; "saint spelled out")]
    #[test_case("Florida", "Miami-Dade", "12086" ; "miami dade")]
    #[test_case("Puerto Rico", "Mayaguez", "72097" ; "unaccented municipio")]
    #[test_case("District of Columbia", "District of Columbia", "11001" ; "district")]
    fn test_builtin_county_codes(state: &str, county: &str, expected: &str) {
        let resolver = VocabularyResolver::builtin().unwrap();
        assert_eq!(
            resolver.county_code(state, county),
            GeoCode::Known(expected.to_string())
        );
    }

    #[test]
    fn test_county_table_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "state,county,fips").unwrap();
        writeln!(file, "Massachusetts,Suffolk,25999").unwrap();
        writeln!(file, "\"Connecticut\",\"Capitol\",09110").unwrap();
        file.flush().unwrap();

        let resolver = VocabularyResolver::builtin()
            .unwrap()
            .with_county_table(file.path())
            .unwrap();

        assert_eq!(resolver.county_code("massachusetts", "SUFFOLK").code(), "25999");
        assert_eq!(resolver.county_code("CT", "Capitol").code(), "09110");
        assert_eq!(resolver.county_code("Massachusetts", "Middlesex").code(), "25017");
    }

    #[test]
    fn test_county_table_missing_file() {
        let result = VocabularyResolver::default().with_county_table("/nonexistent/counties.csv");
        assert!(matches!(result, Err(PhdcError::Vocabulary(_))));
    }

    #[test]
    fn test_county_row_without_code_is_rejected() {
        let data = "state,county,fips\nOhio,Franklin,\n";
        let result = VocabularyResolver::default().load_counties(data.as_bytes());
        assert!(result.is_err());
    }

    #[test]
    fn test_from_entries() {
        let resolver = VocabularyResolver::from_entries(
            [("State 1", "91")],
            [("State 1", "County 2", "91002")],
            [("Narnia", "NRN")],
        );
        assert_eq!(resolver.state_code("state 1").code(), "91");
        assert_eq!(resolver.county_code("State 1", "county 2").code(), "91002");
        assert_eq!(resolver.country_alpha3("NARNIA").code(), "NRN");
    }
}
