//! Age calculation collaborator
//!
//! The social-history section reports the patient's age in whole years. The
//! reference date is injected so that building a document stays a pure
//! function of its inputs.

use chrono::{NaiveDate, Utc};

/// Computes a whole-years age from a date of birth
pub trait AgeCalculator: Send + Sync {
    /// Age in completed years; 0 for dates of birth after the reference date
    fn age_in_years(&self, date_of_birth: NaiveDate) -> u32;
}

/// Ages computed as of a fixed date
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgeAsOf {
    as_of: NaiveDate,
}

impl AgeAsOf {
    /// Ages as of the given date
    pub fn new(as_of: NaiveDate) -> Self {
        Self { as_of }
    }

    /// Ages as of today's UTC date
    pub fn today() -> Self {
        Self::new(Utc::now().date_naive())
    }

    /// The reference date
    pub fn as_of(&self) -> NaiveDate {
        self.as_of
    }
}

impl AgeCalculator for AgeAsOf {
    fn age_in_years(&self, date_of_birth: NaiveDate) -> u32 {
        self.as_of.years_since(date_of_birth).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test_case(date(1990, 1, 1), date(2021, 6, 1), 31 ; "after birthday")]
    #[test_case(date(1990, 6, 2), date(2021, 6, 1), 30 ; "day before birthday")]
    #[test_case(date(1990, 6, 1), date(2021, 6, 1), 31 ; "on birthday")]
    #[test_case(date(2000, 2, 29), date(2021, 2, 28), 20 ; "leap day")]
    #[test_case(date(2022, 1, 1), date(2021, 6, 1), 0 ; "future birth date")]
    fn test_age_in_years(dob: NaiveDate, as_of: NaiveDate, expected: u32) {
        assert_eq!(AgeAsOf::new(as_of).age_in_years(dob), expected);
    }
}
