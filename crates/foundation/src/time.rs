use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Local, NaiveDate};
use serde::{Deserialize, Serialize};

/// Calendar date without a time component.
///
/// Displays and parses as `yyyy-MM-dd`, the form tile endpoints expect.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CalendarDate(NaiveDate);

impl CalendarDate {
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    /// Today's date in the local timezone.
    pub fn today() -> Self {
        Self(Local::now().date_naive())
    }

    pub fn naive(&self) -> NaiveDate {
        self.0
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }
}

impl From<NaiveDate> for CalendarDate {
    fn from(d: NaiveDate) -> Self {
        Self(d)
    }
}

impl fmt::Display for CalendarDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateParseError {
    pub input: String,
    pub reason: String,
}

impl fmt::Display for DateParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid calendar date {:?} (expected yyyy-MM-dd): {}",
            self.input, self.reason
        )
    }
}

impl std::error::Error for DateParseError {}

impl FromStr for CalendarDate {
    type Err = DateParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .map(Self)
            .map_err(|e| DateParseError {
                input: s.to_string(),
                reason: e.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::CalendarDate;

    #[test]
    fn displays_as_iso_date() {
        let d = CalendarDate::from_ymd(2024, 3, 5).unwrap();
        assert_eq!(d.to_string(), "2024-03-05");
        assert_eq!(d.year(), 2024);
    }

    #[test]
    fn parses_iso_date_and_rejects_garbage() {
        let d: CalendarDate = " 2023-12-31 ".parse().unwrap();
        assert_eq!(d, CalendarDate::from_ymd(2023, 12, 31).unwrap());
        assert!("2023-02-30".parse::<CalendarDate>().is_err());
        assert!("31/12/2023".parse::<CalendarDate>().is_err());
    }

    #[test]
    fn invalid_components_yield_none() {
        assert!(CalendarDate::from_ymd(2024, 13, 1).is_none());
    }

    #[test]
    fn serializes_as_plain_string() {
        let d = CalendarDate::from_ymd(2024, 3, 15).unwrap();
        assert_eq!(serde_json::to_string(&d).unwrap(), "\"2024-03-15\"");
    }

    #[test]
    fn orders_chronologically() {
        let a = CalendarDate::from_ymd(1999, 12, 31).unwrap();
        let b = CalendarDate::from_ymd(2000, 1, 1).unwrap();
        assert!(a < b);
    }
}
