use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;
use thiserror::Error;
use time::{macros::format_description, Date, Month, OffsetDateTime, Time};

/// Earliest year the tracker will lay out a calendar for
pub(crate) const MIN_YEAR: i32 = 1;

/// Latest year the tracker will lay out a calendar for; every key in
/// `MIN_YEAR..=MAX_YEAR` has a four-digit year component
pub(crate) const MAX_YEAR: i32 = 9999;

/// Truncate `moment` to midnight at its own UTC offset.  Applied to a local
/// timestamp, this yields local midnight.
pub(crate) fn normalize(moment: OffsetDateTime) -> OffsetDateTime {
    moment.replace_time(Time::MIDNIGHT)
}

/// A calendar year within the supported range, together with its first and
/// last days
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub(crate) struct Year {
    value: i32,
    start: Date,
    end: Date,
}

impl Year {
    pub(crate) fn new(value: i32) -> Result<Year, YearError> {
        if !(MIN_YEAR..=MAX_YEAR).contains(&value) {
            return Err(YearError::OutOfRange(value));
        }
        let start = Date::from_calendar_date(value, Month::January, 1)
            .map_err(|_| YearError::OutOfRange(value))?;
        let end = Date::from_calendar_date(value, Month::December, 31)
            .map_err(|_| YearError::OutOfRange(value))?;
        Ok(Year { value, start, end })
    }

    /// The year that `date` falls in
    pub(crate) fn of(date: Date) -> Result<Year, YearError> {
        Year::new(date.year())
    }

    pub(crate) fn get(self) -> i32 {
        self.value
    }

    /// January 1 of the year
    pub(crate) fn start(self) -> Date {
        self.start
    }

    /// December 31 of the year
    pub(crate) fn end(self) -> Date {
        self.end
    }

    pub(crate) fn contains(self, date: Date) -> bool {
        (self.start..=self.end).contains(&date)
    }

    /// Move `date` onto the nearest day that lies within the year
    pub(crate) fn clamp(self, date: Date) -> Date {
        date.clamp(self.start, self.end)
    }
}

impl fmt::Display for Year {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl TryFrom<i32> for Year {
    type Error = YearError;

    fn try_from(value: i32) -> Result<Year, YearError> {
        Year::new(value)
    }
}

impl FromStr for Year {
    type Err = YearError;

    fn from_str(s: &str) -> Result<Year, YearError> {
        let value = s.parse::<i32>().map_err(|source| YearError::Parse {
            value: s.to_owned(),
            source,
        })?;
        Year::new(value)
    }
}

#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub(crate) enum YearError {
    #[error("year {0} is outside the supported range {MIN_YEAR}..={MAX_YEAR}")]
    OutOfRange(i32),
    #[error("invalid year {value:?}")]
    Parse {
        value: String,
        #[source]
        source: ParseIntError,
    },
}

/// Canonical `YYYY-MM-DD` identity of a calendar date.  This is the key under
/// which marked days are stored, both in memory and in the year document.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub(crate) struct DateKey(Date);

impl DateKey {
    pub(crate) fn date(self) -> Date {
        self.0
    }
}

/// Key a real date.  Blank grid cells have no key; see [`DayCell::key`].
pub(crate) fn format_key(date: Date) -> DateKey {
    DateKey(date)
}

impl From<Date> for DateKey {
    fn from(date: Date) -> DateKey {
        DateKey(date)
    }
}

impl fmt::Display for DateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02}",
            self.0.year(),
            u8::from(self.0.month()),
            self.0.day()
        )
    }
}

impl FromStr for DateKey {
    type Err = DateKeyError;

    fn from_str(s: &str) -> Result<DateKey, DateKeyError> {
        let date = Date::parse(s, format_description!("[year]-[month]-[day]")).map_err(
            |source| DateKeyError::Parse {
                key: s.to_owned(),
                source,
            },
        )?;
        let key = DateKey(date);
        // The parser is lenient about signs and widths; only the canonical
        // spelling identifies a key.
        if key.to_string() == s {
            Ok(key)
        } else {
            Err(DateKeyError::NonCanonical(s.to_owned()))
        }
    }
}

#[derive(Debug, Error)]
pub(crate) enum DateKeyError {
    #[error("invalid date key {key:?}")]
    Parse {
        key: String,
        #[source]
        source: time::error::Parse,
    },
    #[error("date key {0:?} is not in YYYY-MM-DD form")]
    NonCanonical(String),
}

/// One position in a month's grid
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub(crate) enum DayCell {
    /// Padding before the first of the month
    Blank,
    Day(Date),
}

impl DayCell {
    /// True for cells holding a real date
    pub(crate) fn is_valid(self) -> bool {
        matches!(self, DayCell::Day(_))
    }

    pub(crate) fn date(self) -> Option<Date> {
        match self {
            DayCell::Blank => None,
            DayCell::Day(date) => Some(date),
        }
    }

    pub(crate) fn key(self) -> Result<DateKey, InvalidDateError> {
        self.date().map(format_key).ok_or(InvalidDateError)
    }
}

#[derive(Clone, Copy, Debug, Eq, Error, PartialEq)]
#[error("blank calendar cell has no date")]
pub(crate) struct InvalidDateError;
