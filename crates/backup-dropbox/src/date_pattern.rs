//! Dates embedded in backup file names.
//!

use core::fmt;

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, format::ParseError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A `yyyyMMdd` style pattern describing the date that directly follows a prefix in a file name.
///
/// Supported tokens are `yyyy`, `yy`, `MM`, `dd`, `HH`, `mm`, `ss` and `SSS`. Any other
/// character that is not an ASCII letter is matched literally. Two digit years fall in
/// 2000 to 2099.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DatePattern {
    /// The pattern as written in the config.
    pattern: String,

    /// The equivalent chrono format string.
    format: String,

    /// The number of characters a date written with this pattern occupies.
    width: usize,

    /// If the pattern carries a time of day.
    has_time: bool,

    /// If the year is written with two digits only.
    short_year: bool,
}

impl DatePattern {
    /// Compile a pattern.
    pub fn new(pattern: &str) -> Result<Self, PatternError> {
        if pattern.is_empty() {
            return Err(PatternError::Empty);
        }

        let mut format = String::with_capacity(pattern.len() * 2);
        let mut has_hour = false;
        let mut has_minute = false;
        let mut has_time = false;
        let mut has_long_year = false;
        let mut has_short_year = false;

        let mut characters = pattern.chars().peekable();
        while let Some(character) = characters.next() {
            if !character.is_ascii_alphabetic() {
                match character {
                    '\'' => return Err(PatternError::Quoted),
                    '%' => format.push_str("%%"),
                    literal => format.push(literal),
                }
                continue;
            }

            let mut run = 1;
            while characters.next_if_eq(&character).is_some() {
                run += 1;
            }

            let specifier = match (character, run) {
                ('y', 4) => {
                    has_long_year = true;
                    "%Y"
                }
                ('y', 2) => {
                    has_short_year = true;
                    "%y"
                }
                ('M', 2) => "%m",
                ('d', 2) => "%d",
                ('H', 2) => {
                    has_hour = true;
                    "%H"
                }
                ('m', 2) => {
                    has_minute = true;
                    "%M"
                }
                ('s', 2) => "%S",
                ('S', 3) => "%3f",
                _ => {
                    let token = character.to_string().repeat(run);
                    return Err(PatternError::UnsupportedToken(token));
                }
            };

            has_time |= matches!(character, 'H' | 'm' | 's' | 'S');
            format.push_str(specifier);
        }

        // chrono needs both an hour and a minute to build a time of day.
        if has_time && !(has_hour && has_minute) {
            return Err(PatternError::IncompleteTime);
        }

        Ok(Self {
            pattern: pattern.to_string(),
            format,
            width: pattern.chars().count(),
            has_time,
            short_year: has_short_year && !has_long_year,
        })
    }

    /// The number of characters following the prefix that hold the date.
    pub fn width(&self) -> usize {
        self.width
    }

    /// The pattern as written in the config.
    pub fn as_str(&self) -> &str {
        &self.pattern
    }

    /// Parse the date that directly follows `prefix` in `file_name`.
    ///
    /// Both arguments are expected to already be lowercased when matching case-insensitively.
    pub fn parse(&self, file_name: &str, prefix: &str) -> Result<NaiveDateTime, InvalidDateFormat> {
        let date: String = file_name
            .chars()
            .skip(prefix.chars().count())
            .take(self.width)
            .collect();

        if date.chars().count() != self.width {
            return Err(InvalidDateFormat::TooShort {
                file_name: file_name.to_string(),
                pattern: self.pattern.clone(),
            });
        }

        self.parse_date(&date)
            .map_err(|source| InvalidDateFormat::Mismatch {
                file_name: file_name.to_string(),
                date,
                pattern: self.pattern.clone(),
                source,
            })
    }

    /// Parse a date written exactly in this pattern. Date only patterns resolve to midnight.
    pub fn parse_date(&self, date: &str) -> Result<NaiveDateTime, ParseError> {
        let timestamp = if self.has_time {
            NaiveDateTime::parse_from_str(date, &self.format)?
        } else {
            NaiveDate::parse_from_str(date, &self.format)?.and_time(NaiveTime::MIN)
        };

        // chrono reads `%y` 70-99 as 19xx. Those years have the same leap status a century later.
        if self.short_year && timestamp.year() < 2000 {
            return Ok(timestamp
                .with_year(timestamp.year() + 100)
                .unwrap_or(timestamp));
        }

        Ok(timestamp)
    }

    /// Write a timestamp in this pattern.
    pub fn format(&self, timestamp: &NaiveDateTime) -> String {
        timestamp.format(&self.format).to_string()
    }
}

impl fmt::Display for DatePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pattern)
    }
}

impl TryFrom<String> for DatePattern {
    type Error = PatternError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<DatePattern> for String {
    fn from(value: DatePattern) -> Self {
        value.pattern
    }
}

#[allow(missing_docs)]
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PatternError {
    #[error("The date pattern is empty")]
    Empty,

    #[error("Quoted literals are not supported in date patterns")]
    Quoted,

    #[error("Unsupported token '{0}' in date pattern")]
    UnsupportedToken(String),

    #[error("A date pattern with a time must contain both 'HH' and 'mm'")]
    IncompleteTime,
}

/// A date in a file name did not match the configured pattern.
///
/// This points at a wrong `date_format` in the config rather than at a bad file.
#[allow(missing_docs)]
#[derive(Debug, Error)]
pub enum InvalidDateFormat {
    #[error("'{file_name}' is too short to hold a '{pattern}' date")]
    TooShort { file_name: String, pattern: String },

    #[error("'{date}' in '{file_name}' does not match the date pattern '{pattern}': {source}")]
    Mismatch {
        file_name: String,
        date: String,
        pattern: String,
        #[source]
        source: ParseError,
    },
}
