//! Sample parsing and Log Record formatting
//!
//! Every line in the source file and in the three logs has the shape
//! `DD.MM.YYYY HH:MM:SS <value>`, interpreted in the local timezone.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};

pub const DATE_FORMAT: &str = "%d.%m.%Y";
pub const TIME_FORMAT: &str = "%H:%M:%S";
const TIMESTAMP_FORMAT: &str = "%d.%m.%Y %H:%M:%S";

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseError {
    #[error("expected 3 fields (date, time, value), got {0}")]
    FieldCount(usize),
    #[error("invalid date '{0}'")]
    InvalidDate(String),
    #[error("invalid time '{0}'")]
    InvalidTime(String),
    #[error("invalid value '{0}'")]
    InvalidValue(String),
    #[error("local time {0} does not exist")]
    NonexistentLocalTime(NaiveDateTime),
}

/// One measurement read from the source
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub timestamp: DateTime<Local>,
    pub value: f64,
}

impl Sample {
    pub fn new(timestamp: DateTime<Local>, value: f64) -> Self {
        Self { timestamp, value }
    }

    /// Parse a sample from one source line
    ///
    /// Blank lines yield `Ok(None)` and are skipped without complaint.
    pub fn from_line(line: &str) -> Result<Option<Self>, ParseError> {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.is_empty() {
            return Ok(None);
        }
        if fields.len() != 3 {
            return Err(ParseError::FieldCount(fields.len()));
        }

        let timestamp = parse_timestamp(fields[0], fields[1])?;
        let value: f64 = fields[2]
            .parse()
            .map_err(|_| ParseError::InvalidValue(fields[2].to_string()))?;
        if !value.is_finite() {
            return Err(ParseError::InvalidValue(fields[2].to_string()));
        }

        Ok(Some(Self { timestamp, value }))
    }

    /// Render as a Log Record line (no trailing newline)
    pub fn to_record(&self) -> String {
        format_record(self.timestamp, self.value)
    }
}

/// Combine a date token and a time token into a local timestamp
///
/// A wall time inside a DST fold resolves to the earlier instant.
pub fn parse_timestamp(date: &str, time: &str) -> Result<DateTime<Local>, ParseError> {
    let date = NaiveDate::parse_from_str(date, DATE_FORMAT)
        .map_err(|_| ParseError::InvalidDate(date.to_string()))?;
    let time = NaiveTime::parse_from_str(time, TIME_FORMAT)
        .map_err(|_| ParseError::InvalidTime(time.to_string()))?;
    let naive = NaiveDateTime::new(date, time);

    Local
        .from_local_datetime(&naive)
        .earliest()
        .ok_or(ParseError::NonexistentLocalTime(naive))
}

/// Extract only the timestamp of a Log Record, as the compactor needs
pub fn record_timestamp(line: &str) -> Option<DateTime<Local>> {
    Sample::from_line(line).ok().flatten().map(|s| s.timestamp)
}

pub fn format_timestamp(timestamp: DateTime<Local>) -> String {
    timestamp.format(TIMESTAMP_FORMAT).to_string()
}

/// `DD.MM.YYYY HH:MM:SS <value>` with the value at 2 decimals
pub fn format_record(timestamp: DateTime<Local>, value: f64) -> String {
    format!("{} {:.2}", format_timestamp(timestamp), value)
}
