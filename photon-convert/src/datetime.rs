use std::fmt;
use std::str::FromStr;

use photon_result::{Error, Result};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// Point in time stored by date/time columns.
///
/// Thin wrapper over [`time::OffsetDateTime`]. The string form is RFC 3339 and
/// the default value is the Unix epoch, which gives date/time columns a
/// well-defined empty cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DateTime(OffsetDateTime);

impl DateTime {
    pub const UNIX_EPOCH: DateTime = DateTime(OffsetDateTime::UNIX_EPOCH);

    /// Current time in UTC.
    pub fn now() -> Self {
        DateTime(OffsetDateTime::now_utc())
    }

    pub fn from_unix_timestamp(seconds: i64) -> Result<Self> {
        OffsetDateTime::from_unix_timestamp(seconds)
            .map(DateTime)
            .map_err(|_| Error::overflow(seconds, "DateTime"))
    }

    #[inline]
    pub fn unix_timestamp(&self) -> i64 {
        self.0.unix_timestamp()
    }

    #[inline]
    pub fn as_offset_date_time(&self) -> OffsetDateTime {
        self.0
    }
}

impl Default for DateTime {
    fn default() -> Self {
        DateTime::UNIX_EPOCH
    }
}

impl From<OffsetDateTime> for DateTime {
    fn from(value: OffsetDateTime) -> Self {
        DateTime(value)
    }
}

impl From<DateTime> for OffsetDateTime {
    fn from(value: DateTime) -> Self {
        value.0
    }
}

impl fmt::Display for DateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // RFC 3339 cannot express years outside 0000..=9999.
        match self.0.format(&Rfc3339) {
            Ok(text) => f.write_str(&text),
            Err(_) => write!(f, "{:?}", self.0),
        }
    }
}

impl FromStr for DateTime {
    type Err = Error;

    fn from_str(text: &str) -> Result<Self> {
        OffsetDateTime::parse(text.trim(), &Rfc3339)
            .map(DateTime)
            .map_err(|_| Error::parse_failed(text, "DateTime"))
    }
}
