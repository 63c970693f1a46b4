// crates/trawl-core/src/source.rs
//
// Data sources miners scrape from, and the hour-wide time buckets
// the statistics index groups content by.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TrawlError;

/// Origin platform of a piece of content.
///
/// The numeric value is the identifier stored in the statistics index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DataSource {
    Reddit = 1,
    X = 2,
    Youtube = 3,
}

impl DataSource {
    /// All known sources, in identifier order.
    pub const ALL: [DataSource; 3] = [DataSource::Reddit, DataSource::X, DataSource::Youtube];

    /// Identifier used in the statistics index.
    pub fn id(self) -> i64 {
        self as i64
    }

    /// Canonical upper-case name.
    pub fn name(self) -> &'static str {
        match self {
            DataSource::Reddit => "REDDIT",
            DataSource::X => "X",
            DataSource::Youtube => "YOUTUBE",
        }
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DataSource {
    type Err = TrawlError;

    /// Case-insensitive parse of a source name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DataSource::ALL
            .into_iter()
            .find(|source| source.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| TrawlError::invalid_source(s))
    }
}

/// One-hour bucket of content creation time, numbered from the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimeBucket(pub i64);

impl TimeBucket {
    /// Width of one bucket in seconds.
    pub const WIDTH_SECS: i64 = 3600;

    /// Bucket containing the given instant.
    pub fn from_datetime(at: DateTime<Utc>) -> Self {
        TimeBucket(at.timestamp().div_euclid(Self::WIDTH_SECS))
    }

    /// First instant covered by this bucket.
    pub fn start(self) -> Option<DateTime<Utc>> {
        self.0
            .checked_mul(Self::WIDTH_SECS)
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("reddit".parse::<DataSource>().unwrap(), DataSource::Reddit);
        assert_eq!("X".parse::<DataSource>().unwrap(), DataSource::X);
        assert_eq!("YouTube".parse::<DataSource>().unwrap(), DataSource::Youtube);
    }

    #[test]
    fn unknown_source_is_invalid_argument() {
        let err = "myspace".parse::<DataSource>().unwrap_err();
        assert!(matches!(err, TrawlError::InvalidArgument(ref m) if m == "Invalid source: myspace"));
    }

    #[test]
    fn ids_are_stable() {
        assert_eq!(DataSource::Reddit.id(), 1);
        assert_eq!(DataSource::X.id(), 2);
        assert_eq!(DataSource::Youtube.id(), 3);
    }

    #[test]
    fn serializes_as_upper_case_name() {
        assert_eq!(serde_json::to_string(&DataSource::Youtube).unwrap(), "\"YOUTUBE\"");
    }

    #[test]
    fn time_bucket_is_hours_since_epoch() {
        let at = Utc.with_ymd_and_hms(1970, 1, 2, 0, 30, 0).unwrap();
        let bucket = TimeBucket::from_datetime(at);
        assert_eq!(bucket, TimeBucket(24));
        assert_eq!(bucket.start(), Some(Utc.with_ymd_and_hms(1970, 1, 2, 0, 0, 0).unwrap()));
    }

    #[test]
    fn out_of_range_bucket_has_no_start() {
        assert_eq!(TimeBucket(i64::MAX).start(), None);
        assert_eq!(TimeBucket(i64::MIN).start(), None);
        assert_eq!(TimeBucket(i64::MAX / TimeBucket::WIDTH_SECS).start(), None);
    }
}
