//! High-precision timestamps and calendar dates

use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

use chrono::{DateTime, NaiveDate, TimeZone, Utc};

use crate::error::CodecError;
use crate::value::Value;

const NANOS_PER_MILLI: i64 = 1_000_000;
const NANOS_PER_SECOND: i128 = 1_000_000_000;

/// An instant as milliseconds from the Unix epoch plus a nanosecond remainder.
///
/// The remainder is normally the sub-millisecond part but construction does
/// not require it; it may even exceed one second. Comparison, hashing, and
/// formatting all normalize to total nanoseconds, so sorting is chronological
/// regardless of how an instant was split.
#[derive(Debug, Clone, Copy)]
pub struct Timestamp {
    millis: i64,
    nanos: i64,
}

impl Timestamp {
    /// Raw constructor; `nanos` is added to `millis` on comparison.
    pub fn new(millis: i64, nanos: i64) -> Self {
        Timestamp { millis, nanos }
    }

    /// Instant at whole-second granularity. Inputs beyond the millisecond
    /// range saturate and are rejected later when formatted.
    pub fn from_epoch_seconds(seconds: i64) -> Self {
        Timestamp::new(seconds.saturating_mul(1_000), 0)
    }

    /// Instant at millisecond granularity.
    pub fn from_epoch_millis(millis: i64) -> Self {
        Timestamp::new(millis, 0)
    }

    /// Instant at microsecond granularity.
    pub fn from_epoch_micros(micros: i64) -> Self {
        Timestamp::new(micros.div_euclid(1_000), micros.rem_euclid(1_000) * 1_000)
    }

    /// Instant at nanosecond granularity.
    pub fn from_epoch_nanos(nanos: i64) -> Self {
        Timestamp::new(
            nanos.div_euclid(NANOS_PER_MILLI),
            nanos.rem_euclid(NANOS_PER_MILLI),
        )
    }

    /// Milliseconds from the epoch, as constructed.
    pub fn millis(&self) -> i64 {
        self.millis
    }

    /// Nanosecond remainder, as constructed.
    pub fn nanos(&self) -> i64 {
        self.nanos
    }

    /// Total nanoseconds from the epoch after normalization.
    pub fn total_nanos(&self) -> i128 {
        self.millis as i128 * NANOS_PER_MILLI as i128 + self.nanos as i128
    }

    /// Parse an RFC 3339 offset date-time with up to nine fractional digits,
    /// preserving sub-millisecond precision exactly as written.
    pub fn parse_rfc3339(text: &str) -> Result<Self, CodecError> {
        let parsed = DateTime::parse_from_rfc3339(text)
            .map_err(|_| CodecError::InvalidTimestamp(text.to_string()))?;
        let instant = parsed.with_timezone(&Utc);
        let seconds = instant.timestamp();
        let subsec = i64::from(instant.timestamp_subsec_nanos());
        Ok(Timestamp {
            millis: seconds * 1_000 + subsec / NANOS_PER_MILLI,
            nanos: subsec % NANOS_PER_MILLI,
        })
    }

    /// RFC 3339 text with exactly nine fractional digits and a `Z` suffix.
    pub fn to_rfc3339(&self) -> Result<String, CodecError> {
        let total = self.total_nanos();
        let seconds = i64::try_from(total.div_euclid(NANOS_PER_SECOND))
            .map_err(|_| CodecError::TimestampRange)?;
        let subsec = total.rem_euclid(NANOS_PER_SECOND) as u32;
        let instant = Utc
            .timestamp_opt(seconds, subsec)
            .single()
            .ok_or(CodecError::TimestampRange)?;
        Ok(instant.format("%Y-%m-%dT%H:%M:%S%.9fZ").to_string())
    }
}

impl PartialEq for Timestamp {
    fn eq(&self, other: &Self) -> bool {
        self.total_nanos() == other.total_nanos()
    }
}

impl Eq for Timestamp {}

impl Hash for Timestamp {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.total_nanos().hash(state);
    }
}

impl PartialOrd for Timestamp {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Timestamp {
    fn cmp(&self, other: &Self) -> Ordering {
        self.total_nanos().cmp(&other.total_nanos())
    }
}

impl From<Timestamp> for Value {
    fn from(ts: Timestamp) -> Value {
        Value::Timestamp(ts)
    }
}

/// A plain calendar date with no time or zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Date(NaiveDate);

impl Date {
    /// Build a date from year, month, and day; `None` for invalid triples.
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Date)
    }

    /// Parse a `YYYY-MM-DD` literal with no time component.
    pub fn parse(text: &str) -> Result<Self, CodecError> {
        NaiveDate::parse_from_str(text, "%Y-%m-%d")
            .map(Date)
            .map_err(|_| CodecError::InvalidDate(text.to_string()))
    }

    /// The underlying calendar date.
    pub fn naive(&self) -> NaiveDate {
        self.0
    }

    /// `YYYY-MM-DD` text.
    pub fn to_iso(&self) -> String {
        self.0.format("%Y-%m-%d").to_string()
    }
}

impl From<NaiveDate> for Date {
    fn from(date: NaiveDate) -> Date {
        Date(date)
    }
}

impl From<Date> for Value {
    fn from(date: Date) -> Value {
        Value::Date(date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_parse_preserves_submillisecond_precision() {
        let ts = Timestamp::parse_rfc3339("1970-01-01T00:05:02.010000000Z").unwrap();
        assert_eq!(ts.millis(), 5 * 60 * 1_000 + 2_010);
        assert_eq!(ts.nanos(), 0);

        let ts = Timestamp::parse_rfc3339("1970-01-01T00:00:00.000000001Z").unwrap();
        assert_eq!(ts.millis(), 0);
        assert_eq!(ts.nanos(), 1);
    }

    #[test]
    fn test_timestamp_parse_partial_fractions() {
        let cases = vec![
            ("1970-01-01T00:00:01Z", 1_000, 0),
            ("1970-01-01T00:00:01.5Z", 1_500, 0),
            ("1970-01-01T00:00:01.001Z", 1_001, 0),
            ("1970-01-01T00:00:01.000001Z", 1_000, 1_000),
        ];
        for (text, millis, nanos) in cases {
            let ts = Timestamp::parse_rfc3339(text).unwrap();
            assert_eq!(ts.millis(), millis, "{}", text);
            assert_eq!(ts.nanos(), nanos, "{}", text);
        }
    }

    #[test]
    fn test_timestamp_parse_honors_offsets() {
        let offset = Timestamp::parse_rfc3339("1970-01-01T01:00:00+01:00").unwrap();
        let zulu = Timestamp::parse_rfc3339("1970-01-01T00:00:00Z").unwrap();
        assert_eq!(offset, zulu);
    }

    #[test]
    fn test_timestamp_parse_rejects_garbage() {
        let invalid = vec!["", "1970-01-01", "not a time", "1970-01-01T00:00:00"];
        for text in invalid {
            assert!(Timestamp::parse_rfc3339(text).is_err(), "{}", text);
        }
    }

    #[test]
    fn test_timestamp_format_always_nine_digits() {
        let cases = vec![
            (Timestamp::from_epoch_seconds(302), "1970-01-01T00:05:02.000000000Z"),
            (Timestamp::from_epoch_millis(302_010), "1970-01-01T00:05:02.010000000Z"),
            (Timestamp::new(0, 1), "1970-01-01T00:00:00.000000001Z"),
        ];
        for (ts, expected) in cases {
            assert_eq!(ts.to_rfc3339().unwrap(), expected);
        }
    }

    #[test]
    fn test_timestamp_format_before_epoch() {
        let ts = Timestamp::from_epoch_millis(-1);
        assert_eq!(ts.to_rfc3339().unwrap(), "1969-12-31T23:59:59.999000000Z");
    }

    #[test]
    fn test_timestamp_ordering_across_granularities() {
        let mut instants = vec![
            Timestamp::from_epoch_nanos(1_000_000_001),
            Timestamp::from_epoch_seconds(2),
            Timestamp::from_epoch_micros(1_000_100),
            Timestamp::from_epoch_millis(1_001),
            Timestamp::from_epoch_seconds(1),
        ];
        instants.sort();
        let ordered: Vec<i128> = instants.iter().map(Timestamp::total_nanos).collect();
        assert_eq!(
            ordered,
            vec![
                1_000_000_000,
                1_000_000_001,
                1_000_100_000,
                1_001_000_000,
                2_000_000_000
            ]
        );
    }

    #[test]
    fn test_extreme_seconds_saturate_instead_of_overflowing() {
        let far_future = Timestamp::from_epoch_seconds(i64::MAX);
        assert_eq!(far_future.millis(), i64::MAX);
        assert!(far_future.to_rfc3339().is_err());

        let far_past = Timestamp::from_epoch_seconds(i64::MIN);
        assert_eq!(far_past.millis(), i64::MIN);
        assert!(far_past.to_rfc3339().is_err());
    }

    #[test]
    fn test_timestamp_equality_normalizes_the_remainder() {
        // A remainder beyond one second is folded in on comparison.
        let folded = Timestamp::new(0, 2_500_000_000);
        let plain = Timestamp::new(2_500, 0);
        assert_eq!(folded, plain);
    }

    #[test]
    fn test_date_parse_and_format() {
        let date = Date::parse("2019-02-28").unwrap();
        assert_eq!(date, Date::from_ymd(2019, 2, 28).unwrap());
        assert_eq!(date.to_iso(), "2019-02-28");
    }

    #[test]
    fn test_date_rejects_time_components_and_bad_days() {
        let invalid = vec!["2019-02-30", "2019-13-01", "2019-02-28T00:00:00Z", "nope"];
        for text in invalid {
            assert!(Date::parse(text).is_err(), "{}", text);
        }
    }
}
