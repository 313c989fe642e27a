use chrono::{DateTime, Utc};
use std::fmt::{Display, Formatter};

use crate::common::{CREATE_TIME, UPDATE_TIME};
use crate::errors::{ErrorKind, SnapshotError, SnapshotResult};

const NANOS_PER_SECOND: u32 = 1_000_000_000;

/// A point in time with nanosecond precision, as stored by the backend.
///
/// Timestamps are totally ordered (seconds first, then nanoseconds) and convert
/// to and from `chrono::DateTime<Utc>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Timestamp {
    seconds: i64,
    nanos: u32,
}

impl Timestamp {
    /// Creates a timestamp from seconds since the Unix epoch and a sub-second
    /// nanosecond part.
    ///
    /// # Errors
    ///
    /// Fails with `InvalidOperation` if `nanos` is not below one second.
    pub fn new(seconds: i64, nanos: u32) -> SnapshotResult<Self> {
        if nanos >= NANOS_PER_SECOND {
            log::error!("Timestamp nanos {} out of range", nanos);
            return Err(SnapshotError::new(
                "Timestamp nanoseconds must be below one second",
                ErrorKind::InvalidOperation,
            ));
        }
        Ok(Timestamp { seconds, nanos })
    }

    /// Creates a timestamp at a whole number of seconds.
    pub fn from_seconds(seconds: i64) -> Self {
        Timestamp { seconds, nanos: 0 }
    }

    /// The current wall-clock time.
    pub fn now() -> Self {
        Timestamp::from(Utc::now())
    }

    pub fn seconds(&self) -> i64 {
        self.seconds
    }

    pub fn nanos(&self) -> u32 {
        self.nanos
    }

    /// Converts to a `DateTime<Utc>`, or `None` if out of chrono's range.
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::<Utc>::from_timestamp(self.seconds, self.nanos)
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(value: DateTime<Utc>) -> Self {
        Timestamp {
            seconds: value.timestamp(),
            nanos: value.timestamp_subsec_nanos(),
        }
    }
}

impl Display for Timestamp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.to_datetime() {
            Some(dt) => write!(f, "{}", dt.to_rfc3339()),
            None => write!(f, "Timestamp({}s, {}ns)", self.seconds, self.nanos),
        }
    }
}

/// The two auto-managed timestamp fields of a schema that opts into
/// timestamp tracking.
///
/// Their wire names are fixed and never go through the field registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimestampKey {
    CreateTime,
    UpdateTime,
}

impl TimestampKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimestampKey::CreateTime => CREATE_TIME,
            TimestampKey::UpdateTime => UPDATE_TIME,
        }
    }
}

impl Display for TimestampKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
