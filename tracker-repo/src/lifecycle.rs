use chrono::{DateTime, Duration, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

/// Soft-delete state of a record. Serialized as a nullable timestamp.
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug, Default)]
#[serde(from = "Option<DateTime<Utc>>", into = "Option<DateTime<Utc>>")]
pub enum Deletion {
    #[default]
    Active,
    Deleted(DateTime<Utc>),
}

impl Deletion {
    pub fn is_deleted(&self) -> bool {
        matches!(self, Deletion::Deleted(_))
    }

    pub fn deleted_at(&self) -> Option<DateTime<Utc>> {
        match self {
            Deletion::Active => None,
            Deletion::Deleted(at) => Some(*at),
        }
    }
}

impl From<Option<DateTime<Utc>>> for Deletion {
    fn from(value: Option<DateTime<Utc>>) -> Self {
        match value {
            None => Deletion::Active,
            Some(at) => Deletion::Deleted(at),
        }
    }
}

impl From<Deletion> for Option<DateTime<Utc>> {
    fn from(value: Deletion) -> Self {
        value.deleted_at()
    }
}

/// Drops sub-microsecond precision, matching what a PostgreSQL `timestamptz`
/// keeps.
pub fn truncate_to_micros(at: DateTime<Utc>) -> DateTime<Utc> {
    at.trunc_subsecs(6)
}

/// Source of `created_at`, `updated_at` and `deleted_at` values.
///
/// Times are truncated to microseconds, the resolution PostgreSQL stores.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        truncate_to_micros(Utc::now())
    }
}

/// A clock that only moves when told to.
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> ManualClock {
        ManualClock {
            now: Mutex::new(truncate_to_micros(start)),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(|e| e.into_inner()) = truncate_to_micros(now);
    }

    pub fn advance(&self, by: Duration) {
        let mut guard = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *guard = truncate_to_micros(*guard + by);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_deletion_serializes_as_nullable_timestamp() {
        assert_eq!(serde_json::to_string(&Deletion::Active).unwrap(), "null");

        let at = Utc.with_ymd_and_hms(2023, 5, 1, 12, 0, 0).unwrap();
        let json = serde_json::to_string(&Deletion::Deleted(at)).unwrap();
        assert_eq!(json, "\"2023-05-01T12:00:00Z\"");

        let parsed: Deletion = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, Deletion::Deleted(at));
        assert!(parsed.is_deleted());
    }

    #[test]
    fn test_manual_clock() {
        let start = Utc.with_ymd_and_hms(2023, 5, 1, 12, 0, 0).unwrap();
        let clock = ManualClock::new(start);
        assert_eq!(clock.now(), start);

        clock.advance(Duration::seconds(90));
        assert_eq!(clock.now(), start + Duration::seconds(90));

        clock.set(start);
        assert_eq!(clock.now(), start);
    }

    #[test]
    fn test_truncate_to_micros() {
        let at = Utc.with_ymd_and_hms(2023, 5, 1, 12, 0, 0).unwrap();
        assert_eq!(truncate_to_micros(at + Duration::nanoseconds(999)), at);
        assert_eq!(
            truncate_to_micros(at + Duration::nanoseconds(1_500)),
            at + Duration::microseconds(1)
        );

        let clock = ManualClock::new(at + Duration::nanoseconds(10));
        assert_eq!(clock.now(), at);
    }

    #[test]
    fn test_system_clock_truncates_to_micros() {
        let now = SystemClock.now();
        assert_eq!(now.timestamp_subsec_nanos() % 1_000, 0);
    }
}
