use chrono::{DateTime, Utc};
use std::time::Duration;

/// Wall-clock timestamp attached to `Launch` so observers can date a run.
pub fn now_utc() -> DateTime<Utc> {
    Utc::now()
}

/// Nanoseconds in a duration, saturated to `u64`.
pub fn as_nanos_u64(d: Duration) -> u64 {
    u64::try_from(d.as_nanos()).unwrap_or(u64::MAX)
}
