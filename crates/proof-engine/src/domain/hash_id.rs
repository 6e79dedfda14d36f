//! # Hash Id Timestamps
//!
//! A hash id is a time-ordered UUID. The submission time printed on a proof
//! is recovered from it rather than read from the clock, so the same id
//! always yields the same document.
//!
//! Supported layouts:
//!
//! - **v1**: 60-bit count of 100ns intervals since 1582-10-15 (Gregorian
//!   reform), split across `time_low`, `time_mid` and `time_hi`.
//! - **v7**: 48-bit Unix milliseconds prefix.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use uuid::Uuid;

/// 100ns ticks per second in a v1 timestamp.
const TICKS_PER_SECOND: u64 = 10_000_000;

/// Submission time embedded in `hash_id`, truncated to whole seconds.
///
/// Returns `None` for UUID versions that carry no timestamp.
pub fn submitted_at(hash_id: &Uuid) -> Option<DateTime<Utc>> {
    match hash_id.get_version_num() {
        1 => gregorian_time(hash_id),
        7 => {
            let (seconds, _) = hash_id.get_timestamp()?.to_unix();
            DateTime::from_timestamp(i64::try_from(seconds).ok()?, 0)
        }
        _ => None,
    }
}

fn gregorian_time(hash_id: &Uuid) -> Option<DateTime<Utc>> {
    let (time_low, time_mid, time_hi_and_version, _) = hash_id.as_fields();
    let ticks = (u64::from(time_hi_and_version & 0x0FFF) << 48)
        | (u64::from(time_mid) << 32)
        | u64::from(time_low);

    // v1 ids may predate 1970, so count forward from the Gregorian epoch
    // instead of converting to Unix time.
    let epoch = NaiveDate::from_ymd_opt(1582, 10, 15)?
        .and_hms_opt(0, 0, 0)?
        .and_utc();
    let seconds = i64::try_from(ticks / TICKS_PER_SECOND).ok()?;
    epoch.checked_add_signed(Duration::seconds(seconds))
}
