//! Clock and calendar-date helpers shared by models and the facade.
//!
//! # Responsibility
//! - Provide epoch-millisecond timestamps for audit fields.
//! - Derive and validate ISO `YYYY-MM-DD` effective dates for ledger events.
//!
//! # Invariants
//! - Timestamps are UTC epoch milliseconds, never wall-clock strings.
//! - Event dates are plain calendar dates; ordering is lexicographic.

use once_cell::sync::Lazy;
use regex::Regex;
use std::time::{SystemTime, UNIX_EPOCH};

static ISO_DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("valid iso date regex"));

/// Returns the current time as UTC epoch milliseconds.
pub fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as i64)
        .unwrap_or(0)
}

/// Returns today's UTC calendar date as an ISO `YYYY-MM-DD` string.
pub fn today_iso() -> String {
    epoch_ms_to_iso_date(now_epoch_ms())
}

/// Converts epoch milliseconds to an ISO `YYYY-MM-DD` UTC date string.
pub fn epoch_ms_to_iso_date(epoch_ms: i64) -> String {
    let days = epoch_ms.div_euclid(86_400_000);
    let (year, month, day) = civil_from_days(days);
    format!("{year:04}-{month:02}-{day:02}")
}

/// Returns whether `value` has the ISO `YYYY-MM-DD` shape.
pub fn is_iso_date(value: &str) -> bool {
    ISO_DATE_RE.is_match(value)
}

// Gregorian date from days since 1970-01-01 (Howard Hinnant's civil algorithm).
fn civil_from_days(days: i64) -> (i64, u32, u32) {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let year = yoe + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let month = (if mp < 10 { mp + 3 } else { mp - 9 }) as u32;
    let year = if month <= 2 { year + 1 } else { year };
    (year, month, day)
}
