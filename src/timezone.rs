use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Utc};

use crate::error::{Error, Result};

pub const DEFAULT_OFFSET: &str = "+09:00";

/// Parse `Z`, `±HH`, `±HHMM` or `±HH:MM` into a fixed offset.
pub fn parse_offset(raw: &str) -> Result<FixedOffset> {
    let invalid = || Error::InvalidOffset(raw.to_string());
    let trimmed = raw.trim();

    if trimmed.eq_ignore_ascii_case("z") {
        return FixedOffset::east_opt(0).ok_or_else(invalid);
    }

    let (sign, rest) = match trimmed.chars().next() {
        Some('+') => (1, &trimmed[1..]),
        Some('-') => (-1, &trimmed[1..]),
        _ => return Err(invalid()),
    };

    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    if !digits.chars().all(|c| c.is_ascii_digit()) || rest.matches(':').count() > 1 {
        return Err(invalid());
    }

    let (hours, minutes) = match digits.len() {
        2 => (digits.parse::<i32>().map_err(|_| invalid())?, 0),
        4 => (
            digits[..2].parse::<i32>().map_err(|_| invalid())?,
            digits[2..].parse::<i32>().map_err(|_| invalid())?,
        ),
        _ => return Err(invalid()),
    };

    if hours > 18 || minutes > 59 {
        return Err(invalid());
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).ok_or_else(invalid)
}

pub fn local_hour(instant: DateTime<Utc>, offset: &FixedOffset) -> u32 {
    instant.with_timezone(offset).hour()
}

pub fn local_date(instant: DateTime<Utc>, offset: &FixedOffset) -> NaiveDate {
    instant.with_timezone(offset).date_naive()
}

/// UTC instant of local midnight at the start of `date`.
pub fn day_start(date: NaiveDate, offset: &FixedOffset) -> DateTime<Utc> {
    let local_midnight = NaiveDateTime::new(date, NaiveTime::MIN);
    (local_midnight - chrono::Duration::seconds(i64::from(offset.local_minus_utc()))).and_utc()
}
