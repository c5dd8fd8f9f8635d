//! Splitting study sessions across local calendar days.

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};

use crate::models::{DailyMinutes, StudySession};
use crate::timezone::{day_start, local_date};

/// Seconds of study credited to each local date.
///
/// Open sessions run until `now`, so their totals grow between calls until
/// the session is closed. Sessions whose effective end is not after their
/// start are ignored.
pub fn daily_seconds(
    sessions: &[StudySession],
    now: DateTime<Utc>,
    offset: &FixedOffset,
) -> BTreeMap<NaiveDate, i64> {
    let mut seconds: BTreeMap<NaiveDate, i64> = BTreeMap::new();

    for session in sessions {
        let from = session.started_at;
        let to = session.ended_at.unwrap_or(now);
        if from >= to {
            tracing::trace!(
                user_id = session.user_id,
                started_at = %from,
                "skipping empty or inverted study session"
            );
            continue;
        }

        let last_day = local_date(to, offset);
        let mut day = local_date(from, offset);
        while day <= last_day {
            let Some(next_day) = day.succ_opt() else {
                break;
            };

            let overlap_start = from.max(day_start(day, offset));
            let overlap_end = to.min(day_start(next_day, offset));
            if overlap_start < overlap_end {
                *seconds.entry(day).or_insert(0) += (overlap_end - overlap_start).num_seconds();
            }

            day = next_day;
        }
    }

    seconds
}

/// Whole minutes per local date, rounding each day's total down.
pub fn daily_minutes(
    sessions: &[StudySession],
    now: DateTime<Utc>,
    offset: &FixedOffset,
) -> DailyMinutes {
    daily_seconds(sessions, now, offset)
        .into_iter()
        .map(|(day, secs)| (day, secs.div_euclid(60)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    fn at(day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 9, day, hour, minute, 0).unwrap()
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 9, day).unwrap()
    }

    fn session(from: DateTime<Utc>, to: Option<DateTime<Utc>>) -> StudySession {
        StudySession {
            user_id: 11,
            started_at: from,
            ended_at: to,
        }
    }

    #[test]
    fn single_day_session_floors_to_minutes() {
        let from = at(3, 10, 0);
        let to = from + Duration::seconds(45 * 60 + 59);
        let minutes = daily_minutes(&[session(from, Some(to))], at(20, 0, 0), &utc());

        assert_eq!(minutes.len(), 1);
        assert_eq!(minutes[&date(3)], 45);
    }

    #[test]
    fn session_across_midnight_is_split() {
        let minutes = daily_minutes(
            &[session(at(3, 23, 30), Some(at(4, 0, 30)))],
            at(20, 0, 0),
            &utc(),
        );
        assert_eq!(minutes[&date(3)], 30);
        assert_eq!(minutes[&date(4)], 30);
        assert_eq!(minutes.values().sum::<i64>(), 60);
    }

    #[test]
    fn two_hour_session_over_midnight_gives_an_hour_each() {
        let minutes = daily_minutes(
            &[session(at(3, 23, 0), Some(at(4, 1, 0)))],
            at(20, 0, 0),
            &utc(),
        );
        assert_eq!(minutes[&date(3)], 60);
        assert_eq!(minutes[&date(4)], 60);
    }

    #[test]
    fn multi_day_session_fills_whole_days() {
        let minutes = daily_minutes(
            &[session(at(3, 12, 0), Some(at(5, 6, 0)))],
            at(20, 0, 0),
            &utc(),
        );
        assert_eq!(minutes[&date(3)], 12 * 60);
        assert_eq!(minutes[&date(4)], 24 * 60);
        assert_eq!(minutes[&date(5)], 6 * 60);
    }

    #[test]
    fn ending_exactly_at_midnight_credits_nothing_to_next_day() {
        let minutes = daily_minutes(
            &[session(at(3, 22, 0), Some(at(4, 0, 0)))],
            at(20, 0, 0),
            &utc(),
        );
        assert_eq!(minutes[&date(3)], 120);
        assert!(!minutes.contains_key(&date(4)));
    }

    #[test]
    fn inverted_and_empty_sessions_are_skipped() {
        let sessions = vec![
            session(at(3, 10, 0), Some(at(3, 9, 0))),
            session(at(3, 10, 0), Some(at(3, 10, 0))),
        ];
        assert!(daily_minutes(&sessions, at(20, 0, 0), &utc()).is_empty());
    }

    #[test]
    fn seconds_accumulate_before_flooring() {
        // 30.5 + 30.5 minutes on the same day is 61 minutes, not 60
        let first = at(3, 8, 0);
        let second = at(3, 9, 0);
        let sessions = vec![
            session(first, Some(first + Duration::seconds(1830))),
            session(second, Some(second + Duration::seconds(1830))),
        ];
        assert_eq!(daily_minutes(&sessions, at(20, 0, 0), &utc())[&date(3)], 61);
    }

    #[test]
    fn days_follow_the_reference_offset() {
        // 14:30-16:30 UTC is 23:30-01:30 at +09:00
        let kst = FixedOffset::east_opt(9 * 3600).unwrap();
        let minutes = daily_minutes(
            &[session(at(3, 14, 30), Some(at(3, 16, 30)))],
            at(20, 0, 0),
            &kst,
        );
        assert_eq!(minutes[&date(3)], 30);
        assert_eq!(minutes[&date(4)], 90);
    }

    #[test]
    fn open_session_grows_with_now() {
        // An ongoing session is measured up to the time of computation, so
        // repeated calls legitimately disagree until the session is closed.
        let sessions = vec![session(at(3, 10, 0), None)];

        let early = daily_minutes(&sessions, at(3, 10, 40), &utc());
        let later = daily_minutes(&sessions, at(3, 11, 30), &utc());
        assert_eq!(early[&date(3)], 40);
        assert_eq!(later[&date(3)], 90);

        let next_day = daily_minutes(&sessions, at(4, 2, 0), &utc());
        assert_eq!(next_day[&date(3)], 14 * 60);
        assert_eq!(next_day[&date(4)], 120);
    }

    #[test]
    fn open_session_starting_after_now_is_skipped() {
        let sessions = vec![session(at(5, 10, 0), None)];
        assert!(daily_minutes(&sessions, at(4, 0, 0), &utc()).is_empty());
    }
}
