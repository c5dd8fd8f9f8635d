//! Attendance streak and study-time graphs built from daily minutes.

use chrono::{Datelike, Days, Months, NaiveDate};

use crate::models::{DailyMinutes, TrackPoint};

/// Minutes a day needs before it counts as attended.
pub const ATTENDANCE_MINUTES: i64 = 60;
pub const WEEKLY_GRAPH_WEEKS: u64 = 5;

fn minutes_on(daily: &DailyMinutes, day: NaiveDate) -> i64 {
    daily.get(&day).copied().unwrap_or(0)
}

fn attended(daily: &DailyMinutes, day: NaiveDate) -> bool {
    minutes_on(daily, day) >= ATTENDANCE_MINUTES
}

/// Consecutive attended days ending yesterday, plus one if today is attended.
///
/// Today can only extend the streak: a short day today leaves the run that
/// ended yesterday intact.
pub fn attendance_streak(daily: &DailyMinutes, today: NaiveDate) -> u32 {
    let mut streak = 0;
    let mut day = today.pred_opt();
    while let Some(current) = day {
        if !attended(daily, current) {
            break;
        }
        streak += 1;
        day = current.pred_opt();
    }

    if attended(daily, today) {
        streak += 1;
    }
    streak
}

/// Monday of the week containing `day`.
pub fn week_start(day: NaiveDate) -> NaiveDate {
    day - Days::new(u64::from(day.weekday().num_days_from_monday()))
}

/// Whole hours per day of the current Monday-Sunday week, indexed Sunday = 0.
pub fn weekday_graph(daily: &DailyMinutes, today: NaiveDate) -> [i64; 7] {
    let mut graph = [0i64; 7];
    for day in week_start(today).iter_days().take(7) {
        let index = day.weekday().num_days_from_sunday() as usize;
        graph[index] = minutes_on(daily, day) / 60;
    }
    graph
}

/// Whole hours per week for the five weeks ending with the current one,
/// oldest first.
pub fn weekly_graph(daily: &DailyMinutes, today: NaiveDate) -> Vec<i64> {
    let monday = week_start(today);
    (0..WEEKLY_GRAPH_WEEKS)
        .rev()
        .map(|weeks_back| {
            let start = monday - Days::new(weeks_back * 7);
            let minutes: i64 = start
                .iter_days()
                .take(7)
                .map(|day| minutes_on(daily, day))
                .sum();
            minutes / 60
        })
        .collect()
}

/// Every date from one year before `today` through `today`, gaps filled with 0.
pub fn yearly_track(daily: &DailyMinutes, today: NaiveDate) -> Vec<TrackPoint> {
    let first = today.checked_sub_months(Months::new(12)).unwrap_or(today);
    first
        .iter_days()
        .take_while(|day| *day <= today)
        .map(|date| TrackPoint {
            date,
            minutes: minutes_on(daily, date),
        })
        .collect()
}
