//! Entry points tying the aggregation steps together.
//!
//! Both functions are pure over already-loaded records: no I/O, no shared
//! state, same input gives the same output.

use chrono::{DateTime, FixedOffset, Utc};

use crate::allocation::daily_minutes;
use crate::attendance::{attendance_streak, weekday_graph, weekly_graph, yearly_track};
use crate::hourly::{aggregate_hourly, focus_track};
use crate::models::{FocusInsights, FocusSample, StudySession, StudyStatistics};
use crate::streak::average_focus_duration;
use crate::timezone::local_date;
use crate::window::{find_window, WindowGoal, WINDOW_HOURS};

/// Days of focus samples the insights are computed over.
pub const FOCUS_LOOKBACK_DAYS: i64 = 30;

pub fn compute_focus_insights(samples: &[FocusSample], offset: &FixedOffset) -> FocusInsights {
    let stats = aggregate_hourly(samples, offset);

    FocusInsights {
        hourly_track: stats.buckets.to_vec(),
        focus_track: focus_track(&stats),
        best_window: find_window(&stats, WindowGoal::Best, WINDOW_HOURS),
        worst_window: find_window(&stats, WindowGoal::Worst, WINDOW_HOURS),
        avg_focus_duration_minutes: average_focus_duration(samples),
    }
}

/// Study totals relative to the local date of `now` in `offset`.
pub fn compute_study_statistics(
    user_id: i64,
    sessions: &[StudySession],
    now: DateTime<Utc>,
    offset: &FixedOffset,
) -> StudyStatistics {
    let daily = daily_minutes(sessions, now, offset);
    let today = local_date(now, offset);

    StudyStatistics {
        user_id,
        attendance_streak: attendance_streak(&daily, today),
        weekday_graph: weekday_graph(&daily, today),
        weekly_graph: weekly_graph(&daily, today),
        yearly_track: yearly_track(&daily, today),
    }
}
