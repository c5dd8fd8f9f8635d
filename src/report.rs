use std::fmt::Write;

use chrono::FixedOffset;

use crate::attendance::ATTENDANCE_MINUTES;
use crate::models::{FocusResponse, StudyStatistics, TrackPoint};

const WEEKDAY_LABELS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

/// Most recent days with any study time, newest first.
pub fn recent_active_days(track: &[TrackPoint], limit: usize) -> Vec<&TrackPoint> {
    track
        .iter()
        .rev()
        .filter(|point| point.minutes > 0)
        .take(limit)
        .collect()
}

pub fn build_report(
    offset: &FixedOffset,
    focus: &FocusResponse,
    study: &StudyStatistics,
) -> String {
    let insights = &focus.insights;
    let mut output = String::new();

    let _ = writeln!(output, "# Focus & Study Report");
    let _ = writeln!(
        output,
        "Generated for user {} (times in UTC{})",
        focus.user_id, offset
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Focus (last 30 days)");

    let sampled_hours = insights
        .hourly_track
        .iter()
        .filter(|bucket| bucket.sample_count > 0)
        .count();

    if sampled_hours == 0 {
        let _ = writeln!(output, "No focus samples recorded for this window.");
    } else {
        let _ = writeln!(
            output,
            "- Best window: {}-{} (avg score {})",
            insights.best_window.start,
            insights.best_window.end,
            insights.best_window.avg_focus_score
        );
        let _ = writeln!(
            output,
            "- Worst window: {}-{} (avg score {})",
            insights.worst_window.start,
            insights.worst_window.end,
            insights.worst_window.avg_focus_score
        );
        let _ = writeln!(
            output,
            "- Sustained focus: {} minutes on average",
            insights.avg_focus_duration_minutes
        );
        let _ = writeln!(output, "- Hours with data: {sampled_hours} of 24");
    }
    let _ = writeln!(output);
    let _ = writeln!(output, "> {}", focus.feedback);

    let _ = writeln!(output);
    let _ = writeln!(output, "## Study Time");
    let _ = writeln!(
        output,
        "Attendance streak: {} day(s) of at least {} minutes",
        study.attendance_streak, ATTENDANCE_MINUTES
    );

    let _ = writeln!(output);
    let _ = writeln!(output, "### This week (hours)");
    // Monday first, matching how the week is bounded
    for index in [1, 2, 3, 4, 5, 6, 0] {
        let _ = writeln!(
            output,
            "- {}: {}",
            WEEKDAY_LABELS[index], study.weekday_graph[index]
        );
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "### Last five weeks (hours, oldest first)");
    let weeks: Vec<String> = study.weekly_graph.iter().map(|h| h.to_string()).collect();
    let _ = writeln!(output, "{}", weeks.join(" | "));

    let _ = writeln!(output);
    let _ = writeln!(output, "### Recent study days");
    let recent = recent_active_days(&study.yearly_track, 10);
    if recent.is_empty() {
        let _ = writeln!(output, "No study time recorded in the past year.");
    } else {
        for point in recent {
            let _ = writeln!(output, "- {}: {} minutes", point.date, point.minutes);
        }
    }

    output
}
