//! Best/worst contiguous hour window search.

use crate::hourly::round_half_up;
use crate::models::{FocusWindow, HourlyStats};

pub const WINDOW_HOURS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowGoal {
    Best,
    Worst,
}

/// Mean of the bucket averages in `[start, start + width)`, or `None` when any
/// hour in the window has no samples.
pub fn window_average(stats: &HourlyStats, start: usize, width: usize) -> Option<f64> {
    let mut sum = 0.0;
    for hour in start..start + width {
        let bucket = stats.buckets.get(hour)?;
        if bucket.sample_count == 0 {
            return None;
        }
        sum += bucket.average_score;
    }
    Some(sum / width as f64)
}

/// Scan every start hour and keep the strictly best (or worst) valid window.
///
/// Ties keep the earliest start hour. With no valid window at all the result
/// is start hour 0 with an average of 0.
pub fn find_window(stats: &HourlyStats, goal: WindowGoal, width: usize) -> FocusWindow {
    let mut chosen: Option<(usize, f64)> = None;

    for start in 0..=24usize.saturating_sub(width) {
        let Some(average) = window_average(stats, start, width) else {
            continue;
        };

        let improves = match (goal, chosen) {
            (_, None) => true,
            (WindowGoal::Best, Some((_, current))) => average > current,
            (WindowGoal::Worst, Some((_, current))) => average < current,
        };
        if improves {
            chosen = Some((start, average));
        }
    }

    let (start, average) = chosen.unwrap_or((0, 0.0));
    FocusWindow {
        start: format!("{start:02}:00"),
        end: format!("{:02}:00", start + width),
        avg_focus_score: round_half_up(average),
    }
}
