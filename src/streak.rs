//! Sustained-focus run lengths.

use crate::hourly::round_half_up;
use crate::models::FocusSample;

pub const FOCUS_THRESHOLD: i32 = 80;
pub const MINUTES_PER_SAMPLE: f64 = 2.0;

/// Lengths of maximal runs of samples at or above the threshold, in
/// chronological order. Samples sharing a timestamp keep their input order.
pub fn focus_streaks(samples: &[FocusSample]) -> Vec<usize> {
    let mut ordered: Vec<&FocusSample> = samples.iter().collect();
    ordered.sort_by_key(|sample| sample.timestamp);

    let mut streaks = Vec::new();
    let mut current = 0usize;

    for sample in ordered {
        if sample.status >= FOCUS_THRESHOLD {
            current += 1;
        } else if current > 0 {
            streaks.push(current);
            current = 0;
        }
    }
    if current > 0 {
        streaks.push(current);
    }

    streaks
}

/// Typical uninterrupted focus duration in minutes, 0 when nothing qualifies.
pub fn average_focus_duration(samples: &[FocusSample]) -> i64 {
    let streaks = focus_streaks(samples);
    if streaks.is_empty() {
        return 0;
    }

    let mean = streaks.iter().sum::<usize>() as f64 / streaks.len() as f64;
    round_half_up(mean * MINUTES_PER_SAMPLE)
}
