//! Hour-of-day bucketing of focus samples.

use chrono::FixedOffset;

use crate::models::{FocusSample, FocusTrack, HourBucket, HourlyStats};
use crate::timezone::local_hour;

/// Group samples by local hour and average their scores.
///
/// Empty hours keep `average_score == 0.0` and `sample_count == 0`; callers
/// must look at the count to tell "no data" from "zero focus".
pub fn aggregate_hourly(samples: &[FocusSample], offset: &FixedOffset) -> HourlyStats {
    let mut totals = [(0i64, 0usize); 24];

    for sample in samples {
        let hour = local_hour(sample.timestamp, offset) as usize;
        totals[hour].0 += i64::from(sample.status);
        totals[hour].1 += 1;
    }

    let mut buckets = [HourBucket::default(); 24];
    for (bucket, (sum, count)) in buckets.iter_mut().zip(totals) {
        *bucket = HourBucket {
            average_score: if count == 0 {
                0.0
            } else {
                sum as f64 / count as f64
            },
            sample_count: count,
        };
    }

    HourlyStats { buckets }
}

/// Chart-ready track: `"00".."23"` labels with rounded hourly averages.
pub fn focus_track(stats: &HourlyStats) -> FocusTrack {
    let labels = (0..24).map(|hour| format!("{hour:02}")).collect();
    let scores = stats
        .buckets
        .iter()
        .map(|bucket| round_half_up(bucket.average_score))
        .collect();

    FocusTrack { labels, scores }
}

pub fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}
