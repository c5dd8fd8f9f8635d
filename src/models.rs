use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone)]
pub struct FocusSample {
    pub user_id: i64,
    pub timestamp: DateTime<Utc>,
    pub status: i32,
}

#[derive(Debug, Clone)]
pub struct StudySession {
    pub user_id: i64,
    pub started_at: DateTime<Utc>,
    /// `None` while the session is still running
    pub ended_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HourBucket {
    pub average_score: f64,
    pub sample_count: usize,
}

/// Per local hour-of-day focus aggregate, always 24 entries.
#[derive(Debug, Clone, PartialEq)]
pub struct HourlyStats {
    pub buckets: [HourBucket; 24],
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FocusWindow {
    pub start: String,
    pub end: String,
    pub avg_focus_score: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FocusTrack {
    pub labels: Vec<String>,
    pub scores: Vec<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FocusInsights {
    pub hourly_track: Vec<HourBucket>,
    pub focus_track: FocusTrack,
    pub best_window: FocusWindow,
    pub worst_window: FocusWindow,
    pub avg_focus_duration_minutes: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FocusResponse {
    pub user_id: i64,
    pub feedback: String,
    #[serde(flatten)]
    pub insights: FocusInsights,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackPoint {
    pub date: NaiveDate,
    pub minutes: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyStatistics {
    pub user_id: i64,
    pub attendance_streak: u32,
    pub weekday_graph: [i64; 7],
    pub weekly_graph: Vec<i64>,
    pub yearly_track: Vec<TrackPoint>,
}

/// Study minutes credited to each local calendar date.
pub type DailyMinutes = BTreeMap<NaiveDate, i64>;
