use std::collections::BTreeSet;

use anyhow::Context;
use chrono::{DateTime, Duration, NaiveTime, Utc};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::error::Error;
use crate::models::{FocusSample, StudySession};

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Insert two weeks of demo history for `user_id`.
pub async fn seed(pool: &PgPool, user_id: i64) -> anyhow::Result<()> {
    let today = Utc::now().date_naive();
    let morning = [92, 88, 85, 90, 81, 95, 70, 84, 86, 91, 60, 88];
    let afternoon = [55, 40, 82, 35, 20, 48, 30, 65, 25, 50, 45, 38];

    for days_ago in 1..=14i64 {
        let day = today - Duration::days(days_ago);

        for (slot, (high, low)) in morning.iter().zip(afternoon.iter()).enumerate() {
            let offset = Duration::minutes(10 * slot as i64);
            let am = day
                .and_time(NaiveTime::from_hms_opt(0, 0, 0).context("invalid time")?)
                .and_utc()
                + offset;
            let pm = day
                .and_time(NaiveTime::from_hms_opt(6, 0, 0).context("invalid time")?)
                .and_utc()
                + offset;

            let am_key = format!("seed-focus-{days_ago}-am-{slot}");
            let pm_key = format!("seed-focus-{days_ago}-pm-{slot}");
            insert_focus(pool, user_id, *high, am, &am_key).await?;
            insert_focus(pool, user_id, *low, pm, &pm_key).await?;
        }

        // a missed day breaks the attendance streak
        if days_ago == 9 {
            continue;
        }

        let started_at = day
            .and_time(NaiveTime::from_hms_opt(23, 20, 0).context("invalid time")?)
            .and_utc()
            - Duration::days(1);
        let ended_at = started_at + Duration::minutes(70 + 5 * days_ago);
        insert_session(
            pool,
            user_id,
            started_at,
            Some(ended_at),
            &format!("seed-session-{days_ago}"),
        )
        .await?;
    }

    Ok(())
}

async fn insert_focus(
    pool: &PgPool,
    user_id: i64,
    status: i32,
    recorded_at: DateTime<Utc>,
    source_key: &str,
) -> anyhow::Result<bool> {
    let result = sqlx::query(
        r#"
        INSERT INTO focus_insights.focus_records (id, user_id, status, recorded_at, source_key)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (source_key) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(status)
    .bind(recorded_at)
    .bind(source_key)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

async fn insert_session(
    pool: &PgPool,
    user_id: i64,
    started_at: DateTime<Utc>,
    ended_at: Option<DateTime<Utc>>,
    source_key: &str,
) -> anyhow::Result<bool> {
    let result = sqlx::query(
        r#"
        INSERT INTO focus_insights.study_sessions (id, user_id, started_at, ended_at, source_key)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (source_key) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(started_at)
    .bind(ended_at)
    .bind(source_key)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn record_focus(pool: &PgPool, user_id: i64, status: i32) -> anyhow::Result<()> {
    insert_focus(
        pool,
        user_id,
        status,
        Utc::now(),
        &format!("live-{}", Uuid::new_v4()),
    )
    .await?;
    Ok(())
}

pub async fn start_session(pool: &PgPool, user_id: i64) -> anyhow::Result<DateTime<Utc>> {
    let started_at = Utc::now();
    insert_session(
        pool,
        user_id,
        started_at,
        None,
        &format!("live-{}", Uuid::new_v4()),
    )
    .await?;
    Ok(started_at)
}

/// Close the user's most recent session at the current time.
pub async fn stop_session(pool: &PgPool, user_id: i64) -> anyhow::Result<DateTime<Utc>> {
    let ended_at = Utc::now();
    let updated = sqlx::query(
        r#"
        UPDATE focus_insights.study_sessions
        SET ended_at = $2
        WHERE id = (
            SELECT id FROM focus_insights.study_sessions
            WHERE user_id = $1
            ORDER BY started_at DESC
            LIMIT 1
        )
        RETURNING id
        "#,
    )
    .bind(user_id)
    .bind(ended_at)
    .fetch_optional(pool)
    .await?;

    match updated {
        Some(_) => Ok(ended_at),
        None => Err(Error::NoSession(user_id).into()),
    }
}

pub async fn fetch_focus_samples(
    pool: &PgPool,
    user_id: i64,
    since: DateTime<Utc>,
) -> anyhow::Result<Vec<FocusSample>> {
    let rows = sqlx::query(
        "SELECT user_id, status, recorded_at \
         FROM focus_insights.focus_records \
         WHERE user_id = $1 AND recorded_at > $2",
    )
    .bind(user_id)
    .bind(since)
    .fetch_all(pool)
    .await?;

    let samples = rows
        .into_iter()
        .map(|row| FocusSample {
            user_id: row.get("user_id"),
            timestamp: row.get("recorded_at"),
            status: row.get("status"),
        })
        .collect();

    Ok(samples)
}

pub async fn fetch_study_sessions(
    pool: &PgPool,
    user_id: i64,
) -> anyhow::Result<Vec<StudySession>> {
    let rows = sqlx::query(
        "SELECT user_id, started_at, ended_at \
         FROM focus_insights.study_sessions \
         WHERE user_id = $1",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    let sessions = rows
        .into_iter()
        .map(|row| StudySession {
            user_id: row.get("user_id"),
            started_at: row.get("started_at"),
            ended_at: row.get("ended_at"),
        })
        .collect();

    Ok(sessions)
}

#[derive(Debug, serde::Deserialize)]
pub struct FocusCsvRow {
    pub user_id: i64,
    pub status: i32,
    pub recorded_at: DateTime<Utc>,
    pub source_key: Option<String>,
}

#[derive(Debug, serde::Deserialize)]
pub struct SessionCsvRow {
    pub user_id: i64,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub source_key: Option<String>,
}

/// Rows written by an import and the users they belong to, so cached results
/// for those users can be dropped afterwards.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub inserted: usize,
    pub users: BTreeSet<i64>,
}

impl ImportSummary {
    pub fn record(&mut self, user_id: i64, inserted: bool) {
        if inserted {
            self.inserted += 1;
            self.users.insert(user_id);
        }
    }
}

pub fn read_csv_rows<R, T>(reader: R) -> anyhow::Result<Vec<T>>
where
    R: std::io::Read,
    T: serde::de::DeserializeOwned,
{
    let mut reader = csv::Reader::from_reader(reader);
    let mut rows = Vec::new();
    for result in reader.deserialize::<T>() {
        rows.push(result?);
    }
    Ok(rows)
}

fn open_csv(csv_path: &std::path::Path) -> anyhow::Result<std::fs::File> {
    std::fs::File::open(csv_path).with_context(|| format!("failed to open {}", csv_path.display()))
}

pub async fn import_focus_csv(
    pool: &PgPool,
    csv_path: &std::path::Path,
) -> anyhow::Result<ImportSummary> {
    let rows: Vec<FocusCsvRow> = read_csv_rows(open_csv(csv_path)?)?;
    let mut summary = ImportSummary::default();

    for (line, row) in rows.into_iter().enumerate() {
        if !(0..=100).contains(&row.status) {
            tracing::warn!(
                line = line + 2,
                status = row.status,
                "Skipping focus row with out-of-range status"
            );
            continue;
        }

        let source_key = row
            .source_key
            .unwrap_or_else(|| format!("import-{}", Uuid::new_v4()));

        let inserted =
            insert_focus(pool, row.user_id, row.status, row.recorded_at, &source_key).await?;
        summary.record(row.user_id, inserted);
    }

    Ok(summary)
}

pub async fn import_sessions_csv(
    pool: &PgPool,
    csv_path: &std::path::Path,
) -> anyhow::Result<ImportSummary> {
    let rows: Vec<SessionCsvRow> = read_csv_rows(open_csv(csv_path)?)?;
    let mut summary = ImportSummary::default();

    for row in rows {
        let source_key = row
            .source_key
            .unwrap_or_else(|| format!("import-{}", Uuid::new_v4()));

        let inserted =
            insert_session(pool, row.user_id, row.started_at, row.ended_at, &source_key).await?;
        summary.record(row.user_id, inserted);
    }

    Ok(summary)
}

pub async fn load_cached(
    pool: &PgPool,
    user_id: i64,
    cache_key: &str,
) -> anyhow::Result<Option<(serde_json::Value, DateTime<Utc>)>> {
    let row = sqlx::query(
        "SELECT payload, computed_at FROM focus_insights.insight_cache \
         WHERE user_id = $1 AND cache_key = $2",
    )
    .bind(user_id)
    .bind(cache_key)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|row| (row.get("payload"), row.get("computed_at"))))
}

pub async fn store_cached(
    pool: &PgPool,
    user_id: i64,
    cache_key: &str,
    payload: serde_json::Value,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO focus_insights.insight_cache (user_id, cache_key, payload, computed_at)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (user_id, cache_key) DO UPDATE
        SET payload = EXCLUDED.payload, computed_at = EXCLUDED.computed_at
        "#,
    )
    .bind(user_id)
    .bind(cache_key)
    .bind(payload)
    .bind(Utc::now())
    .execute(pool)
    .await?;

    Ok(())
}

/// Drop every cached entry of one kind for a user, whatever offset it was
/// computed for.
pub async fn delete_cached(pool: &PgPool, user_id: i64, kind: &str) -> anyhow::Result<u64> {
    let result = sqlx::query(
        "DELETE FROM focus_insights.insight_cache WHERE user_id = $1 AND cache_key LIKE $2",
    )
    .bind(user_id)
    .bind(format!("{kind}:%"))
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}
