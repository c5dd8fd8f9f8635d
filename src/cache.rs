//! Read-through result cache keyed by user.
//!
//! Entries live in Postgres so repeated CLI runs share them. Freshness is a
//! pure function of the stored timestamp; eviction happens on writes.

use std::future::Future;

use chrono::{DateTime, Duration, FixedOffset, Utc};
use serde::{de::DeserializeOwned, Serialize};
use sqlx::PgPool;

use crate::db;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheKind {
    Focus,
    Study,
}

impl CacheKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheKind::Focus => "focus",
            CacheKind::Study => "study",
        }
    }

    /// Results depend on the offset they were computed for, so it is part of
    /// the key alongside the user id.
    pub fn key(&self, offset: &FixedOffset) -> String {
        format!("{}:{}", self.as_str(), offset)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CachePolicy {
    pub ttl: Duration,
    /// Skip lookups but still store the fresh result
    pub bypass: bool,
}

pub fn is_fresh(computed_at: DateTime<Utc>, now: DateTime<Utc>, ttl: Duration) -> bool {
    computed_at <= now && now - computed_at < ttl
}

pub async fn read_through<T, F, Fut>(
    pool: &PgPool,
    user_id: i64,
    key: &str,
    policy: CachePolicy,
    compute: F,
) -> anyhow::Result<T>
where
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> Fut,
    Fut: Future<Output = anyhow::Result<T>>,
{
    if !policy.bypass {
        if let Some((payload, computed_at)) = db::load_cached(pool, user_id, key).await? {
            if is_fresh(computed_at, Utc::now(), policy.ttl) {
                match serde_json::from_value(payload) {
                    Ok(value) => {
                        tracing::debug!(user_id, key, "Cache hit");
                        return Ok(value);
                    }
                    Err(err) => {
                        tracing::warn!(
                            user_id,
                            key,
                            error = %err,
                            "Discarding unreadable cache entry"
                        );
                    }
                }
            }
        }
    }

    let value = compute().await?;
    db::store_cached(pool, user_id, key, serde_json::to_value(&value)?).await?;
    tracing::debug!(user_id, key, "Cache refreshed");
    Ok(value)
}

pub async fn evict(pool: &PgPool, user_id: i64, kind: CacheKind) -> anyhow::Result<()> {
    let removed = db::delete_cached(pool, user_id, kind.as_str()).await?;
    tracing::debug!(user_id, kind = kind.as_str(), removed, "Cache evicted");
    Ok(())
}
