//! Single-flight run lock
//!
//! One row in `sync_lock` marks an active run against this store. The row is
//! claimed with a single conditional upsert, so two runs racing for it cannot
//! both succeed. A row older than the stale threshold belongs to a run that
//! died without releasing it and may be taken over.

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use sake_common::time::parse_rfc3339;
use sake_common::{Error, Result};
use sqlx::{Row, SqliteConnection};

/// Name of the lock guarding catalog synchronization
pub const SYNC_LOCK_NAME: &str = "catalog_sync";

/// Outcome of a lock attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LockAttempt {
    Acquired,
    /// A stale lock from another holder was replaced
    TookOver {
        previous_holder: String,
        since: DateTime<Utc>,
    },
    /// Another holder owns a fresh lock
    Held {
        holder: String,
        since: DateTime<Utc>,
    },
}

// Fixed-width format so timestamps compare correctly as text
fn lock_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

async fn current_holder(conn: &mut SqliteConnection) -> Result<Option<(String, DateTime<Utc>)>> {
    let row = sqlx::query("SELECT holder, acquired_at FROM sync_lock WHERE lock_name = ?")
        .bind(SYNC_LOCK_NAME)
        .fetch_optional(&mut *conn)
        .await?;

    match row {
        Some(row) => {
            let holder: String = row.get("holder");
            let acquired_at: String = row.get("acquired_at");
            Ok(Some((holder, parse_rfc3339(&acquired_at)?)))
        }
        None => Ok(None),
    }
}

/// Try to claim the sync lock for `holder`
pub async fn try_acquire(
    conn: &mut SqliteConnection,
    holder: &str,
    now: DateTime<Utc>,
    stale_after: Duration,
) -> Result<LockAttempt> {
    let stale_cutoff = now.checked_sub_signed(stale_after).ok_or_else(|| {
        Error::Config(format!("Lock stale age out of range: {}", stale_after))
    })?;
    let stale_cutoff = lock_timestamp(stale_cutoff);
    let previous = current_holder(conn).await?;

    let result = sqlx::query(
        r#"
        INSERT INTO sync_lock (lock_name, holder, acquired_at)
        VALUES (?, ?, ?)
        ON CONFLICT(lock_name) DO UPDATE SET
            holder = excluded.holder,
            acquired_at = excluded.acquired_at
        WHERE sync_lock.acquired_at < ?
        "#,
    )
    .bind(SYNC_LOCK_NAME)
    .bind(holder)
    .bind(lock_timestamp(now))
    .bind(&stale_cutoff)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 1 {
        return Ok(match previous {
            Some((previous_holder, since)) => LockAttempt::TookOver {
                previous_holder,
                since,
            },
            None => LockAttempt::Acquired,
        });
    }

    // Re-read: the row may have changed hands since the first read
    match current_holder(conn).await? {
        Some((holder, since)) => Ok(LockAttempt::Held { holder, since }),
        None => Ok(LockAttempt::Held {
            holder: "unknown".to_string(),
            since: now,
        }),
    }
}

/// Release the lock if `holder` still owns it
///
/// Returns `false` when the lock was already gone or taken over.
pub async fn release(conn: &mut SqliteConnection, holder: &str) -> Result<bool> {
    let result = sqlx::query("DELETE FROM sync_lock WHERE lock_name = ? AND holder = ?")
        .bind(SYNC_LOCK_NAME)
        .bind(holder)
        .execute(&mut *conn)
        .await?;

    Ok(result.rows_affected() == 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sake_common::db::init_memory_database;

    #[tokio::test]
    async fn test_second_holder_is_refused_until_release() {
        let pool = init_memory_database().await.unwrap();
        let mut conn = pool.acquire().await.unwrap();
        let now = Utc::now();
        let stale = Duration::hours(1);

        assert_eq!(
            try_acquire(&mut conn, "run-a", now, stale).await.unwrap(),
            LockAttempt::Acquired
        );

        match try_acquire(&mut conn, "run-b", now, stale).await.unwrap() {
            LockAttempt::Held { holder, .. } => assert_eq!(holder, "run-a"),
            other => panic!("expected Held, got {:?}", other),
        }

        // Only the owner can release
        assert!(!release(&mut conn, "run-b").await.unwrap());
        assert!(release(&mut conn, "run-a").await.unwrap());

        assert_eq!(
            try_acquire(&mut conn, "run-b", now, stale).await.unwrap(),
            LockAttempt::Acquired
        );
    }

    #[tokio::test]
    async fn test_out_of_range_stale_age_is_config_error() {
        let pool = init_memory_database().await.unwrap();
        let mut conn = pool.acquire().await.unwrap();

        let result = try_acquire(&mut conn, "run-a", Utc::now(), Duration::MAX).await;
        assert!(matches!(result, Err(Error::Config(_))));

        // Nothing claimed
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sync_lock")
            .fetch_one(&mut *conn)
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_stale_lock_is_taken_over() {
        let pool = init_memory_database().await.unwrap();
        let mut conn = pool.acquire().await.unwrap();
        let stale = Duration::minutes(30);
        let long_ago = Utc::now() - Duration::hours(2);

        try_acquire(&mut conn, "crashed-run", long_ago, stale)
            .await
            .unwrap();

        match try_acquire(&mut conn, "new-run", Utc::now(), stale).await.unwrap() {
            LockAttempt::TookOver { previous_holder, .. } => {
                assert_eq!(previous_holder, "crashed-run")
            }
            other => panic!("expected TookOver, got {:?}", other),
        }
    }
}
