//! SQLite coordination client.
//!
//! A single-node durable backend. Create-if-absent is a single SQL
//! statement and compare-and-set runs under the database write lock, so
//! both hold across every process that opens the same database file.
//!
//! Features:
//! - WAL mode for concurrent readers
//! - Watch via in-memory channels (per-process)

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::coordination::{validate_key, CoordinationClient, KeyValue};
use crate::error::{Result, StateError};
use crate::watch::{WatchEvent, WatchSender, WatchStream};

/// SQLite implementation of [`CoordinationClient`].
///
/// Watch notifications are in-process only (not shared across processes).
pub struct SqliteClient {
    pool: SqlitePool,
    watcher: WatchSender,
}

impl SqliteClient {
    /// Open or create a SQLite database at the given path.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Opening SQLite coordination store at {:?}", path);

        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", path.display()))
            .map_err(|e| StateError::ConnectionError(e.to_string()))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(30));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(|e| StateError::ConnectionError(e.to_string()))?;

        Self::with_pool(pool).await
    }

    /// Create an in-memory SQLite database (for testing).
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| StateError::ConnectionError(e.to_string()))?;

        // One connection: every connection to :memory: is a separate database.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(|e| StateError::ConnectionError(e.to_string()))?;

        Self::with_pool(pool).await
    }

    async fn with_pool(pool: SqlitePool) -> Result<Self> {
        let client = Self {
            pool,
            watcher: WatchSender::new(1024),
        };
        client.init_schema().await?;
        Ok(client)
    }

    async fn init_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS coordination_kv (
                key TEXT PRIMARY KEY NOT NULL,
                value BLOB NOT NULL,
                version INTEGER NOT NULL DEFAULT 1
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        debug!("SQLite schema initialized");
        Ok(())
    }
}

#[async_trait]
impl CoordinationClient for SqliteClient {
    async fn get(&self, key: &str) -> Result<Option<KeyValue>> {
        validate_key(key)?;

        let row: Option<(String, Vec<u8>, i64)> =
            sqlx::query_as("SELECT key, value, version FROM coordination_kv WHERE key = ?")
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(|(key, value, version)| KeyValue {
            key,
            value,
            version: version as u64,
        }))
    }

    async fn get_all(&self, prefix: &str) -> Result<Vec<KeyValue>> {
        // substr rather than LIKE: keys may contain '_' and '%'.
        let rows: Vec<(String, Vec<u8>, i64)> = sqlx::query_as(
            "SELECT key, value, version FROM coordination_kv \
             WHERE substr(key, 1, length(?1)) = ?1 ORDER BY key",
        )
        .bind(prefix)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(key, value, version)| KeyValue {
                key,
                value,
                version: version as u64,
            })
            .collect())
    }

    async fn create_if_not_exists(&self, key: &str, value: Vec<u8>) -> Result<u64> {
        validate_key(key)?;

        let result = sqlx::query(
            "INSERT INTO coordination_kv (key, value, version) VALUES (?, ?, 1) \
             ON CONFLICT(key) DO NOTHING",
        )
        .bind(key)
        .bind(&value)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StateError::AlreadyExists(key.to_string()));
        }

        self.watcher.send(WatchEvent::created(key, value, 1));
        Ok(1)
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> Result<u64> {
        validate_key(key)?;

        let mut conn = self.pool.acquire().await?;
        sqlx::query("BEGIN IMMEDIATE").execute(&mut *conn).await?;
        let outcome = upsert(&mut *conn, key, &value).await;
        let (previous, version) = finish(&mut *conn, outcome).await?;

        let event = match previous {
            Some(prev) => WatchEvent::updated(key, prev, value, version),
            None => WatchEvent::created(key, value, version),
        };
        self.watcher.send(event);

        Ok(version)
    }

    async fn compare_and_set(
        &self,
        key: &str,
        expected_version: u64,
        value: Vec<u8>,
    ) -> Result<u64> {
        if expected_version == 0 {
            return match self.create_if_not_exists(key, value).await {
                Err(StateError::AlreadyExists(_)) => {
                    let found = self.get(key).await?.map(|kv| kv.version).unwrap_or(0);
                    Err(StateError::VersionConflict {
                        key: key.to_string(),
                        expected: 0,
                        found,
                    })
                }
                other => other,
            };
        }

        validate_key(key)?;

        let mut conn = self.pool.acquire().await?;
        sqlx::query("BEGIN IMMEDIATE").execute(&mut *conn).await?;
        let outcome = update_if_version(&mut *conn, key, expected_version, &value).await;
        let prev = finish(&mut *conn, outcome).await?;

        let new_version = expected_version + 1;
        self.watcher
            .send(WatchEvent::updated(key, prev, value, new_version));
        Ok(new_version)
    }

    async fn delete(&self, key: &str) -> Result<()> {
        validate_key(key)?;

        let removed: Option<(Vec<u8>,)> =
            sqlx::query_as("DELETE FROM coordination_kv WHERE key = ? RETURNING value")
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;

        if let Some((prev,)) = removed {
            self.watcher.send(WatchEvent::deleted(key, prev));
        }
        Ok(())
    }

    fn watch(&self, prefix: &str) -> Result<WatchStream> {
        Ok(self.watcher.subscribe(prefix))
    }
}

// Read-then-write sequences run under BEGIN IMMEDIATE so the write lock is
// taken up front. A deferred transaction would fail with SQLITE_BUSY on the
// read-to-write upgrade instead of waiting out the busy timeout.

async fn upsert(
    conn: &mut SqliteConnection,
    key: &str,
    value: &[u8],
) -> Result<(Option<Vec<u8>>, u64)> {
    let previous: Option<(Vec<u8>,)> =
        sqlx::query_as("SELECT value FROM coordination_kv WHERE key = ?")
            .bind(key)
            .fetch_optional(&mut *conn)
            .await?;

    let (version,): (i64,) = sqlx::query_as(
        r#"
        INSERT INTO coordination_kv (key, value, version)
        VALUES (?, ?, 1)
        ON CONFLICT(key) DO UPDATE SET
            value = excluded.value,
            version = version + 1
        RETURNING version
        "#,
    )
    .bind(key)
    .bind(value)
    .fetch_one(&mut *conn)
    .await?;

    Ok((previous.map(|(prev,)| prev), version as u64))
}

/// Returns the value that was replaced.
async fn update_if_version(
    conn: &mut SqliteConnection,
    key: &str,
    expected_version: u64,
    value: &[u8],
) -> Result<Vec<u8>> {
    let previous: Option<(Vec<u8>, i64)> =
        sqlx::query_as("SELECT value, version FROM coordination_kv WHERE key = ?")
            .bind(key)
            .fetch_optional(&mut *conn)
            .await?;

    let (prev, found) = match previous {
        Some((prev, version)) if version as u64 == expected_version => (prev, version as u64),
        other => {
            return Err(StateError::VersionConflict {
                key: key.to_string(),
                expected: expected_version,
                found: other.map(|(_, v)| v as u64).unwrap_or(0),
            })
        }
    };

    sqlx::query("UPDATE coordination_kv SET value = ?, version = ? WHERE key = ?")
        .bind(value)
        .bind((found + 1) as i64)
        .bind(key)
        .execute(&mut *conn)
        .await?;

    Ok(prev)
}

/// Commit on success, roll back otherwise. The connection never goes back
/// to the pool with a transaction open.
async fn finish<T>(conn: &mut SqliteConnection, outcome: Result<T>) -> Result<T> {
    match outcome {
        Ok(value) => match sqlx::query("COMMIT").execute(&mut *conn).await {
            Ok(_) => Ok(value),
            Err(e) => {
                if let Err(rollback) = sqlx::query("ROLLBACK").execute(&mut *conn).await {
                    warn!("rollback after failed commit: {}", rollback);
                }
                Err(e.into())
            }
        },
        Err(e) => {
            if let Err(rollback) = sqlx::query("ROLLBACK").execute(&mut *conn).await {
                warn!("rollback failed: {}", rollback);
            }
            Err(e)
        }
    }
}
