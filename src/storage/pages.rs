use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use sqlx::FromRow;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

use crate::error::StoreError;

/// Schema of the page table. The column affinity of CONTENT is left open so
/// databases created by older runs (CONTENT TEXT) keep working.
const SCHEMA_SQL: &str = "CREATE TABLE IF NOT EXISTS WEBSITE (
    URL     TEXT PRIMARY KEY NOT NULL,
    CONTENT BLOB
)";

const UPSERT_SQL: &str = "INSERT INTO WEBSITE (URL, CONTENT) VALUES (?1, ?2)
    ON CONFLICT(URL) DO UPDATE SET CONTENT = excluded.CONTENT";

/// Connections to an on-disk store. SQLite serializes writers anyway; the
/// busy timeout makes concurrent workers wait their turn instead of failing.
const MAX_CONNECTIONS: u32 = 4;
const BUSY_TIMEOUT: Duration = Duration::from_secs(30);

/// A stored page
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct PageRecord {
    pub url: String,
    pub content: Option<Vec<u8>>,
}

/// URL-keyed page store backed by a single SQLite file
#[derive(Debug, Clone)]
pub struct PageStore {
    pool: SqlitePool,
}

impl PageStore {
    /// Open (or create) the store at `path`. Existing rows are kept.
    pub async fn open(path: &Path) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(BUSY_TIMEOUT);

        let pool = SqlitePoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect_with(options)
            .await
            .map_err(|source| StoreError::Open {
                path: path.display().to_string(),
                source,
            })?;

        debug!("Opened page store: {}", path.display());
        Self::with_pool(pool).await
    }

    /// Ephemeral store. A single connection that is never recycled, since
    /// every SQLite memory connection is its own database.
    pub async fn in_memory() -> Result<Self, StoreError> {
        let open_err = |source| StoreError::Open {
            path: ":memory:".to_string(),
            source,
        };
        let options = SqliteConnectOptions::from_str("sqlite::memory:").map_err(open_err)?;

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(open_err)?;

        Self::with_pool(pool).await
    }

    async fn with_pool(pool: SqlitePool) -> Result<Self, StoreError> {
        sqlx::query(SCHEMA_SQL)
            .execute(&pool)
            .await
            .map_err(StoreError::Schema)?;

        Ok(Self { pool })
    }

    /// Insert the page, replacing the content of an existing row for `url`
    pub async fn upsert(&self, url: &str, content: &[u8]) -> Result<(), StoreError> {
        sqlx::query(UPSERT_SQL)
            .bind(url)
            .bind(content)
            .execute(&self.pool)
            .await
            .map_err(|source| StoreError::Write {
                url: url.to_string(),
                source,
            })?;

        debug!("Stored {} bytes for {}", content.len(), url);
        Ok(())
    }

    pub async fn get(&self, url: &str) -> Result<Option<PageRecord>, StoreError> {
        sqlx::query_as::<_, PageRecord>("SELECT URL AS url, CONTENT AS content FROM WEBSITE WHERE URL = ?1")
            .bind(url)
            .fetch_optional(&self.pool)
            .await
            .map_err(StoreError::Read)
    }

    pub async fn count(&self) -> Result<u64, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM WEBSITE")
            .fetch_one(&self.pool)
            .await
            .map_err(StoreError::Read)?;
        Ok(count.max(0) as u64)
    }

    /// All stored URLs, sorted
    pub async fn urls(&self) -> Result<Vec<String>, StoreError> {
        sqlx::query_scalar("SELECT URL FROM WEBSITE ORDER BY URL")
            .fetch_all(&self.pool)
            .await
            .map_err(StoreError::Read)
    }

    /// Close every pooled connection, flushing the WAL
    pub async fn close(&self) {
        self.pool.close().await;
    }
}
