use anyhow::{Context, Result};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Pool, QueryBuilder, Row, Sqlite,
};
use std::borrow::Cow;
use std::str::FromStr;

use crate::model::RepoEntry;

use super::SCHEMA_VERSION;

/// An object row staged for the index (zero-copy friendly)
#[derive(Debug, Clone)]
pub struct ObjectRecord<'a> {
    pub oid: [u8; 20],
    pub path: Cow<'a, str>,
    pub mode: i64,
}

impl<'a> ObjectRecord<'a> {
    pub fn new(oid: [u8; 20], path: impl Into<Cow<'a, str>>, mode: i64) -> Self {
        Self { oid, path: path.into(), mode }
    }
}

/// Database abstraction for SQLite operations
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    /// Create a new database connection
    pub async fn new(db_path: &str) -> Result<Self> {
        // Configure connection options with PRAGMAs applied to every connection
        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}?mode=rwc", db_path))?
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
            .pragma("temp_store", "MEMORY")
            .pragma("cache_size", "-64000"); // 64MB cache

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .context("Failed to connect to database")?;

        Ok(Self { pool })
    }

    /// Initialize database schema, returns true if schema was rebuilt
    pub async fn init_schema(&self) -> Result<bool> {
        // Create metadata table first (needed to check version)
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS metadata (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        // Check schema version
        let stored_version: Option<String> =
            sqlx::query("SELECT value FROM metadata WHERE key = 'schema_version'")
                .fetch_optional(&self.pool)
                .await?
                .map(|row| row.get("value"));

        let needs_rebuild = stored_version.as_deref() != Some(SCHEMA_VERSION);

        if needs_rebuild {
            if stored_version.is_some() {
                eprintln!(
                    "Schema version changed ({} -> {}), rebuilding index...",
                    stored_version.unwrap_or_default(),
                    SCHEMA_VERSION
                );
            }
            // Drop and recreate the index tables. The registry survives a
            // rebuild; clearing the frontier forces a full re-sync.
            sqlx::query("DROP TABLE IF EXISTS objects").execute(&self.pool).await?;
            sqlx::query("DROP TABLE IF EXISTS object_parents").execute(&self.pool).await?;
            sqlx::query("DROP TABLE IF EXISTS heads").execute(&self.pool).await?;
            sqlx::query("DELETE FROM metadata").execute(&self.pool).await?;
        }

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS repositories (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE,
                path TEXT NOT NULL,
                last_sync_at INTEGER
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS objects (
                repos INTEGER NOT NULL,
                oid BLOB NOT NULL,
                path TEXT NOT NULL,
                mode INTEGER NOT NULL,
                commit_oid BLOB NOT NULL,
                PRIMARY KEY (repos, oid, path)
            )",
        )
        .execute(&self.pool)
        .await?;

        // The upsert and lookup key is (repos, oid) regardless of path
        sqlx::query("CREATE INDEX IF NOT EXISTS objects_by_oid ON objects (repos, oid)")
            .execute(&self.pool)
            .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS object_parents (
                repos INTEGER NOT NULL,
                oid BLOB NOT NULL,
                parent_oid BLOB NOT NULL,
                PRIMARY KEY (repos, oid, parent_oid)
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS heads (
                repos INTEGER NOT NULL,
                head BLOB NOT NULL,
                PRIMARY KEY (repos, head)
            )",
        )
        .execute(&self.pool)
        .await?;

        if needs_rebuild {
            sqlx::query("UPDATE repositories SET last_sync_at = NULL")
                .execute(&self.pool)
                .await?;
            sqlx::query("INSERT OR REPLACE INTO metadata (key, value) VALUES ('schema_version', ?)")
                .bind(SCHEMA_VERSION)
                .execute(&self.pool)
                .await?;
        }

        Ok(needs_rebuild)
    }

    /// Get metadata value by key
    pub async fn get_metadata(&self, key: &str) -> Option<String> {
        sqlx::query("SELECT value FROM metadata WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .ok()
            .flatten()
            .map(|row| row.get("value"))
    }

    /// Set metadata value
    pub async fn set_metadata(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query("INSERT OR REPLACE INTO metadata (key, value) VALUES (?, ?)")
            .bind(key)
            .bind(value)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Add a repository to the registry
    pub async fn register_repository(&self, name: &str, path: &str) -> Result<RepoEntry> {
        let result = sqlx::query("INSERT INTO repositories (name, path) VALUES (?, ?)")
            .bind(name)
            .bind(path)
            .execute(&self.pool)
            .await
            .with_context(|| format!("Failed to register repository '{}'", name))?;

        Ok(RepoEntry {
            id: result.last_insert_rowid(),
            name: name.to_string(),
            path: path.to_string(),
            last_sync_at: None,
        })
    }

    /// Look up a repository by its registered name
    pub async fn find_repository(&self, name: &str) -> Result<Option<RepoEntry>, sqlx::Error> {
        let row = sqlx::query("SELECT id, name, path, last_sync_at FROM repositories WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|row| RepoEntry {
            id: row.get("id"),
            name: row.get("name"),
            path: row.get("path"),
            last_sync_at: row.get("last_sync_at"),
        }))
    }

    /// All registered repositories, by name
    pub async fn list_repositories(&self) -> Result<Vec<RepoEntry>, sqlx::Error> {
        let rows = sqlx::query("SELECT id, name, path, last_sync_at FROM repositories ORDER BY name")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| RepoEntry {
                id: row.get("id"),
                name: row.get("name"),
                path: row.get("path"),
                last_sync_at: row.get("last_sync_at"),
            })
            .collect())
    }

    /// Load the stored head frontier for a repository
    /// Returns raw 20-byte SHA-1 hashes
    pub async fn load_frontier(&self, repos: i64) -> Result<Vec<[u8; 20]>, sqlx::Error> {
        let rows: Vec<Vec<u8>> = sqlx::query_scalar("SELECT head FROM heads WHERE repos = ?")
            .bind(repos)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().filter_map(|v| v.try_into().ok()).collect())
    }

    /// Replace the stored frontier wholesale and stamp the sync time
    pub async fn replace_frontier(&self, repos: i64, heads: &[[u8; 20]]) -> Result<(), sqlx::Error> {
        let now = time::OffsetDateTime::now_utc().unix_timestamp();
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM heads WHERE repos = ?")
            .bind(repos)
            .execute(&mut *tx)
            .await?;

        if !heads.is_empty() {
            let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("INSERT INTO heads (repos, head) ");
            qb.push_values(heads, |mut row, head| {
                row.push_bind(repos).push_bind(head.as_slice());
            });
            qb.build().execute(&mut *tx).await?;
        }

        sqlx::query("UPDATE repositories SET last_sync_at = ? WHERE id = ?")
            .bind(now)
            .bind(repos)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Apply one commit's object registrations in ONE transaction.
    ///
    /// Upserts rewrite `commit_oid` for every row of an already-known object
    /// and insert the full row otherwise; best-effort inserts are ignored on
    /// the (repos, oid, path) key. Returns the number of rows actually
    /// inserted.
    pub async fn apply_commit(
        &self,
        repos: i64,
        commit: &[u8; 20],
        upserts: &[ObjectRecord<'_>],
        inserts: &[ObjectRecord<'_>],
        parent_links: &[([u8; 20], [u8; 20])],
    ) -> Result<u64, sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        let mut inserted = 0u64;

        for record in upserts {
            let known = sqlx::query("SELECT 1 FROM objects WHERE repos = ? AND oid = ? LIMIT 1")
                .bind(repos)
                .bind(record.oid.as_slice())
                .fetch_optional(&mut *tx)
                .await?;

            if known.is_some() {
                sqlx::query("UPDATE objects SET commit_oid = ? WHERE repos = ? AND oid = ?")
                    .bind(commit.as_slice())
                    .bind(repos)
                    .bind(record.oid.as_slice())
                    .execute(&mut *tx)
                    .await?;
            } else {
                sqlx::query(
                    "INSERT INTO objects (repos, oid, path, mode, commit_oid) VALUES (?, ?, ?, ?, ?)",
                )
                .bind(repos)
                .bind(record.oid.as_slice())
                .bind(record.path.as_ref())
                .bind(record.mode)
                .bind(commit.as_slice())
                .execute(&mut *tx)
                .await?;
                inserted += 1;
            }
        }

        for record in inserts {
            let result = sqlx::query(
                "INSERT OR IGNORE INTO objects (repos, oid, path, mode, commit_oid) VALUES (?, ?, ?, ?, ?)",
            )
            .bind(repos)
            .bind(record.oid.as_slice())
            .bind(record.path.as_ref())
            .bind(record.mode)
            .bind(commit.as_slice())
            .execute(&mut *tx)
            .await?;
            inserted += result.rows_affected();
        }

        for (oid, parent_oid) in parent_links {
            sqlx::query(
                "INSERT OR IGNORE INTO object_parents (repos, oid, parent_oid) VALUES (?, ?, ?)",
            )
            .bind(repos)
            .bind(oid.as_slice())
            .bind(parent_oid.as_slice())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(inserted)
    }

    /// The commit most recently recorded for an object hash
    pub async fn latest_commit_for(
        &self,
        repos: i64,
        oid: &[u8],
    ) -> Result<Option<[u8; 20]>, sqlx::Error> {
        let row: Option<Vec<u8>> =
            sqlx::query_scalar("SELECT commit_oid FROM objects WHERE repos = ? AND oid = ? LIMIT 1")
                .bind(repos)
                .bind(oid)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.and_then(|v| v.try_into().ok()))
    }

    /// Recorded predecessor (old-side) objects of an object hash
    pub async fn predecessors_of(
        &self,
        repos: i64,
        oid: &[u8],
    ) -> Result<Vec<[u8; 20]>, sqlx::Error> {
        let rows: Vec<Vec<u8>> =
            sqlx::query_scalar("SELECT parent_oid FROM object_parents WHERE repos = ? AND oid = ?")
                .bind(repos)
                .bind(oid)
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.into_iter().filter_map(|v| v.try_into().ok()).collect())
    }

    /// Every path an object hash is registered under
    pub async fn object_paths(&self, repos: i64, oid: &[u8]) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar("SELECT path FROM objects WHERE repos = ? AND oid = ? ORDER BY path")
            .bind(repos)
            .bind(oid)
            .fetch_all(&self.pool)
            .await
    }

    /// Number of object rows indexed for a repository
    pub async fn object_count(&self, repos: i64) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM objects WHERE repos = ?")
            .bind(repos)
            .fetch_one(&self.pool)
            .await
    }
}
