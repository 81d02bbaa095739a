use crate::api::SaveResponse;
use crate::config::Config;
use crate::error::StoreError;
use crate::model::*;
use anyhow::Result;
use chrono::{SecondsFormat, Utc};
use libsql::{Builder, Connection, Database as LibsqlDatabase};
use std::path::{Path, PathBuf};
use std::time::Duration;

const SYSTEM_MIGRATIONS: &[(&str, &str)] =
    &[("system/000_migrations_table.sql", include_str!("migrations/system/000_migrations_table.sql"))];

const MIGRATIONS: &[(&str, &str)] = &[("001_schema.sql", include_str!("migrations/001_schema.sql"))];

/// How long a connection waits on a write lock held by the other transport.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Bookmark store backed by a single local database file.
///
/// Holds no open connection: every operation connects, does its work and
/// drops the connection, so the HTTP endpoint and the native host can share
/// one file from separate processes.
pub struct Database {
    db: LibsqlDatabase,
    path: PathBuf,
}

impl Database {
    pub async fn new(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let db = Builder::new_local(path).build().await?;
        Ok(Database {
            db,
            path: path.to_path_buf(),
        })
    }

    pub async fn from_config(cfg: &Config) -> Result<Self> {
        Self::new(&cfg.database_path()).await
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn connect(&self) -> Result<Connection, libsql::Error> {
        let conn = self.db.connect()?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute("PRAGMA foreign_keys = ON", ()).await?;
        Ok(conn)
    }

    async fn is_migration_applied(conn: &Connection, name: &str) -> Result<bool> {
        let query = "SELECT 1 FROM _migrations WHERE name = ?";
        let mut rows = conn.query(query, libsql::params![name]).await?;
        Ok(rows.next().await?.is_some())
    }

    async fn record_migration(conn: &Connection, name: &str) -> Result<()> {
        // OR IGNORE: the other transport may have recorded it first.
        let query = r#"
            INSERT OR IGNORE INTO _migrations (name, applied_at)
            VALUES (?, strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
        "#;
        conn.execute(query, libsql::params![name]).await?;
        Ok(())
    }

    async fn run_migration(conn: &Connection, name: &str, sql: &str) -> Result<()> {
        if Self::is_migration_applied(conn, name).await? {
            tracing::debug!("migration {} already applied, skipping", name);
            return Ok(());
        }

        tracing::info!("applying migration: {}", name);
        conn.execute_batch(sql)
            .await
            .map_err(|e| anyhow::anyhow!("failed to execute migration {name}: {e}"))?;

        Self::record_migration(conn, name).await?;
        Ok(())
    }

    /// Creates the bookmark tables if they are absent. Safe to call on every start.
    pub async fn ensure_schema(&self) -> Result<()> {
        let conn = self.connect().await?;
        conn.query("SELECT 1", ()).await?;

        for (filename, sql) in SYSTEM_MIGRATIONS {
            conn.execute_batch(sql)
                .await
                .map_err(|e| anyhow::anyhow!("failed to execute migration {filename}: {e}"))?;
        }

        for (filename, sql) in MIGRATIONS {
            Self::run_migration(&conn, filename, sql).await?;
        }

        tracing::info!(path = %self.path.display(), "database initialized");
        Ok(())
    }

    /// Validates and stores a bookmark with its tags as one unit.
    ///
    /// Never fails outright: validation and storage errors come back as a
    /// `success: false` response carrying the error text.
    pub async fn insert_bookmark(&self, payload: BookmarkPayload) -> SaveResponse {
        match self.create_bookmark(payload).await {
            Ok((bookmark_id, title)) => {
                tracing::info!(bookmark_id, "saved bookmark: {}", title);
                SaveResponse::saved(bookmark_id)
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to save bookmark");
                SaveResponse::failed(e.to_string())
            }
        }
    }

    async fn create_bookmark(&self, payload: BookmarkPayload) -> Result<(i64, String), StoreError> {
        let bookmark = payload.validate()?;
        let conn = self.connect().await?;

        conn.execute("BEGIN IMMEDIATE", ()).await?;

        let result = Self::create_bookmark_internal(&conn, &bookmark).await;

        match result {
            Ok(bookmark_id) => {
                if let Err(e) = conn.execute("COMMIT", ()).await {
                    let _ = conn.execute("ROLLBACK", ()).await;
                    return Err(e.into());
                }
                Ok((bookmark_id, bookmark.title))
            }
            Err(e) => {
                let _ = conn.execute("ROLLBACK", ()).await;
                Err(e)
            }
        }
    }

    async fn create_bookmark_internal(conn: &Connection, bookmark: &NewBookmark) -> Result<i64, StoreError> {
        let now = now_timestamp();
        let created_at = bookmark.created_at.as_deref().unwrap_or(&now);

        let insert_bookmark = r#"
            INSERT INTO bookmarks (url, title, notes, code_snippet, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING id
        "#;

        let bookmark_id: i64 = {
            let mut rows = conn
                .query(
                    insert_bookmark,
                    libsql::params![
                        bookmark.url.as_str(),
                        bookmark.title.as_str(),
                        bookmark.notes.as_str(),
                        bookmark.code_snippet.as_str(),
                        created_at,
                        now.as_str()
                    ],
                )
                .await?;

            match rows.next().await? {
                Some(row) => row.get(0)?,
                None => return Err(StoreError::BookmarkNotCreated),
            }
        };

        for tag_name in &bookmark.tags {
            let tag_id = Self::get_or_create_tag(conn, tag_name).await?;
            let link_query = "INSERT OR IGNORE INTO bookmark_tags (bookmark_id, tag_id) VALUES (?, ?)";
            conn.execute(link_query, libsql::params![bookmark_id, tag_id]).await?;
        }

        Ok(bookmark_id)
    }

    async fn get_or_create_tag(conn: &Connection, name: &str) -> Result<i64, StoreError> {
        let insert_query = "INSERT OR IGNORE INTO tags (name) VALUES (?)";
        conn.execute(insert_query, libsql::params![name]).await?;

        let select_query = "SELECT id FROM tags WHERE name = ? LIMIT 1";
        let mut rows = conn.query(select_query, libsql::params![name]).await?;

        if let Some(row) = rows.next().await? {
            Ok(row.get(0)?)
        } else {
            Err(StoreError::TagNotResolved(name.to_string()))
        }
    }

    pub async fn get_bookmark(&self, bookmark_id: i64) -> Result<Option<Bookmark>> {
        let conn = self.connect().await?;

        let query = r#"
            SELECT id, url, title, notes, code_snippet, created_at, updated_at
            FROM bookmarks WHERE id = ?
        "#;
        let mut rows = conn.query(query, libsql::params![bookmark_id]).await?;

        let Some(row) = rows.next().await? else {
            return Ok(None);
        };

        let mut bookmark = Bookmark {
            id: row.get(0)?,
            url: row.get(1)?,
            title: row.get(2)?,
            notes: row.get::<Option<String>>(3)?.unwrap_or_default(),
            code_snippet: row.get::<Option<String>>(4)?.unwrap_or_default(),
            created_at: row.get(5)?,
            updated_at: row.get(6)?,
            tags: vec![],
        };
        drop(rows);

        let tags_query = r#"
            SELECT tags.name
            FROM bookmark_tags
            JOIN tags ON tags.id = bookmark_tags.tag_id
            WHERE bookmark_tags.bookmark_id = ?
            ORDER BY bookmark_tags.rowid
        "#;
        let mut rows = conn.query(tags_query, libsql::params![bookmark_id]).await?;
        while let Some(row) = rows.next().await? {
            bookmark.tags.push(row.get(0)?);
        }

        Ok(Some(bookmark))
    }
}
