//! Database Connection Management and SQL Statements
//!
//! This module provides the core database connection and initialization
//! functionality using libsql, plus the SQL statements extracted from the
//! service layer.
//!
//! # Architecture
//!
//! - **Path-agnostic**: accepts any valid `PathBuf` and creates missing
//!   parent directories
//! - **WAL mode**: Write-Ahead Logging for better concurrency
//! - **Foreign keys**: enabled for referential integrity
//! - **Idempotent schema**: `CREATE TABLE IF NOT EXISTS` on every start
//!
//! # Connection patterns
//!
//! Use `connect_with_timeout()` in async contexts. The 5-second busy timeout
//! makes concurrent operations wait and retry instead of failing immediately
//! with `SQLITE_BUSY` when the Tokio runtime interleaves writers.
//!
//! # Transactions
//!
//! Structural category mutations span several statements that must commit or
//! roll back together. The caller holds one connection for the whole
//! sequence and brackets it with [`DatabaseService::begin_transaction`] /
//! [`DatabaseService::commit`] / [`DatabaseService::rollback`]; the
//! statement methods that participate take that connection explicitly.

use crate::db::error::DatabaseError;
use crate::models::{Article, ArticleFormat, ArticleStatus, ArticleSummary, Category};
use chrono::{DateTime, NaiveDateTime, Utc};
use libsql::{Builder, Connection, Database, Row};
use std::path::PathBuf;
use std::sync::Arc;

/// Database service for managing the libsql connection and schema
#[derive(Debug, Clone)]
pub struct DatabaseService {
    /// libsql database handle (wrapped in Arc for sharing)
    db: Arc<Database>,

    /// Path to the database file
    db_path: PathBuf,
}

/// Parameters for article insertion (avoids too-many-arguments lint)
pub struct DbCreateArticleParams<'a> {
    pub category_id: i64,
    pub title: &'a str,
    pub keyword: &'a str,
    pub content: &'a str,
    pub format: i64,
    pub status: i64,
}

impl DatabaseService {
    /// Create a new DatabaseService with the specified database path
    ///
    /// Ensures the parent directory exists, opens or creates the database
    /// file, and initializes the schema.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the parent directory cannot be created,
    /// the connection fails, or schema initialization fails.
    pub async fn new(db_path: PathBuf) -> Result<Self, DatabaseError> {
        if let Some(parent) = db_path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let db = Builder::new_local(&db_path)
            .build()
            .await
            .map_err(|e| DatabaseError::connection_failed(db_path.clone(), e))?;

        let service = Self {
            db: Arc::new(db),
            db_path,
        };

        service.initialize_schema().await?;

        Ok(service)
    }

    /// Path this service was opened with
    pub fn path(&self) -> &PathBuf {
        &self.db_path
    }

    /// Get a connection to the database
    ///
    /// Prefer `connect_with_timeout()` in async contexts; this variant skips
    /// the busy-timeout pragma.
    pub fn connect(&self) -> Result<Connection, DatabaseError> {
        self.db.connect().map_err(DatabaseError::LibsqlError)
    }

    /// Get a connection with the busy timeout configured
    ///
    /// The timeout makes concurrent writers wait up to 5 seconds instead of
    /// failing immediately when the database is locked.
    pub async fn connect_with_timeout(&self) -> Result<Connection, DatabaseError> {
        let conn = self.connect()?;
        self.execute_pragma(&conn, "PRAGMA busy_timeout = 5000")
            .await?;
        Ok(conn)
    }

    /// Execute a PRAGMA statement
    ///
    /// PRAGMA statements return rows, so query() must be used instead of
    /// execute().
    async fn execute_pragma(&self, conn: &Connection, pragma: &str) -> Result<(), DatabaseError> {
        let mut stmt = conn.prepare(pragma).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to execute '{}': {}", pragma, e))
        })?;
        let _ = stmt.query(()).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to execute '{}': {}", pragma, e))
        })?;
        Ok(())
    }

    /// Initialize database schema and configuration
    ///
    /// Safe to call multiple times; every statement is idempotent.
    ///
    /// # Schema
    ///
    /// - `categories`: the ordered forest, parent linkage in `pid`, sibling
    ///   order as a `next_id` linked list (0 = root group / tail sentinel)
    /// - `articles`: content rows referencing a category
    /// - `article_trash`: copies of deleted article rows
    async fn initialize_schema(&self) -> Result<(), DatabaseError> {
        let conn = self.connect_with_timeout().await?;

        self.execute_pragma(&conn, "PRAGMA journal_mode = WAL")
            .await?;
        self.execute_pragma(&conn, "PRAGMA foreign_keys = ON")
            .await?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS categories (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                pid INTEGER NOT NULL DEFAULT 0,
                next_id INTEGER NOT NULL DEFAULT 0,
                title TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                modified_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )",
            (),
        )
        .await
        .map_err(|e| {
            DatabaseError::initialization_failed(format!("Failed to create categories table: {}", e))
        })?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_categories_pid ON categories(pid)",
            (),
        )
        .await
        .map_err(|e| {
            DatabaseError::initialization_failed(format!("Failed to create pid index: {}", e))
        })?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS articles (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                category_id INTEGER NOT NULL,
                title TEXT NOT NULL,
                keyword TEXT NOT NULL DEFAULT '',
                content TEXT NOT NULL,
                format INTEGER NOT NULL,
                status INTEGER NOT NULL,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                modified_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )",
            (),
        )
        .await
        .map_err(|e| {
            DatabaseError::initialization_failed(format!("Failed to create articles table: {}", e))
        })?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_articles_category ON articles(category_id)",
            (),
        )
        .await
        .map_err(|e| {
            DatabaseError::initialization_failed(format!("Failed to create article index: {}", e))
        })?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS article_trash (
                id INTEGER NOT NULL,
                category_id INTEGER NOT NULL,
                title TEXT NOT NULL,
                keyword TEXT NOT NULL DEFAULT '',
                content TEXT NOT NULL,
                format INTEGER NOT NULL,
                status INTEGER NOT NULL,
                created_at DATETIME,
                deleted_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )",
            (),
        )
        .await
        .map_err(|e| {
            DatabaseError::initialization_failed(format!("Failed to create trash table: {}", e))
        })?;

        Ok(())
    }

    //
    // TRANSACTION HELPERS
    //

    /// Begin an explicit transaction on a caller-held connection
    pub async fn begin_transaction(conn: &Connection) -> Result<(), DatabaseError> {
        conn.execute("BEGIN TRANSACTION", ()).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to begin transaction: {}", e))
        })?;
        Ok(())
    }

    /// Commit the open transaction; attempts a rollback if the commit fails
    pub async fn commit(conn: &Connection) -> Result<(), DatabaseError> {
        if let Err(e) = conn.execute("COMMIT", ()).await {
            let _rollback = conn.execute("ROLLBACK", ()).await;
            return Err(DatabaseError::sql_execution(format!(
                "Failed to commit transaction: {}",
                e
            )));
        }
        Ok(())
    }

    /// Roll back the open transaction (best-effort)
    pub async fn rollback(conn: &Connection) {
        let _rollback = conn.execute("ROLLBACK", ()).await;
    }

    //
    // ROW CONVERSION
    //

    /// Parse a timestamp from the database - handles both the SQLite
    /// `CURRENT_TIMESTAMP` format and RFC 3339
    fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, DatabaseError> {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
            return Ok(naive.and_utc());
        }

        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Ok(dt.with_timezone(&Utc));
        }

        Err(DatabaseError::row_conversion(format!(
            "Unable to parse timestamp '{}' as SQLite or RFC 3339 format",
            s
        )))
    }

    /// Convert a libsql Row to a Category
    ///
    /// Expected columns (in order): id, pid, next_id, title, description,
    /// created_at, modified_at.
    fn row_to_category(row: &Row) -> Result<Category, DatabaseError> {
        let id: i64 = row
            .get(0)
            .map_err(|e| DatabaseError::row_conversion(format!("Failed to get id: {}", e)))?;
        let pid: i64 = row
            .get(1)
            .map_err(|e| DatabaseError::row_conversion(format!("Failed to get pid: {}", e)))?;
        let next_id: i64 = row
            .get(2)
            .map_err(|e| DatabaseError::row_conversion(format!("Failed to get next_id: {}", e)))?;
        let title: String = row
            .get(3)
            .map_err(|e| DatabaseError::row_conversion(format!("Failed to get title: {}", e)))?;
        let description: String = row.get(4).map_err(|e| {
            DatabaseError::row_conversion(format!("Failed to get description: {}", e))
        })?;
        let created_at_str: String = row.get(5).map_err(|e| {
            DatabaseError::row_conversion(format!("Failed to get created_at: {}", e))
        })?;
        let modified_at_str: String = row.get(6).map_err(|e| {
            DatabaseError::row_conversion(format!("Failed to get modified_at: {}", e))
        })?;

        Ok(Category {
            id,
            pid,
            next_id,
            title,
            description,
            created_at: Self::parse_timestamp(&created_at_str)?,
            modified_at: Self::parse_timestamp(&modified_at_str)?,
        })
    }

    fn status_from_row(value: i64) -> Result<ArticleStatus, DatabaseError> {
        ArticleStatus::from_i64(value)
            .ok_or_else(|| DatabaseError::row_conversion(format!("Unknown status value {}", value)))
    }

    fn format_from_row(value: i64) -> Result<ArticleFormat, DatabaseError> {
        ArticleFormat::from_i64(value)
            .ok_or_else(|| DatabaseError::row_conversion(format!("Unknown format value {}", value)))
    }

    /// Convert a libsql Row to an Article
    ///
    /// Expected columns (in order): id, category_id, title, keyword,
    /// content, format, status, created_at, modified_at.
    fn row_to_article(row: &Row) -> Result<Article, DatabaseError> {
        let created_at_str: String = row.get(7).map_err(|e| {
            DatabaseError::row_conversion(format!("Failed to get created_at: {}", e))
        })?;
        let modified_at_str: String = row.get(8).map_err(|e| {
            DatabaseError::row_conversion(format!("Failed to get modified_at: {}", e))
        })?;

        Ok(Article {
            id: row
                .get(0)
                .map_err(|e| DatabaseError::row_conversion(format!("Failed to get id: {}", e)))?,
            category_id: row.get(1).map_err(|e| {
                DatabaseError::row_conversion(format!("Failed to get category_id: {}", e))
            })?,
            title: row
                .get(2)
                .map_err(|e| DatabaseError::row_conversion(format!("Failed to get title: {}", e)))?,
            keyword: row.get(3).map_err(|e| {
                DatabaseError::row_conversion(format!("Failed to get keyword: {}", e))
            })?,
            content: row.get(4).map_err(|e| {
                DatabaseError::row_conversion(format!("Failed to get content: {}", e))
            })?,
            format: Self::format_from_row(row.get(5).map_err(|e| {
                DatabaseError::row_conversion(format!("Failed to get format: {}", e))
            })?)?,
            status: Self::status_from_row(row.get(6).map_err(|e| {
                DatabaseError::row_conversion(format!("Failed to get status: {}", e))
            })?)?,
            created_at: Self::parse_timestamp(&created_at_str)?,
            modified_at: Self::parse_timestamp(&modified_at_str)?,
        })
    }

    /// Convert a libsql Row to an ArticleSummary (no content column)
    ///
    /// Expected columns (in order): id, category_id, title, keyword, format,
    /// status, created_at, modified_at.
    fn row_to_article_summary(row: &Row) -> Result<ArticleSummary, DatabaseError> {
        let created_at_str: String = row.get(6).map_err(|e| {
            DatabaseError::row_conversion(format!("Failed to get created_at: {}", e))
        })?;
        let modified_at_str: String = row.get(7).map_err(|e| {
            DatabaseError::row_conversion(format!("Failed to get modified_at: {}", e))
        })?;

        Ok(ArticleSummary {
            id: row
                .get(0)
                .map_err(|e| DatabaseError::row_conversion(format!("Failed to get id: {}", e)))?,
            category_id: row.get(1).map_err(|e| {
                DatabaseError::row_conversion(format!("Failed to get category_id: {}", e))
            })?,
            title: row
                .get(2)
                .map_err(|e| DatabaseError::row_conversion(format!("Failed to get title: {}", e)))?,
            keyword: row.get(3).map_err(|e| {
                DatabaseError::row_conversion(format!("Failed to get keyword: {}", e))
            })?,
            format: Self::format_from_row(row.get(4).map_err(|e| {
                DatabaseError::row_conversion(format!("Failed to get format: {}", e))
            })?)?,
            status: Self::status_from_row(row.get(5).map_err(|e| {
                DatabaseError::row_conversion(format!("Failed to get status: {}", e))
            })?)?,
            created_at: Self::parse_timestamp(&created_at_str)?,
            modified_at: Self::parse_timestamp(&modified_at_str)?,
        })
    }

    //
    // CATEGORY STATEMENTS
    //

    /// Fetch every category row, ordered by id
    ///
    /// The tree cache rebuilds its whole view from this; the fixed ordering
    /// keeps reconstruction deterministic for identical underlying rows.
    pub async fn db_fetch_categories(&self) -> Result<Vec<Category>, DatabaseError> {
        let conn = self.connect_with_timeout().await?;

        let mut stmt = conn
            .prepare(
                "SELECT id, pid, next_id, title, description, created_at, modified_at
                 FROM categories ORDER BY id",
            )
            .await
            .map_err(|e| {
                DatabaseError::sql_execution(format!("Failed to prepare category query: {}", e))
            })?;

        let mut rows = stmt.query(()).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to execute category query: {}", e))
        })?;

        let mut categories = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| DatabaseError::sql_execution(format!("Failed to fetch row: {}", e)))?
        {
            categories.push(Self::row_to_category(&row)?);
        }

        Ok(categories)
    }

    /// Insert a category row; returns the store-assigned id
    ///
    /// Participates in a caller-managed transaction.
    pub async fn db_insert_category(
        conn: &Connection,
        pid: i64,
        next_id: i64,
        title: &str,
        description: &str,
    ) -> Result<i64, DatabaseError> {
        conn.execute(
            "INSERT INTO categories (pid, next_id, title, description) VALUES (?, ?, ?, ?)",
            (pid, next_id, title, description),
        )
        .await
        .map_err(|e| DatabaseError::sql_execution(format!("Failed to insert category: {}", e)))?;

        Ok(conn.last_insert_rowid())
    }

    /// Repoint a category's `next_id` sibling link
    ///
    /// Participates in a caller-managed transaction.
    pub async fn db_set_category_next(
        conn: &Connection,
        id: i64,
        next_id: i64,
    ) -> Result<(), DatabaseError> {
        conn.execute(
            "UPDATE categories SET next_id = ?, modified_at = CURRENT_TIMESTAMP WHERE id = ?",
            (next_id, id),
        )
        .await
        .map_err(|e| DatabaseError::sql_execution(format!("Failed to repoint category: {}", e)))?;

        Ok(())
    }

    /// Rewrite a category's own linkage (`pid` and `next_id` together)
    ///
    /// Participates in a caller-managed transaction.
    pub async fn db_relocate_category(
        conn: &Connection,
        id: i64,
        pid: i64,
        next_id: i64,
    ) -> Result<(), DatabaseError> {
        conn.execute(
            "UPDATE categories SET pid = ?, next_id = ?, modified_at = CURRENT_TIMESTAMP WHERE id = ?",
            (pid, next_id, id),
        )
        .await
        .map_err(|e| DatabaseError::sql_execution(format!("Failed to relocate category: {}", e)))?;

        Ok(())
    }

    /// Delete a category row; returns the number of affected rows
    ///
    /// Participates in a caller-managed transaction.
    pub async fn db_delete_category(conn: &Connection, id: i64) -> Result<u64, DatabaseError> {
        conn.execute("DELETE FROM categories WHERE id = ?", [id])
            .await
            .map_err(|e| DatabaseError::sql_execution(format!("Failed to delete category: {}", e)))
    }

    /// Content-only category update (single statement, no transaction)
    pub async fn db_update_category_content(
        &self,
        id: i64,
        title: &str,
        description: &str,
    ) -> Result<u64, DatabaseError> {
        let conn = self.connect_with_timeout().await?;

        conn.execute(
            "UPDATE categories SET title = ?, description = ?, modified_at = CURRENT_TIMESTAMP
             WHERE id = ?",
            (title, description, id),
        )
        .await
        .map_err(|e| DatabaseError::sql_execution(format!("Failed to update category: {}", e)))
    }

    //
    // ARTICLE STATEMENTS
    //

    /// Insert an article row; returns the store-assigned id
    pub async fn db_insert_article(
        &self,
        params: DbCreateArticleParams<'_>,
    ) -> Result<i64, DatabaseError> {
        let conn = self.connect_with_timeout().await?;

        conn.execute(
            "INSERT INTO articles (category_id, title, keyword, content, format, status)
             VALUES (?, ?, ?, ?, ?, ?)",
            (
                params.category_id,
                params.title,
                params.keyword,
                params.content,
                params.format,
                params.status,
            ),
        )
        .await
        .map_err(|e| DatabaseError::sql_execution(format!("Failed to insert article: {}", e)))?;

        Ok(conn.last_insert_rowid())
    }

    /// Retrieve a single article by id
    pub async fn db_get_article(&self, id: i64) -> Result<Option<Article>, DatabaseError> {
        let conn = self.connect_with_timeout().await?;

        let mut stmt = conn
            .prepare(
                "SELECT id, category_id, title, keyword, content, format, status,
                        created_at, modified_at
                 FROM articles WHERE id = ? LIMIT 1",
            )
            .await
            .map_err(|e| {
                DatabaseError::sql_execution(format!("Failed to prepare article query: {}", e))
            })?;

        let mut rows = stmt.query([id]).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to execute article query: {}", e))
        })?;

        match rows
            .next()
            .await
            .map_err(|e| DatabaseError::sql_execution(format!("Failed to fetch row: {}", e)))?
        {
            Some(row) => Ok(Some(Self::row_to_article(&row)?)),
            None => Ok(None),
        }
    }

    /// Full-row article update (caller merges sparse fields first); returns
    /// the number of affected rows
    pub async fn db_update_article(
        &self,
        id: i64,
        params: DbCreateArticleParams<'_>,
    ) -> Result<u64, DatabaseError> {
        let conn = self.connect_with_timeout().await?;

        conn.execute(
            "UPDATE articles SET category_id = ?, title = ?, keyword = ?, content = ?,
                    format = ?, status = ?, modified_at = CURRENT_TIMESTAMP
             WHERE id = ?",
            (
                params.category_id,
                params.title,
                params.keyword,
                params.content,
                params.format,
                params.status,
                id,
            ),
        )
        .await
        .map_err(|e| DatabaseError::sql_execution(format!("Failed to update article: {}", e)))
    }

    /// Copy an article row into the trash table
    ///
    /// Participates in a caller-managed transaction together with
    /// [`DatabaseService::db_delete_article`].
    pub async fn db_trash_article(
        conn: &Connection,
        article: &Article,
    ) -> Result<(), DatabaseError> {
        conn.execute(
            "INSERT INTO article_trash (id, category_id, title, keyword, content, format, status, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            (
                article.id,
                article.category_id,
                article.title.as_str(),
                article.keyword.as_str(),
                article.content.as_str(),
                article.format.as_i64(),
                article.status.as_i64(),
                article.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            ),
        )
        .await
        .map_err(|e| DatabaseError::sql_execution(format!("Failed to trash article: {}", e)))?;

        Ok(())
    }

    /// Delete an article row; returns the number of affected rows
    ///
    /// Participates in a caller-managed transaction.
    pub async fn db_delete_article(conn: &Connection, id: i64) -> Result<u64, DatabaseError> {
        conn.execute("DELETE FROM articles WHERE id = ?", [id])
            .await
            .map_err(|e| DatabaseError::sql_execution(format!("Failed to delete article: {}", e)))
    }

    /// List article summaries, newest first, with optional category/status
    /// filters and LIMIT/OFFSET paging
    pub async fn db_list_articles(
        &self,
        category_id: Option<i64>,
        status: Option<i64>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ArticleSummary>, DatabaseError> {
        let conn = self.connect_with_timeout().await?;

        const COLUMNS: &str =
            "id, category_id, title, keyword, format, status, created_at, modified_at";

        let mut rows = match (category_id, status) {
            (Some(category_id), Some(status)) => {
                let mut stmt = conn
                    .prepare(&format!(
                        "SELECT {} FROM articles WHERE category_id = ? AND status = ?
                         ORDER BY id DESC LIMIT ? OFFSET ?",
                        COLUMNS
                    ))
                    .await
                    .map_err(|e| {
                        DatabaseError::sql_execution(format!("Failed to prepare list query: {}", e))
                    })?;
                stmt.query((category_id, status, limit, offset))
                    .await
                    .map_err(|e| {
                        DatabaseError::sql_execution(format!("Failed to execute list query: {}", e))
                    })?
            }
            (Some(category_id), None) => {
                let mut stmt = conn
                    .prepare(&format!(
                        "SELECT {} FROM articles WHERE category_id = ?
                         ORDER BY id DESC LIMIT ? OFFSET ?",
                        COLUMNS
                    ))
                    .await
                    .map_err(|e| {
                        DatabaseError::sql_execution(format!("Failed to prepare list query: {}", e))
                    })?;
                stmt.query((category_id, limit, offset)).await.map_err(|e| {
                    DatabaseError::sql_execution(format!("Failed to execute list query: {}", e))
                })?
            }
            (None, Some(status)) => {
                let mut stmt = conn
                    .prepare(&format!(
                        "SELECT {} FROM articles WHERE status = ?
                         ORDER BY id DESC LIMIT ? OFFSET ?",
                        COLUMNS
                    ))
                    .await
                    .map_err(|e| {
                        DatabaseError::sql_execution(format!("Failed to prepare list query: {}", e))
                    })?;
                stmt.query((status, limit, offset)).await.map_err(|e| {
                    DatabaseError::sql_execution(format!("Failed to execute list query: {}", e))
                })?
            }
            (None, None) => {
                let mut stmt = conn
                    .prepare(&format!(
                        "SELECT {} FROM articles ORDER BY id DESC LIMIT ? OFFSET ?",
                        COLUMNS
                    ))
                    .await
                    .map_err(|e| {
                        DatabaseError::sql_execution(format!("Failed to prepare list query: {}", e))
                    })?;
                stmt.query((limit, offset)).await.map_err(|e| {
                    DatabaseError::sql_execution(format!("Failed to execute list query: {}", e))
                })?
            }
        };

        let mut articles = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| DatabaseError::sql_execution(format!("Failed to fetch row: {}", e)))?
        {
            articles.push(Self::row_to_article_summary(&row)?);
        }

        Ok(articles)
    }

    /// Count articles still referencing a category
    ///
    /// Used by the pre-removal hook to veto category deletion.
    pub async fn db_count_articles_in_category(
        &self,
        category_id: i64,
    ) -> Result<i64, DatabaseError> {
        let conn = self.connect_with_timeout().await?;

        let mut stmt = conn
            .prepare("SELECT COUNT(*) FROM articles WHERE category_id = ?")
            .await
            .map_err(|e| {
                DatabaseError::sql_execution(format!("Failed to prepare count query: {}", e))
            })?;

        let mut rows = stmt.query([category_id]).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to execute count query: {}", e))
        })?;

        let row = rows
            .next()
            .await
            .map_err(|e| DatabaseError::sql_execution(format!("Failed to fetch count: {}", e)))?
            .ok_or_else(|| DatabaseError::sql_execution("COUNT query returned no rows"))?;

        row.get(0)
            .map_err(|e| DatabaseError::row_conversion(format!("Failed to get count: {}", e)))
    }
}
