//! SQLite database for uploaded files and their analysis results

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::types::{AnalysisResult, FileRecord, FileStatus, ResultOrigin, StoredResult};

/// SQLite-based file and result registry
#[derive(Clone)]
pub struct AnalysisDb {
    conn: Arc<Mutex<Connection>>,
}

impl AnalysisDb {
    /// Create or open the database at the given path
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)
            .map_err(|e| Error::Storage(format!("Failed to open database: {}", e)))?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        db.migrate()?;
        Ok(db)
    }

    /// Create an in-memory database (for testing)
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| Error::Storage(format!("Failed to open in-memory database: {}", e)))?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        db.migrate()?;
        Ok(db)
    }

    /// Run database migrations
    fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock();

        conn.execute_batch(
            r#"
            PRAGMA journal_mode=WAL;
            PRAGMA synchronous=NORMAL;
            PRAGMA foreign_keys=ON;
        "#,
        )?;

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS files (
                file_id TEXT PRIMARY KEY,
                filename TEXT NOT NULL,
                storage_key TEXT NOT NULL,
                size INTEGER NOT NULL,
                content_hash TEXT NOT NULL,
                uploaded_at TEXT NOT NULL,
                status TEXT NOT NULL,
                error_message TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_files_status ON files(status);
            CREATE INDEX IF NOT EXISTS idx_files_content_hash ON files(content_hash);

            CREATE TABLE IF NOT EXISTS results (
                file_id TEXT PRIMARY KEY REFERENCES files(file_id) ON DELETE CASCADE,
                summary TEXT NOT NULL,
                insights TEXT NOT NULL,
                topics TEXT NOT NULL,
                sentiment TEXT NOT NULL,
                origin TEXT NOT NULL,
                processed_at TEXT NOT NULL
            );
        "#,
        )?;

        tracing::debug!("Database migrations complete");
        Ok(())
    }

    // ==================== Files ====================

    /// Insert a newly uploaded file
    pub fn insert_file(&self, record: &FileRecord) -> Result<()> {
        let conn = self.conn.lock();

        conn.execute(
            r#"
            INSERT INTO files (
                file_id, filename, storage_key, size, content_hash, uploaded_at, status,
                error_message
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                record.file_id.to_string(),
                record.filename,
                record.storage_key,
                record.size as i64,
                record.content_hash,
                record.uploaded_at.to_rfc3339(),
                record.status.as_str(),
                record.error_message,
            ],
        )?;

        Ok(())
    }

    /// Get a file by ID
    pub fn get_file(&self, file_id: Uuid) -> Result<Option<FileRecord>> {
        let conn = self.conn.lock();

        let record = conn
            .query_row(
                r#"
                SELECT file_id, filename, storage_key, size, content_hash, uploaded_at, status,
                       error_message
                FROM files WHERE file_id = ?1
                "#,
                params![file_id.to_string()],
                row_to_file_record,
            )
            .optional()?;

        Ok(record)
    }

    /// Get a file by ID, failing with `FileNotFound` when absent
    pub fn require_file(&self, file_id: Uuid) -> Result<FileRecord> {
        self.get_file(file_id)?
            .ok_or_else(|| Error::FileNotFound(file_id.to_string()))
    }

    /// List all files, newest first
    pub fn list_files(&self) -> Result<Vec<FileRecord>> {
        let conn = self.conn.lock();

        let mut stmt = conn.prepare(
            r#"
            SELECT file_id, filename, storage_key, size, content_hash, uploaded_at, status,
                   error_message
            FROM files ORDER BY uploaded_at DESC
            "#,
        )?;

        let records = stmt
            .query_map([], row_to_file_record)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(records)
    }

    /// Record a status transition. Returns false when the file is unknown.
    pub fn update_status(
        &self,
        file_id: Uuid,
        status: FileStatus,
        error_message: Option<&str>,
    ) -> Result<bool> {
        let conn = self.conn.lock();

        let updated = conn.execute(
            "UPDATE files SET status = ?2, error_message = ?3 WHERE file_id = ?1",
            params![file_id.to_string(), status.as_str(), error_message],
        )?;

        Ok(updated > 0)
    }

    // ==================== Results ====================

    /// Store the analysis for a file, replacing any earlier one
    pub fn upsert_result(&self, stored: &StoredResult) -> Result<()> {
        let conn = self.conn.lock();

        conn.execute(
            r#"
            INSERT INTO results (
                file_id, summary, insights, topics, sentiment, origin, processed_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT(file_id) DO UPDATE SET
                summary = excluded.summary,
                insights = excluded.insights,
                topics = excluded.topics,
                sentiment = excluded.sentiment,
                origin = excluded.origin,
                processed_at = excluded.processed_at
            "#,
            params![
                stored.file_id.to_string(),
                stored.result.summary,
                serde_json::to_string(&stored.result.insights)?,
                serde_json::to_string(&stored.result.topics)?,
                stored.result.sentiment,
                stored.origin.as_str(),
                stored.processed_at.to_rfc3339(),
            ],
        )?;

        Ok(())
    }

    /// Get the stored analysis for a file
    pub fn get_result(&self, file_id: Uuid) -> Result<Option<StoredResult>> {
        let conn = self.conn.lock();

        let stored = conn
            .query_row(
                r#"
                SELECT file_id, summary, insights, topics, sentiment, origin, processed_at
                FROM results WHERE file_id = ?1
                "#,
                params![file_id.to_string()],
                row_to_stored_result,
            )
            .optional()?;

        Ok(stored)
    }
}

// ==================== Row conversion ====================

fn conversion_error(
    column: usize,
    err: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(column, Type::Text, Box::new(err))
}

fn invalid_value(column: usize, value: &str) -> rusqlite::Error {
    conversion_error(
        column,
        std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("unexpected value '{}'", value),
        ),
    )
}

fn parse_uuid(row: &rusqlite::Row, column: usize) -> rusqlite::Result<Uuid> {
    let raw: String = row.get(column)?;
    Uuid::parse_str(&raw).map_err(|e| conversion_error(column, e))
}

fn parse_timestamp(row: &rusqlite::Row, column: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(column)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|d| d.with_timezone(&Utc))
        .map_err(|e| conversion_error(column, e))
}

fn parse_list(row: &rusqlite::Row, column: usize) -> rusqlite::Result<Vec<String>> {
    let raw: String = row.get(column)?;
    serde_json::from_str(&raw).map_err(|e| conversion_error(column, e))
}

fn row_to_file_record(row: &rusqlite::Row) -> rusqlite::Result<FileRecord> {
    let status_str: String = row.get(6)?;
    let size: i64 = row.get(3)?;

    Ok(FileRecord {
        file_id: parse_uuid(row, 0)?,
        filename: row.get(1)?,
        storage_key: row.get(2)?,
        size: size as u64,
        content_hash: row.get(4)?,
        uploaded_at: parse_timestamp(row, 5)?,
        status: FileStatus::parse(&status_str).ok_or_else(|| invalid_value(6, &status_str))?,
        error_message: row.get(7)?,
    })
}

fn row_to_stored_result(row: &rusqlite::Row) -> rusqlite::Result<StoredResult> {
    let origin_str: String = row.get(5)?;

    Ok(StoredResult {
        file_id: parse_uuid(row, 0)?,
        result: AnalysisResult {
            summary: row.get(1)?,
            insights: parse_list(row, 2)?,
            topics: parse_list(row, 3)?,
            sentiment: row.get(4)?,
        },
        origin: ResultOrigin::parse(&origin_str).ok_or_else(|| invalid_value(5, &origin_str))?,
        processed_at: parse_timestamp(row, 6)?,
    })
}
