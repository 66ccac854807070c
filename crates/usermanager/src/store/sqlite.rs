//! `SQLite`-backed document collection.
//!
//! Stands in for a hosted document database: documents get store-assigned
//! identifiers, their fields are stored as JSON, and every call goes through
//! the same four-operation contract as any other backend.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};

use super::{migrations, new_document_id, DocumentCollection};
use crate::error::{Error, Result};
use crate::record::{Draft, Record};

/// A document collection stored in a `SQLite` database.
#[derive(Debug)]
pub struct SqliteCollection {
    /// Path to the database file.
    path: PathBuf,
    /// Collection addressed by this handle.
    collection: String,
    /// Database connection.
    conn: Mutex<Connection>,
}

impl SqliteCollection {
    /// Open or create a database at `path` and address `collection` in it.
    ///
    /// Creates the parent directories and database file if they don't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema
    /// initialization fails.
    pub fn open(path: impl AsRef<Path>, collection: impl Into<String>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening document database at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;

        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        migrations::initialize_schema(&conn)?;

        info!("Document database opened at {}", path.display());
        Ok(Self {
            path,
            collection: collection.into(),
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory database, mostly for tests.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory(collection: impl Into<String>) -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(":memory:"),
            source,
        })?;

        migrations::initialize_schema(&conn)?;

        Ok(Self {
            path: PathBuf::from(":memory:"),
            collection: collection.into(),
            conn: Mutex::new(conn),
        })
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get statistics about the addressed collection.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn stats(&self) -> Result<StoreStats> {
        let conn = self.lock()?;

        let total_documents: i64 = conn.query_row(
            "SELECT COUNT(*) FROM documents WHERE collection = ?1",
            [&self.collection],
            |row| row.get(0),
        )?;

        let last_write: Option<String> = conn
            .query_row(
                r"
                SELECT updated_at FROM documents WHERE collection = ?1
                ORDER BY updated_at DESC LIMIT 1
                ",
                [&self.collection],
                |row| row.get(0),
            )
            .optional()?;

        let last_write = last_write
            .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
            .map(|dt| dt.with_timezone(&Utc));

        let db_size_bytes = if self.path.to_string_lossy() == ":memory:" {
            0
        } else {
            std::fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0)
        };

        Ok(StoreStats {
            collection: self.collection.clone(),
            total_documents,
            last_write,
            db_size_bytes,
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| Error::internal("database connection lock poisoned"))
    }

    fn decode_fields(id: &str, json: &str) -> Result<Draft> {
        serde_json::from_str(json).map_err(|e| Error::InvalidDocument {
            id: id.to_string(),
            message: e.to_string(),
        })
    }
}

#[async_trait::async_trait]
impl DocumentCollection for SqliteCollection {
    fn name(&self) -> &str {
        &self.collection
    }

    async fn list(&self) -> Result<Vec<Record>> {
        let rows = {
            let conn = self.lock()?;
            let mut stmt = conn.prepare(
                r"
                SELECT id, fields FROM documents
                WHERE collection = ?1 ORDER BY seq ASC
                ",
            )?;
            let rows = stmt
                .query_map([&self.collection], |row| {
                    Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            rows
        };

        let records = rows
            .into_iter()
            .map(|(id, json)| {
                let fields = Self::decode_fields(&id, &json)?;
                Ok(Record::new(id, fields))
            })
            .collect::<Result<Vec<_>>>()?;

        debug!(collection = %self.collection, count = records.len(), "Listed documents");
        Ok(records)
    }

    async fn insert(&self, fields: &Draft) -> Result<String> {
        let id = new_document_id();
        let json = serde_json::to_string(fields)?;
        let now = Utc::now().to_rfc3339();

        self.lock()?.execute(
            r"
            INSERT INTO documents (collection, id, fields, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?4)
            ",
            params![self.collection, id, json, now],
        )?;

        debug!(collection = %self.collection, id = %id, "Inserted document");
        Ok(id)
    }

    async fn update(&self, id: &str, fields: &Draft) -> Result<()> {
        let json = serde_json::to_string(fields)?;
        let now = Utc::now().to_rfc3339();

        let affected = self.lock()?.execute(
            r"
            UPDATE documents SET fields = ?1, updated_at = ?2
            WHERE collection = ?3 AND id = ?4
            ",
            params![json, now, self.collection, id],
        )?;

        if affected == 0 {
            return Err(Error::not_found(&self.collection, id));
        }
        debug!(collection = %self.collection, id = %id, "Updated document");
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let affected = self.lock()?.execute(
            "DELETE FROM documents WHERE collection = ?1 AND id = ?2",
            params![self.collection, id],
        )?;

        if affected == 0 {
            return Err(Error::not_found(&self.collection, id));
        }
        debug!(collection = %self.collection, id = %id, "Deleted document");
        Ok(())
    }
}

/// Statistics about a stored collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreStats {
    /// Name of the collection.
    pub collection: String,
    /// Number of documents in the collection.
    pub total_documents: i64,
    /// Time of the most recent insert or update.
    pub last_write: Option<DateTime<Utc>>,
    /// Size of the database file in bytes.
    pub db_size_bytes: u64,
}
