//! `SQLite` schema definitions for the document store.
//!
//! Documents of every collection share one table. Their fields are kept as a
//! JSON object so the table stays schemaless, like a hosted document store.

/// SQL statement to create the documents table.
pub const CREATE_DOCUMENTS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS documents (
    seq INTEGER PRIMARY KEY AUTOINCREMENT,
    collection TEXT NOT NULL,
    id TEXT NOT NULL,
    fields TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
)
";

/// SQL statement to make identifiers unique within a collection.
pub const CREATE_COLLECTION_ID_INDEX: &str = r"
CREATE UNIQUE INDEX IF NOT EXISTS idx_documents_collection_id ON documents(collection, id)
";

/// SQL statement to speed up "most recent write" lookups per collection.
pub const CREATE_UPDATED_AT_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_documents_collection_updated ON documents(collection, updated_at)
";

/// SQL statement to create the metadata table for storing key-value pairs.
pub const CREATE_METADATA_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
";
