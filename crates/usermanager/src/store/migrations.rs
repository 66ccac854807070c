//! Schema versioning for the `SQLite` document store.
//!
//! The version lives in the `metadata` table. Each step below runs in its own
//! transaction and bumps the stored version when it commits, so an
//! interrupted upgrade resumes from the last finished step.

use rusqlite::Connection;

use crate::error::{Error, Result};

use super::schema::{
    CREATE_COLLECTION_ID_INDEX, CREATE_DOCUMENTS_TABLE, CREATE_METADATA_TABLE,
    CREATE_UPDATED_AT_INDEX,
};

const VERSION_KEY: &str = "schema_version";

struct Migration {
    version: i32,
    description: &'static str,
    statements: &'static [&'static str],
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "documents table",
        statements: &[CREATE_DOCUMENTS_TABLE, CREATE_COLLECTION_ID_INDEX],
    },
    Migration {
        version: 2,
        description: "last-write index",
        statements: &[CREATE_UPDATED_AT_INDEX],
    },
];

/// The schema version this build writes.
pub const CURRENT_VERSION: i32 = 2;

/// Bring a database up to [`CURRENT_VERSION`].
///
/// # Errors
///
/// Returns an error if a step fails, or if the database was written by a
/// newer build.
pub fn initialize_schema(conn: &Connection) -> Result<()> {
    conn.execute(CREATE_METADATA_TABLE, [])?;

    let found = schema_version(conn)?;
    if found > CURRENT_VERSION {
        return Err(Error::DatabaseMigration {
            message: format!(
                "database schema version {found} is newer than supported version {CURRENT_VERSION}"
            ),
        });
    }

    for migration in MIGRATIONS.iter().filter(|m| m.version > found) {
        apply(conn, migration)?;
    }
    Ok(())
}

/// Stored schema version, 0 when nothing has been applied.
///
/// # Errors
///
/// Returns an error if the metadata table cannot be read or the stored value
/// is not a number.
pub fn schema_version(conn: &Connection) -> Result<i32> {
    let stored = conn.query_row(
        "SELECT value FROM metadata WHERE key = ?1",
        [VERSION_KEY],
        |row| row.get::<_, String>(0),
    );

    match stored {
        Ok(value) => value.parse().map_err(|_| Error::DatabaseMigration {
            message: format!("invalid schema version: {value}"),
        }),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(0),
        Err(e) => Err(e.into()),
    }
}

fn apply(conn: &Connection, migration: &Migration) -> Result<()> {
    tracing::debug!(
        version = migration.version,
        step = migration.description,
        "Applying schema migration"
    );

    let tx = conn.unchecked_transaction()?;
    for statement in migration.statements {
        tx.execute(statement, []).map_err(|e| Error::DatabaseMigration {
            message: format!("step {} ({}): {e}", migration.version, migration.description),
        })?;
    }
    tx.execute(
        "INSERT OR REPLACE INTO metadata (key, value) VALUES (?1, ?2)",
        (VERSION_KEY, migration.version.to_string()),
    )?;
    tx.commit()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index_exists(conn: &Connection, name: &str) -> bool {
        conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'index' AND name = ?1",
            [name],
            |row| row.get::<_, i32>(0),
        )
        .unwrap()
            == 1
    }

    #[test]
    fn test_steps_are_ordered_and_end_at_current() {
        let versions: Vec<i32> = MIGRATIONS.iter().map(|m| m.version).collect();
        assert!(versions.windows(2).all(|w| w[1] == w[0] + 1));
        assert_eq!(versions.last().copied(), Some(CURRENT_VERSION));
    }

    #[test]
    fn test_fresh_database_reaches_current_version() {
        let conn = Connection::open_in_memory().unwrap();
        initialize_schema(&conn).unwrap();

        assert_eq!(schema_version(&conn).unwrap(), CURRENT_VERSION);
        assert!(index_exists(&conn, "idx_documents_collection_id"));
        assert!(index_exists(&conn, "idx_documents_collection_updated"));
    }

    #[test]
    fn test_reopening_is_a_no_op() {
        let conn = Connection::open_in_memory().unwrap();
        initialize_schema(&conn).unwrap();
        initialize_schema(&conn).unwrap();
        assert_eq!(schema_version(&conn).unwrap(), CURRENT_VERSION);
    }

    #[test]
    fn test_version_one_database_is_upgraded() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute(CREATE_METADATA_TABLE, []).unwrap();
        apply(&conn, &MIGRATIONS[0]).unwrap();
        assert_eq!(schema_version(&conn).unwrap(), 1);
        assert!(!index_exists(&conn, "idx_documents_collection_updated"));

        initialize_schema(&conn).unwrap();
        assert_eq!(schema_version(&conn).unwrap(), 2);
        assert!(index_exists(&conn, "idx_documents_collection_updated"));
    }

    #[test]
    fn test_garbage_version_is_rejected() {
        let conn = Connection::open_in_memory().unwrap();
        initialize_schema(&conn).unwrap();
        conn.execute(
            "UPDATE metadata SET value = 'abc' WHERE key = ?1",
            [VERSION_KEY],
        )
        .unwrap();

        let err = initialize_schema(&conn).unwrap_err();
        assert!(err.to_string().contains("invalid schema version"));
    }

    #[test]
    fn test_newer_database_is_rejected() {
        let conn = Connection::open_in_memory().unwrap();
        initialize_schema(&conn).unwrap();
        conn.execute(
            "UPDATE metadata SET value = ?1 WHERE key = ?2",
            ((CURRENT_VERSION + 1).to_string(), VERSION_KEY),
        )
        .unwrap();

        let err = initialize_schema(&conn).unwrap_err();
        assert!(matches!(err, Error::DatabaseMigration { .. }));
    }
}
