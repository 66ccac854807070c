//! Document store abstraction for usermanager.
//!
//! The controller never talks to a database directly; it talks to a
//! [`DocumentCollection`], a four-operation contract over one named
//! collection of schemaless documents:
//!
//! - **list** every document,
//! - **insert** a field set and receive a store-assigned identifier,
//! - **update** a document by identifier, replacing all of its fields,
//! - **delete** a document by identifier.
//!
//! Update and delete fail with [`Error::DocumentNotFound`] when the
//! identifier does not exist.
//!
//! Two backends ship with the crate: [`MemoryCollection`] keeps documents in
//! process, [`SqliteCollection`] keeps them in a `SQLite` file.

pub mod memory;
pub mod migrations;
pub mod schema;
pub mod sqlite;

use std::sync::Arc;

use crate::config::{Config, StoreBackend};
use crate::error::{Error, Result};
use crate::record::{Draft, Record};

pub use memory::MemoryCollection;
pub use sqlite::{SqliteCollection, StoreStats};

/// A remote collection of user documents.
#[async_trait::async_trait]
pub trait DocumentCollection: Send + Sync {
    /// Name of the collection (for logging/debugging).
    fn name(&self) -> &str;

    /// Fetch every document in the collection. Order is not significant.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    async fn list(&self) -> Result<Vec<Record>>;

    /// Insert a new document and return the identifier the store assigned.
    ///
    /// # Errors
    ///
    /// Returns an error if the store rejects the write.
    async fn insert(&self, fields: &Draft) -> Result<String>;

    /// Replace all fields of the document with the given identifier.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DocumentNotFound`] if no such document exists, or an
    /// error if the store rejects the write.
    async fn update(&self, id: &str, fields: &Draft) -> Result<()>;

    /// Remove the document with the given identifier.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DocumentNotFound`] if no such document exists, or an
    /// error if the store rejects the write.
    async fn delete(&self, id: &str) -> Result<()>;
}

macro_rules! forward_collection {
    ($wrapper:ident) => {
        #[async_trait::async_trait]
        impl<C: DocumentCollection + ?Sized> DocumentCollection for $wrapper<C> {
            fn name(&self) -> &str {
                (**self).name()
            }

            async fn list(&self) -> Result<Vec<Record>> {
                (**self).list().await
            }

            async fn insert(&self, fields: &Draft) -> Result<String> {
                (**self).insert(fields).await
            }

            async fn update(&self, id: &str, fields: &Draft) -> Result<()> {
                (**self).update(id, fields).await
            }

            async fn delete(&self, id: &str) -> Result<()> {
                (**self).delete(id).await
            }
        }
    };
}

forward_collection!(Arc);
forward_collection!(Box);

/// Generate a fresh document identifier.
#[must_use]
pub fn new_document_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Open the collection selected by the configuration.
///
/// # Errors
///
/// Returns an error if the backend cannot be opened.
pub fn open(config: &Config) -> Result<Box<dyn DocumentCollection>> {
    let collection = config.store.collection.clone();
    match config.store.backend {
        StoreBackend::Memory => Ok(Box::new(
            MemoryCollection::new(collection).with_latency(config.latency()),
        )),
        StoreBackend::Sqlite => {
            let path = config.database_path();
            if path.as_os_str().is_empty() {
                return Err(Error::ConfigValidation {
                    message: "store.database_path must not be empty".to_string(),
                });
            }
            Ok(Box::new(SqliteCollection::open(path, collection)?))
        }
    }
}
