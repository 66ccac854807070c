//! In-process document collection.
//!
//! Keeps documents in insertion order behind a mutex. An optional simulated
//! latency is applied before every call so overlapping controller actions
//! interleave the way they would against a hosted store.

use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use tracing::{debug, trace};

use super::{new_document_id, DocumentCollection};
use crate::error::{Error, Result};
use crate::record::{Draft, Record};

/// A document collection held in memory.
#[derive(Debug)]
pub struct MemoryCollection {
    name: String,
    latency: Duration,
    documents: Mutex<Vec<Record>>,
}

impl MemoryCollection {
    /// Create an empty collection.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            latency: Duration::ZERO,
            documents: Mutex::new(Vec::new()),
        }
    }

    /// Create a collection pre-populated with the given records.
    #[must_use]
    pub fn with_records(name: impl Into<String>, records: Vec<Record>) -> Self {
        Self {
            name: name.into(),
            latency: Duration::ZERO,
            documents: Mutex::new(records),
        }
    }

    /// Delay every call by `latency`.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Number of documents currently stored.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection lock is poisoned.
    pub fn count(&self) -> Result<usize> {
        Ok(self.lock()?.len())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Vec<Record>>> {
        self.documents
            .lock()
            .map_err(|_| Error::internal("memory collection lock poisoned"))
    }

    async fn simulate_latency(&self) {
        if !self.latency.is_zero() {
            trace!(latency_ms = self.latency.as_millis(), "Simulating store latency");
            tokio::time::sleep(self.latency).await;
        }
    }
}

#[async_trait::async_trait]
impl DocumentCollection for MemoryCollection {
    fn name(&self) -> &str {
        &self.name
    }

    async fn list(&self) -> Result<Vec<Record>> {
        self.simulate_latency().await;
        let documents = self.lock()?.clone();
        debug!(collection = %self.name, count = documents.len(), "Listed documents");
        Ok(documents)
    }

    async fn insert(&self, fields: &Draft) -> Result<String> {
        self.simulate_latency().await;
        let id = new_document_id();
        self.lock()?.push(Record::new(id.clone(), fields.clone()));
        debug!(collection = %self.name, id = %id, "Inserted document");
        Ok(id)
    }

    async fn update(&self, id: &str, fields: &Draft) -> Result<()> {
        self.simulate_latency().await;
        let mut documents = self.lock()?;
        let record = documents
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| Error::not_found(&self.name, id))?;
        record.fields = fields.clone();
        debug!(collection = %self.name, id = %id, "Updated document");
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.simulate_latency().await;
        let mut documents = self.lock()?;
        let position = documents
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| Error::not_found(&self.name, id))?;
        documents.remove(position);
        debug!(collection = %self.name, id = %id, "Deleted document");
        Ok(())
    }
}
