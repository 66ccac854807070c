//! Error types for usermanager.
//!
//! This module defines the error taxonomy used throughout the crate. Store
//! backends and configuration produce [`Error`]; the record list controller
//! wraps whatever failed into an [`ActionError`] that carries the fixed,
//! user-facing message of the action that was attempted.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// The main error type for usermanager operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Storage Errors ===
    /// Failed to open or create the database.
    #[error("failed to open database at {path}: {source}")]
    DatabaseOpen {
        /// Path to the database file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// A database query failed.
    #[error("database query failed: {0}")]
    DatabaseQuery(#[from] rusqlite::Error),

    /// Failed to run database migrations.
    #[error("database migration failed: {message}")]
    DatabaseMigration {
        /// Description of what went wrong.
        message: String,
    },

    // === Document Errors ===
    /// The addressed document does not exist in the collection.
    #[error("document '{id}' not found in collection '{collection}'")]
    DocumentNotFound {
        /// Name of the collection that was addressed.
        collection: String,
        /// Identifier that could not be resolved.
        id: String,
    },

    /// A stored document could not be decoded into a record.
    #[error("invalid document '{id}': {message}")]
    InvalidDocument {
        /// Identifier of the offending document.
        id: String,
        /// Description of what went wrong.
        message: String,
    },

    /// The document store could not be reached.
    #[error("document store unavailable: {0}")]
    Unavailable(String),

    // === Controller Errors ===
    /// A save was requested while no record was being edited.
    #[error("no record is being edited")]
    NoEditInProgress,

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// An internal error occurred (bug).
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for usermanager operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a document-not-found error.
    #[must_use]
    pub fn not_found(collection: impl Into<String>, id: impl Into<String>) -> Self {
        Self::DocumentNotFound {
            collection: collection.into(),
            id: id.into(),
        }
    }

    /// Create a store-unavailable error.
    #[must_use]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }

    /// Create a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Check if this error means the addressed document does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::DocumentNotFound { .. })
    }
}

/// The user-triggered actions of the record list controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Fetch the whole collection.
    Load,
    /// Insert the new-record draft.
    Create,
    /// Submit the edit draft.
    SaveEdit,
    /// Remove a record by identifier.
    Delete,
}

impl Action {
    /// The fixed message shown to the user when this action fails.
    #[must_use]
    pub fn failure_message(self) -> &'static str {
        match self {
            Self::Load => "Unable to load users. Please try again later.",
            Self::Create => "Unable to add user. Please try again.",
            Self::SaveEdit => "Unable to update user. Please try again.",
            Self::Delete => "Unable to delete user. Please try again.",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Load => write!(f, "load"),
            Self::Create => write!(f, "create"),
            Self::SaveEdit => write!(f, "save_edit"),
            Self::Delete => write!(f, "delete"),
        }
    }
}

/// Failure of a controller action.
///
/// Displays the action's fixed user-facing message; the typed cause stays
/// available through [`std::error::Error::source`] for diagnostics.
#[derive(Error, Debug)]
pub enum ActionError {
    /// The action ran and the store (or the reload after it) failed.
    #[error("{}", .action.failure_message())]
    Failed {
        /// The action whose message is shown.
        action: Action,
        /// What actually went wrong.
        #[source]
        source: Error,
    },

    /// The action was refused because another one is still outstanding.
    #[error("{action} rejected: another action is in progress")]
    Rejected {
        /// The action that was refused.
        action: Action,
    },
}

impl ActionError {
    /// The action this error belongs to.
    #[must_use]
    pub fn action(&self) -> Action {
        match self {
            Self::Failed { action, .. } | Self::Rejected { action } => *action,
        }
    }

    /// Check if the action was refused without running.
    #[must_use]
    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected { .. })
    }
}
