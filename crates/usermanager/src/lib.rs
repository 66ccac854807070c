//! `usermanager` - A user list bound to a remote document collection
//!
//! This library provides the record list controller behind the `usrmgr`
//! binary: a new-user form, an optional in-place edit, and a list of users
//! that is fetched again in full after every successful change.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod cli;
pub mod config;
pub mod controller;
pub mod error;
pub mod logging;
pub mod privacy;
pub mod record;
pub mod store;
pub mod view;

pub use config::Config;
pub use controller::{ControllerState, RecordListController};
pub use error::{Action, ActionError, Error, Result};
pub use logging::init_logging;
pub use privacy::Redactor;
pub use record::{Draft, EditDraft, Field, Record};
pub use store::{DocumentCollection, MemoryCollection, SqliteCollection};
pub use view::ViewState;
