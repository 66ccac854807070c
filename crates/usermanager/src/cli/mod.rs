//! Command-line interface for usermanager.
//!
//! This module provides the CLI structure and the interactive shell for the
//! `usrmgr` binary.

mod commands;
pub mod shell;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    AddCommand, ConfigCommand, DeleteCommand, ListCommand, OutputFormat, StatusCommand,
    UpdateCommand,
};

/// usrmgr - Manage the users of a document collection
///
/// Lists, adds, edits and deletes user records. Every change is written to
/// the document store and the list is fetched again afterwards.
#[derive(Debug, Parser)]
#[command(name = "usrmgr")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show every user
    List(ListCommand),

    /// Add a user
    Add(AddCommand),

    /// Update a user's fields
    Update(UpdateCommand),

    /// Delete a user
    Delete(DeleteCommand),

    /// Interactive session on the user list
    Shell,

    /// Show document store status
    Status(StatusCommand),

    /// View or check configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        crate::logging::Verbosity::from_flags(self.verbose, self.quiet)
    }
}
