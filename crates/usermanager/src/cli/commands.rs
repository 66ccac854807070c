//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

use crate::record::Draft;
use crate::view::Format;

/// List command arguments.
#[derive(Debug, Args)]
pub struct ListCommand {
    /// Output format
    #[arg(short, long, value_enum, default_value = "plain")]
    pub format: OutputFormat,
}

/// Add command arguments.
#[derive(Debug, Args)]
pub struct AddCommand {
    /// Display name
    #[arg(short, long, default_value = "")]
    pub name: String,

    /// Email address
    #[arg(short, long, default_value = "")]
    pub email: String,

    /// Age
    #[arg(short, long, default_value = "")]
    pub age: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "plain")]
    pub format: OutputFormat,
}

impl AddCommand {
    /// The draft described by the arguments.
    #[must_use]
    pub fn draft(&self) -> Draft {
        Draft::new(&self.name, &self.email, &self.age)
    }
}

/// Update command arguments.
///
/// Fields that are not given keep their current value.
#[derive(Debug, Args)]
pub struct UpdateCommand {
    /// Identifier of the user to update
    pub id: String,

    /// New display name
    #[arg(short, long)]
    pub name: Option<String>,

    /// New email address
    #[arg(short, long)]
    pub email: Option<String>,

    /// New age
    #[arg(short, long)]
    pub age: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "plain")]
    pub format: OutputFormat,
}

/// Delete command arguments.
#[derive(Debug, Args)]
pub struct DeleteCommand {
    /// Identifier of the user to delete
    pub id: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "plain")]
    pub format: OutputFormat,
}

/// Status command arguments.
#[derive(Debug, Args)]
pub struct StatusCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// Output format for commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Plain text output
    #[default]
    Plain,
    /// Formatted table
    Table,
    /// JSON output
    Json,
}

impl From<OutputFormat> for Format {
    fn from(arg: OutputFormat) -> Self {
        match arg {
            OutputFormat::Plain => Self::Plain,
            OutputFormat::Table => Self::Table,
            OutputFormat::Json => Self::Json,
        }
    }
}
