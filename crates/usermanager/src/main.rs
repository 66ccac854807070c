//! `usrmgr` - CLI for usermanager
//!
//! This binary lists, adds, updates and deletes users in the configured
//! document collection, and offers an interactive shell over the same
//! record list controller.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::io;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;

use usermanager::cli::{
    shell, AddCommand, Cli, Command, ConfigCommand, DeleteCommand, ListCommand, StatusCommand,
    UpdateCommand,
};
use usermanager::config::StoreBackend;
use usermanager::controller::ActionResult;
use usermanager::record::Field;
use usermanager::store::{self, DocumentCollection};
use usermanager::view::{self, Format};
use usermanager::{init_logging, Config, RecordListController, SqliteCollection};

type Controller = RecordListController<Box<dyn DocumentCollection>>;

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    // Load configuration
    let config = Config::load_from(cli.config.clone()).context("failed to load configuration")?;

    // The controller is single-threaded; one current-thread runtime drives it.
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    match cli.command {
        Command::List(cmd) => runtime.block_on(handle_list(&config, &cmd)),
        Command::Add(cmd) => runtime.block_on(handle_add(&config, &cmd)),
        Command::Update(cmd) => runtime.block_on(handle_update(&config, &cmd)),
        Command::Delete(cmd) => runtime.block_on(handle_delete(&config, &cmd)),
        Command::Shell => runtime.block_on(handle_shell(&config)),
        Command::Status(cmd) => handle_status(&config, &cmd),
        Command::Config(cmd) => handle_config(&config, cmd),
    }
}

fn controller(config: &Config) -> anyhow::Result<Controller> {
    let store = store::open(config).with_context(|| {
        format!(
            "failed to open {} collection '{}'",
            config.store.backend, config.store.collection
        )
    })?;
    Ok(RecordListController::from_config(store, config))
}

/// Print the screen and map the action outcome to an exit code.
fn finish(controller: &Controller, format: Format, outcome: ActionResult) -> anyhow::Result<ExitCode> {
    println!("{}", view::render(&controller.snapshot(), format)?);
    Ok(if outcome.is_ok() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

async fn handle_list(config: &Config, cmd: &ListCommand) -> anyhow::Result<ExitCode> {
    let controller = controller(config)?;
    let outcome = controller.mount().await;
    finish(&controller, cmd.format.into(), outcome)
}

async fn handle_add(config: &Config, cmd: &AddCommand) -> anyhow::Result<ExitCode> {
    let controller = controller(config)?;
    // A failed initial load only affects the list shown; the insert still runs.
    let _ = controller.mount().await;
    controller.set_new_draft(cmd.draft());
    let outcome = controller.create().await;
    finish(&controller, cmd.format.into(), outcome)
}

async fn handle_update(config: &Config, cmd: &UpdateCommand) -> anyhow::Result<ExitCode> {
    let controller = controller(config)?;
    let loaded = controller.mount().await;
    if loaded.is_err() {
        return finish(&controller, cmd.format.into(), loaded);
    }

    if !controller.begin_edit_id(&cmd.id) {
        eprintln!("No user with id '{}'", cmd.id);
        return Ok(ExitCode::FAILURE);
    }

    let changes = [
        (Field::Name, &cmd.name),
        (Field::Email, &cmd.email),
        (Field::Age, &cmd.age),
    ];
    for (field, value) in changes {
        if let Some(value) = value {
            controller.set_edit_field(field, value.clone());
        }
    }

    let outcome = controller.save_edit(&cmd.id).await;
    finish(&controller, cmd.format.into(), outcome)
}

async fn handle_delete(config: &Config, cmd: &DeleteCommand) -> anyhow::Result<ExitCode> {
    let controller = controller(config)?;
    let _ = controller.mount().await;
    let outcome = controller.delete(&cmd.id).await;
    finish(&controller, cmd.format.into(), outcome)
}

async fn handle_shell(config: &Config) -> anyhow::Result<ExitCode> {
    let controller = controller(config)?;
    let stdin = io::stdin();
    shell::run(&controller, stdin.lock(), io::stdout()).await?;
    Ok(ExitCode::SUCCESS)
}

fn handle_status(config: &Config, cmd: &StatusCommand) -> anyhow::Result<ExitCode> {
    let stats = match config.store.backend {
        StoreBackend::Sqlite => {
            let store = SqliteCollection::open(config.database_path(), &config.store.collection)?;
            Some(store.stats()?)
        }
        StoreBackend::Memory => None,
    };

    if cmd.json {
        let status = serde_json::json!({
            "backend": config.store.backend,
            "collection": config.store.collection,
            "database_path": config.database_path(),
            "total_documents": stats.as_ref().map(|s| s.total_documents),
            "last_write": stats.as_ref().and_then(|s| s.last_write),
            "db_size_bytes": stats.as_ref().map(|s| s.db_size_bytes),
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(ExitCode::SUCCESS);
    }

    println!("usrmgr status");
    println!("-------------");
    println!("Backend:       {}", config.store.backend);
    println!("Collection:    {}", config.store.collection);
    match stats {
        Some(stats) => {
            println!("Database:      {}", config.database_path().display());
            println!("Users:         {}", stats.total_documents);
            match stats.last_write {
                Some(at) => println!("Last write:    {}", at.to_rfc3339()),
                None => println!("Last write:    never"),
            }
            println!("Size:          {} bytes", stats.db_size_bytes);
        }
        None => println!("Database:      (in memory, cleared on exit)"),
    }
    Ok(ExitCode::SUCCESS)
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> anyhow::Result<ExitCode> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Store]");
                println!("  Backend:            {}", config.store.backend);
                println!("  Database path:      {}", config.database_path().display());
                println!("  Collection:         {}", config.store.collection);
                println!("  Latency (ms):       {}", config.store.latency_ms);
                println!();
                println!("[Controller]");
                println!("  Single flight:      {}", config.controller.single_flight);
                println!();
                println!("[Logging]");
                println!(
                    "  Redact personal:    {}",
                    config.logging.redact_personal_data
                );
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            if let Err(e) = Config::load_from(Some(path)) {
                println!("Configuration error: {e}");
                return Ok(ExitCode::FAILURE);
            }
            println!("Configuration is valid.");
        }
    }
    Ok(ExitCode::SUCCESS)
}
