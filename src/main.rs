mod cli;
mod config;
mod db;
mod engine;
mod models;
mod sync;
mod utils;

use anyhow::{Context, Result};
use clap::Parser;
use rusqlite::Connection;

use cli::args::{Cli, Commands};
use cli::handlers;
use config::AppConfig;
use db::migrations::run_migrations;
use db::SqliteBackend;
use sync::QadaTracker;

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let config = AppConfig::load().context("Loading config")?;
    let policy = config.policy.exclusion_policy().context("Reading exclusion policy")?;

    // Ensure data directory exists and open DB
    AppConfig::ensure_data_dir()?;
    let db_path = AppConfig::db_path()?;
    let conn = Connection::open(&db_path)
        .with_context(|| format!("Opening database at {:?}", db_path))?;

    // Enable WAL mode for better concurrent access
    conn.execute_batch("PRAGMA journal_mode=WAL;")?;

    // Run migrations on every startup
    run_migrations(&conn)?;

    let mut tracker = QadaTracker::open(SqliteBackend::new(conn), policy)
        .context("Loading progress document")?;
    tracker.subscribe(Box::new(|store| {
        log::debug!(
            "store now has {} range(s), updated {}",
            store.ranges.len(),
            store.updated_at
        );
    }));

    match cli.command {
        // Setup and import work without an existing record
        Some(Commands::Setup { reset }) => {
            handlers::handle_setup(&mut tracker, &config, reset)?;
        }
        Some(Commands::Import { file }) => {
            handlers::handle_import(&mut tracker, &file)?;
        }

        // Everything else needs a record — run setup first if there is none
        Some(cmd) => {
            ensure_setup(&mut tracker, &config)?;
            match cmd {
                Commands::Status => handlers::handle_status(&tracker)?,
                Commands::Pray { prayer, count } => {
                    handlers::handle_pray(&mut tracker, &prayer, count)?;
                }
                Commands::Undo { prayer, count } => {
                    handlers::handle_undo(&mut tracker, &prayer, count)?;
                }
                Commands::Set { prayer, value } => {
                    handlers::handle_set(&mut tracker, &prayer, value)?;
                }
                Commands::Range { action } => {
                    handlers::handle_range(&mut tracker, &action, &config)?;
                }
                Commands::Export { output } => {
                    handlers::handle_export(&tracker, output.as_deref())?;
                }
                Commands::Setup { .. } | Commands::Import { .. } => unreachable!(),
            }
        }

        // No subcommand → dashboard
        None => {
            ensure_setup(&mut tracker, &config)?;
            handlers::handle_status(&tracker)?;
        }
    }

    Ok(())
}

/// Check if setup has been done; if not, run the wizard automatically.
fn ensure_setup<B: db::ProgressBackend>(
    tracker: &mut QadaTracker<B>,
    config: &AppConfig,
) -> Result<()> {
    if !tracker.is_configured() {
        eprintln!("No progress record found. Running setup...");
        eprintln!();
        handlers::handle_setup(tracker, config, false)?;
    }
    Ok(())
}
