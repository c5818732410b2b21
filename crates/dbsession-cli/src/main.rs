//! dbsession - inspect and maintain session tables
//!
//! Main entry point for the dbsession CLI.

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};

mod commands;

use commands::{delete, init, put, show, status, touch};

// ─────────────────────────────────────────────────────────────────────────────
// CLI Structure
// ─────────────────────────────────────────────────────────────────────────────

/// dbsession - inspect and maintain session tables
#[derive(Parser)]
#[command(name = "dbsession")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output as JSON (for scripting)
    #[arg(long, global = true)]
    pub json: bool,

    /// Config file (default: discovered config.toml)
    #[arg(short, long, global = true, env = "DBSESSION_CONFIG")]
    pub config: Option<PathBuf>,

    /// Database file, overriding the config
    #[arg(long, global = true, env = "DBSESSION_DATABASE")]
    pub database: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the session tables
    Init(init::InitArgs),

    /// Store entries in a session
    Put(put::PutArgs),

    /// Show the entries of a session
    Show(show::ShowArgs),

    /// Show the expiration status of a session
    Status(status::StatusArgs),

    /// Extend a session's expiration
    Touch(touch::TouchArgs),

    /// Delete a session
    Delete(delete::DeleteArgs),
}

// ─────────────────────────────────────────────────────────────────────────────
// Main
// ─────────────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "dbsession=debug,dbsession_config=debug,dbsession_cli=debug,info"
    } else {
        "dbsession=warn,dbsession_cli=info,warn"
    };

    use tracing_subscriber::prelude::*;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr)
                .with_filter(tracing_subscriber::EnvFilter::new(filter)),
        )
        .init();

    let loaded = dbsession_config::load_config(cli.config.as_deref())
        .context("failed to load configuration")?;
    if let Some(source) = &loaded.source {
        tracing::debug!("Loaded config from {}", source.display());
    }

    let mut config = loaded.config;
    if let Some(database) = cli.database {
        config.database.path = Some(database);
    }

    let ctx = commands::Context {
        config,
        json_output: cli.json,
        verbose: cli.verbose,
    };

    match cli.command {
        Commands::Init(args) => init::run(args, &ctx),
        Commands::Put(args) => put::run(args, &ctx),
        Commands::Show(args) => show::run(args, &ctx),
        Commands::Status(args) => status::run(args, &ctx),
        Commands::Touch(args) => touch::run(args, &ctx),
        Commands::Delete(args) => delete::run(args, &ctx),
    }
}
