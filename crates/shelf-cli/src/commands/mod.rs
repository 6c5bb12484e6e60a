//! CLI commands module
//!
//! This module contains all CLI command implementations.

pub mod book;
pub mod comment;
pub mod config;
pub mod init;
pub mod member;
pub mod reconcile;
pub mod thread;

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use shelf_core::{Config, Forum};
use shelf_storage::SqliteStore;
use std::path::PathBuf;
use std::sync::Arc;

/// Default configuration file, relative to the working directory
pub const DEFAULT_CONFIG_PATH: &str = ".shelftalk/config.toml";

/// shelftalk - discussion threads for books
#[derive(Debug, Parser)]
#[command(name = "shelftalk")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Database file, overriding the configured one
    #[arg(long, global = true, env = "SHELFTALK_DB")]
    pub database: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Initialize shelftalk in the current directory
    Init(init::InitArgs),

    /// Manage configuration
    #[command(subcommand)]
    Config(config::ConfigCommand),

    /// Create and browse book threads
    #[command(subcommand)]
    Thread(thread::ThreadCommand),

    /// Post, list and delete comments and replies
    #[command(subcommand)]
    Comment(comment::CommentCommand),

    /// Manage members
    #[command(subcommand)]
    Member(member::MemberCommand),

    /// Manage the book catalog
    #[command(subcommand)]
    Book(book::BookCommand),

    /// Remove empty threads and orphaned comments
    Reconcile(reconcile::ReconcileArgs),
}

/// Global options shared by every command
#[derive(Debug, Clone)]
pub struct Context {
    pub config_path: PathBuf,
    pub database: Option<PathBuf>,
    pub json: bool,
}

impl Context {
    pub fn load_config(&self) -> Result<Config> {
        Config::load(&self.config_path)
            .with_context(|| format!("Failed to load {}", self.config_path.display()))
    }

    /// Open the database and build the forum over it
    pub fn open(&self) -> Result<(Forum, Arc<SqliteStore>)> {
        let config = self.load_config()?;
        let store = match &self.database {
            Some(path) => SqliteStore::open(path),
            None => SqliteStore::from_config(&config.storage),
        }
        .context("Failed to open database")?;
        let store = Arc::new(store);
        Ok((Forum::new(store.clone(), config), store))
    }
}

/// Print a value as pretty JSON
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Ask for confirmation unless `yes` was given
pub fn confirm(prompt: &str, yes: bool) -> Result<bool> {
    if yes {
        return Ok(true);
    }
    let confirmed = dialoguer::Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()?;
    Ok(confirmed)
}

/// Run the CLI application
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    setup_logging(cli.verbose);

    // Handle color output
    if cli.no_color {
        colored::control::set_override(false);
    }

    let ctx = Context {
        config_path: cli
            .config
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH)),
        database: cli.database,
        json: cli.json,
    };

    // Dispatch to command handler
    match cli.command {
        Commands::Init(args) => init::execute(&ctx, args),
        Commands::Config(cmd) => config::execute(&ctx, cmd),
        Commands::Thread(cmd) => thread::execute(&ctx, cmd),
        Commands::Comment(cmd) => comment::execute(&ctx, cmd),
        Commands::Member(cmd) => member::execute(&ctx, cmd),
        Commands::Book(cmd) => book::execute(&ctx, cmd),
        Commands::Reconcile(args) => reconcile::execute(&ctx, args),
    }
}

fn setup_logging(verbosity: u8) {
    use tracing_subscriber::EnvFilter;

    let filter = match verbosity {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
