//! Init command
//!
//! Create the shelftalk configuration and database for a directory.

use super::Context;
use anyhow::{Context as _, Result};
use clap::Args;
use shelf_core::Config;
use shelf_storage::SqliteStore;
use std::fs;
use std::path::{Path, PathBuf};

/// Arguments for the init command
#[derive(Debug, Args)]
pub struct InitArgs {
    /// Force overwrite existing configuration
    #[arg(long)]
    pub force: bool,

    /// Directory to initialize (default: current directory)
    #[arg(long)]
    pub path: Option<PathBuf>,
}

/// Execute the init command
pub fn execute(ctx: &Context, args: InitArgs) -> Result<()> {
    use colored::Colorize;

    let project_dir = args
        .path
        .clone()
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));

    println!("Initializing shelftalk in {}...", project_dir.display());

    let shelf_dir = project_dir.join(".shelftalk");
    let config_path = shelf_dir.join("config.toml");
    if config_path.exists() && !args.force {
        eprintln!(
            "{} shelftalk already initialized. Use --force to reinitialize.",
            "⚠".yellow()
        );
        return Ok(());
    }

    fs::create_dir_all(&shelf_dir).context("Failed to create .shelftalk directory")?;
    println!("{} Created .shelftalk/ directory", "✓".green());

    let config = generate_config(&project_dir, ctx.database.clone());
    fs::write(&config_path, config.to_toml()?).context("Failed to write config.toml")?;
    println!("{} Generated config.toml", "✓".green());

    let database = database_path(&config)?;
    SqliteStore::open(&database).context("Failed to create database")?;
    println!("{} Database ready at {}", "✓".green(), database.display());

    println!("\n{}", "Next steps:".bold());
    println!("  1. Register members and books:");
    println!("     {}", "shelftalk member add <id> --nickname <name>".cyan());
    println!(
        "     {}",
        "shelftalk book add <id> --title <title> --author <author>".cyan()
    );
    println!("  2. Start a thread:");
    println!(
        "     {}",
        "shelftalk thread create <book> --member <id> --content <text>".cyan()
    );

    Ok(())
}

fn generate_config(project_dir: &Path, database: Option<PathBuf>) -> Config {
    let mut config = Config::default();
    config.storage.database =
        Some(database.unwrap_or_else(|| project_dir.join(".shelftalk").join("shelftalk.db")));
    config
}

fn database_path(config: &Config) -> Result<PathBuf> {
    config
        .storage
        .database
        .clone()
        .context("Generated configuration has no database path")
}
