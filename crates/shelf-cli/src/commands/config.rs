//! Config command
//!
//! Manage shelftalk configuration.

use super::Context;
use anyhow::Result;
use clap::Subcommand;
use shelf_core::Config;
use std::fs;

/// Config subcommands
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show the effective configuration
    Show,

    /// Reset to default configuration
    Reset {
        /// Force reset without confirmation
        #[arg(long)]
        force: bool,
    },

    /// Validate configuration
    Validate,
}

/// Execute the config command
pub fn execute(ctx: &Context, cmd: ConfigCommand) -> Result<()> {
    match cmd {
        ConfigCommand::Show => show_config(ctx),
        ConfigCommand::Reset { force } => reset_config(ctx, force),
        ConfigCommand::Validate => validate_config(ctx),
    }
}

fn show_config(ctx: &Context) -> Result<()> {
    use colored::Colorize;

    let config = ctx.load_config()?;

    if ctx.json {
        return super::print_json(&config);
    }

    println!("{}", "Configuration:".bold().underline());
    if ctx.config_path.exists() {
        println!("{}", ctx.config_path.display().to_string().dimmed());
    } else {
        println!("{}", "(defaults, no configuration file)".dimmed());
    }
    println!();
    println!("{}", config.to_toml()?);

    Ok(())
}

fn reset_config(ctx: &Context, force: bool) -> Result<()> {
    use colored::Colorize;

    let config_path = &ctx.config_path;

    if !super::confirm("Reset configuration to defaults?", force)? {
        println!("Reset cancelled.");
        return Ok(());
    }

    // Backup existing, keeping the database location
    let mut config = Config::default();
    if config_path.exists() {
        config.storage = ctx.load_config().map(|c| c.storage).unwrap_or_default();
        let backup_path = format!(
            "{}.backup-{}",
            config_path.display(),
            chrono::Local::now().format("%Y%m%d-%H%M%S")
        );
        fs::copy(config_path, &backup_path)?;
        println!("{} Backed up to {}", "✓".green(), backup_path);
    }

    if let Some(parent) = config_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(config_path, config.to_toml()?)?;

    println!("{} Configuration reset to defaults.", "✓".green());

    Ok(())
}

fn validate_config(ctx: &Context) -> Result<()> {
    use colored::Colorize;

    let config_path = &ctx.config_path;

    if !config_path.exists() {
        eprintln!(
            "{} Configuration not found at {}",
            "✗".red(),
            config_path.display()
        );
        return Ok(());
    }

    let config = ctx.load_config()?;
    println!("{} Configuration is valid", "✓".green());

    if config.storage.database.is_none() {
        println!(
            "{} [storage] database not set; the platform data directory is used",
            "⚠".yellow()
        );
    }

    Ok(())
}
