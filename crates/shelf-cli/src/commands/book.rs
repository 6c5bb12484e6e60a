//! Book command
//!
//! Maintain the local book catalog used for thread listings.

use super::{print_json, Context};
use anyhow::Result;
use clap::Subcommand;
use shelf_core::{BookCatalog, BookId, BookSummary};

/// Book subcommands
#[derive(Debug, Subcommand)]
pub enum BookCommand {
    /// Add a book or replace its metadata
    Add {
        /// Book ID
        id: BookId,

        #[arg(long)]
        title: String,

        #[arg(long)]
        author: String,

        #[arg(long)]
        publisher: Option<String>,

        /// Cover image URL
        #[arg(long)]
        cover: Option<String>,
    },

    /// Show a book
    Show {
        /// Book ID
        id: BookId,
    },
}

/// Execute the book command
pub fn execute(ctx: &Context, cmd: BookCommand) -> Result<()> {
    use colored::Colorize;

    let (_forum, store) = ctx.open()?;

    match cmd {
        BookCommand::Add {
            id,
            title,
            author,
            publisher,
            cover,
        } => {
            let summary = BookSummary {
                book_id: id,
                title,
                author,
                publisher,
                cover,
            };
            store.upsert_book(&summary)?;
            if ctx.json {
                return print_json(&summary);
            }
            println!(
                "{} Saved book {}: {} by {}",
                "✓".green(),
                id,
                summary.title.cyan(),
                summary.author
            );
        }
        BookCommand::Show { id } => {
            let summary = store
                .summary(id)?
                .ok_or_else(|| anyhow::anyhow!("Book {} not found", id))?;
            if ctx.json {
                return print_json(&summary);
            }
            println!("  ID: {}", summary.book_id.to_string().green());
            println!("  Title: {}", summary.title);
            println!("  Author: {}", summary.author);
            if let Some(publisher) = &summary.publisher {
                println!("  Publisher: {}", publisher);
            }
            if let Some(cover) = &summary.cover {
                println!("  Cover: {}", cover.dimmed());
            }
        }
    }

    Ok(())
}
