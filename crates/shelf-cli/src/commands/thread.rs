//! Thread command
//!
//! Create and browse book threads.

use super::{print_json, Context};
use anyhow::Result;
use clap::Subcommand;
use serde_json::json;
use shelf_core::thread::ThreadListing;
use shelf_core::{BookId, Forum, MemberId, ThreadId};

/// Thread subcommands
#[derive(Debug, Subcommand)]
pub enum ThreadCommand {
    /// Check whether a book already has a thread
    Exists {
        /// Book ID
        book: BookId,
    },

    /// Create a thread with its opening comment
    Create {
        /// Book ID
        book: BookId,

        /// Posting member
        #[arg(long, short)]
        member: MemberId,

        /// Opening comment
        #[arg(long)]
        content: String,
    },

    /// List threads that still have comments, newest first
    List {
        /// Filter by book title or author
        #[arg(long, short)]
        query: Option<String>,

        /// Page number, starting at 1
        #[arg(long)]
        page: Option<String>,

        /// Threads per page
        #[arg(long)]
        limit: Option<String>,
    },

    /// Show thread details
    Show {
        /// Thread ID
        id: ThreadId,
    },
}

/// Execute the thread command
pub fn execute(ctx: &Context, cmd: ThreadCommand) -> Result<()> {
    let (forum, _store) = ctx.open()?;

    match cmd {
        ThreadCommand::Exists { book } => thread_exists(ctx, &forum, book),
        ThreadCommand::Create {
            book,
            member,
            content,
        } => create_thread(ctx, &forum, book, member, &content),
        ThreadCommand::List { query, page, limit } => {
            list_threads(ctx, &forum, query.as_deref(), page.as_deref(), limit.as_deref())
        }
        ThreadCommand::Show { id } => show_thread(ctx, &forum, id),
    }
}

fn thread_exists(ctx: &Context, forum: &Forum, book: BookId) -> Result<()> {
    let exists = forum.thread_exists(book)?;
    if ctx.json {
        return print_json(&json!({ "book_id": book, "exists": exists }));
    }
    println!("{}", exists);
    Ok(())
}

fn create_thread(
    ctx: &Context,
    forum: &Forum,
    book: BookId,
    member: MemberId,
    content: &str,
) -> Result<()> {
    use colored::Colorize;

    let thread = forum.create_thread(book, member, content)?;
    if ctx.json {
        return print_json(&json!({ "thread_id": thread }));
    }
    println!(
        "{} Created thread {} for book {}",
        "✓".green(),
        thread.to_string().green(),
        book
    );
    Ok(())
}

fn list_threads(
    ctx: &Context,
    forum: &Forum,
    query: Option<&str>,
    page: Option<&str>,
    limit: Option<&str>,
) -> Result<()> {
    use colored::Colorize;

    let cursor = forum.thread_cursor(page, limit);
    let result = forum.list_threads(query, cursor)?;

    if ctx.json {
        return print_json(&result);
    }

    if result.threads.is_empty() {
        println!("No threads found.");
        return Ok(());
    }

    println!("{}", "Threads:".bold().underline());
    println!();
    for listing in &result.threads {
        println!(
            "  {} {} ({} participants, {})",
            listing.thread_id.to_string().green(),
            book_label(listing),
            listing.participant_count.to_string().cyan(),
            listing.created_at.format("%Y-%m-%d %H:%M").to_string().dimmed()
        );
    }
    println!(
        "\n  {} Page {} of {} threads.",
        "ℹ".blue(),
        cursor.page(),
        result.total_count
    );

    Ok(())
}

fn book_label(listing: &ThreadListing) -> String {
    match &listing.book {
        Some(book) => format!("{} by {}", book.title, book.author),
        None => format!("book {}", listing.book_id),
    }
}

fn show_thread(ctx: &Context, forum: &Forum, id: ThreadId) -> Result<()> {
    use colored::Colorize;

    let detail = forum.thread_detail(id)?;

    if ctx.json {
        return print_json(&detail);
    }

    println!("{}", "Thread Details".bold().underline());
    println!();
    println!("  ID: {}", detail.thread.id.to_string().green());
    println!("  Book: {}", detail.thread.book_id);
    if let Some(book) = &detail.book {
        println!("  Title: {}", book.title);
        println!("  Author: {}", book.author);
        if let Some(publisher) = &book.publisher {
            println!("  Publisher: {}", publisher);
        }
    }
    println!("  Participants: {}", detail.participant_count);
    println!("  Comments: {}", detail.comment_count);
    println!(
        "  Created: {}",
        detail.thread.created_at.format("%Y-%m-%d %H:%M:%S")
    );

    Ok(())
}
