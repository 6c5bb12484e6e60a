//! Comment command
//!
//! Post, list and delete comments and replies.

use super::{confirm, print_json, Context};
use anyhow::Result;
use clap::Subcommand;
use serde_json::json;
use shelf_core::comment::CommentView;
use shelf_core::{CommentId, Forum, MemberId, ThreadId};

/// Comment subcommands
#[derive(Debug, Subcommand)]
pub enum CommentCommand {
    /// Post a top-level comment
    Add {
        /// Thread ID
        thread: ThreadId,

        /// Posting member
        #[arg(long, short)]
        member: MemberId,

        /// Comment text
        #[arg(long)]
        content: String,
    },

    /// Reply to a top-level comment
    Reply {
        /// Parent comment ID
        parent: CommentId,

        /// Posting member
        #[arg(long, short)]
        member: MemberId,

        /// Reply text
        #[arg(long)]
        content: String,
    },

    /// List top-level comments, newest first
    List {
        /// Thread ID
        thread: ThreadId,

        /// Comments to skip
        #[arg(long)]
        offset: Option<String>,

        /// Comments per page
        #[arg(long)]
        limit: Option<String>,
    },

    /// List replies to a comment, oldest first
    Replies {
        /// Parent comment ID
        parent: CommentId,
    },

    /// Delete your own comment or reply
    Delete {
        /// Comment ID
        id: CommentId,

        /// Deleting member; must be the author
        #[arg(long, short)]
        member: MemberId,

        /// Skip confirmation
        #[arg(long, short)]
        yes: bool,
    },
}

/// Execute the comment command
pub fn execute(ctx: &Context, cmd: CommentCommand) -> Result<()> {
    let (forum, _store) = ctx.open()?;

    match cmd {
        CommentCommand::Add {
            thread,
            member,
            content,
        } => {
            let id = forum.add_comment(thread, member, &content)?;
            report_created(ctx, "comment", id)
        }
        CommentCommand::Reply {
            parent,
            member,
            content,
        } => {
            let id = forum.add_reply(parent, member, &content)?;
            report_created(ctx, "reply", id)
        }
        CommentCommand::List {
            thread,
            offset,
            limit,
        } => list_comments(ctx, &forum, thread, offset.as_deref(), limit.as_deref()),
        CommentCommand::Replies { parent } => list_replies(ctx, &forum, parent),
        CommentCommand::Delete { id, member, yes } => delete_comment(ctx, &forum, id, member, yes),
    }
}

fn report_created(ctx: &Context, what: &str, id: CommentId) -> Result<()> {
    use colored::Colorize;

    if ctx.json {
        return print_json(&json!({ "comment_id": id }));
    }
    println!("{} Posted {} {}", "✓".green(), what, id.to_string().green());
    Ok(())
}

fn print_comment(view: &CommentView, indent: &str) {
    use colored::Colorize;

    let author = view
        .nickname
        .clone()
        .unwrap_or_else(|| format!("member {}", view.comment.author));
    let replies = view
        .reply_count
        .map(|n| format!(", {} replies", n))
        .unwrap_or_default();
    println!(
        "{}{} {} ({}{})",
        indent,
        view.comment.id.to_string().green(),
        author.cyan(),
        view.comment.created_at.format("%Y-%m-%d %H:%M").to_string().dimmed(),
        replies
    );
    println!("{}    {}", indent, view.comment.content);
}

fn list_comments(
    ctx: &Context,
    forum: &Forum,
    thread: ThreadId,
    offset: Option<&str>,
    limit: Option<&str>,
) -> Result<()> {
    use colored::Colorize;

    let cursor = forum.comment_cursor(offset, limit);
    let page = forum.list_parent_comments(thread, cursor)?;

    if ctx.json {
        return print_json(&page);
    }

    if page.comments.is_empty() {
        println!("No comments found.");
        return Ok(());
    }

    for view in &page.comments {
        print_comment(view, "  ");
    }
    if page.has_more {
        println!(
            "\n  {} More comments available. Use --offset {} to continue.",
            "ℹ".blue(),
            cursor.offset + cursor.limit
        );
    }

    Ok(())
}

fn list_replies(ctx: &Context, forum: &Forum, parent: CommentId) -> Result<()> {
    let replies = forum.list_replies(parent)?;

    if ctx.json {
        return print_json(&replies);
    }

    if replies.is_empty() {
        println!("No replies found.");
        return Ok(());
    }
    for view in &replies {
        print_comment(view, "    ");
    }
    Ok(())
}

fn delete_comment(
    ctx: &Context,
    forum: &Forum,
    id: CommentId,
    member: MemberId,
    yes: bool,
) -> Result<()> {
    use colored::Colorize;

    if !confirm(&format!("Delete comment {}?", id), yes)? {
        println!("Delete cancelled.");
        return Ok(());
    }

    let outcome = forum.delete_comment(id, member)?;

    if ctx.json {
        return print_json(&outcome);
    }
    println!("{} {}", "✓".green(), outcome.message());
    if outcome.replies_deactivated > 0 {
        println!("  {} replies removed with it", outcome.replies_deactivated);
    }
    Ok(())
}
