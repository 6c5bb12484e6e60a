//! Member command
//!
//! Register members and withdraw them.

use super::{confirm, print_json, Context};
use anyhow::Result;
use clap::Subcommand;
use serde_json::json;
use shelf_core::MemberId;

/// Member subcommands
#[derive(Debug, Subcommand)]
pub enum MemberCommand {
    /// Register a member, or rename a known one
    Add {
        /// Member ID
        id: MemberId,

        /// Display nickname
        #[arg(long, short)]
        nickname: String,
    },

    /// Withdraw a member and remove everything they posted
    Withdraw {
        /// Member ID
        id: MemberId,

        /// Skip confirmation
        #[arg(long, short)]
        yes: bool,
    },
}

/// Execute the member command
pub fn execute(ctx: &Context, cmd: MemberCommand) -> Result<()> {
    use colored::Colorize;

    let (forum, store) = ctx.open()?;

    match cmd {
        MemberCommand::Add { id, nickname } => {
            store.upsert_member(id, &nickname)?;
            if ctx.json {
                return print_json(&json!({ "member_id": id, "nickname": nickname }));
            }
            println!("{} Registered member {} ({})", "✓".green(), id, nickname.cyan());
        }
        MemberCommand::Withdraw { id, yes } => {
            if !confirm(
                &format!("Withdraw member {} and delete all of their comments?", id),
                yes,
            )? {
                println!("Withdrawal cancelled.");
                return Ok(());
            }

            let report = forum.withdraw_member(id)?;
            if ctx.json {
                return print_json(&report);
            }
            println!("{} Member {} withdrawn", "✓".green(), id);
            println!("  Comments removed: {}", report.comments_deactivated);
            println!("  Replies cascaded: {}", report.replies_cascaded);
            match &report.reconcile {
                Some(sweep) => println!("  Threads removed: {}", sweep.threads_removed),
                None => eprintln!(
                    "{} Cleanup sweep failed; run '{}' to retry",
                    "⚠".yellow(),
                    "shelftalk reconcile".cyan()
                ),
            }
        }
    }

    Ok(())
}
