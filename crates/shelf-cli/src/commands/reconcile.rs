//! Reconcile command
//!
//! Run the cleanup sweep once, or repeatedly on an interval.

use super::{print_json, Context};
use anyhow::Result;
use clap::Args;
use shelf_core::{Forum, ReconcileReport};
use std::time::Duration;
use tracing::{error, info};

/// Arguments for the reconcile command
#[derive(Debug, Args)]
pub struct ReconcileArgs {
    /// Keep running, sweeping every `reconcile.interval_secs`
    #[arg(long)]
    pub every: bool,

    /// Override the sweep interval in seconds
    #[arg(long, requires = "every")]
    pub interval: Option<u64>,
}

/// Execute the reconcile command
pub fn execute(ctx: &Context, args: ReconcileArgs) -> Result<()> {
    let (forum, _store) = ctx.open()?;

    if !args.every {
        let report = forum.reconcile()?;
        return print_report(ctx, &report);
    }

    let interval = Duration::from_secs(
        args.interval
            .unwrap_or(forum.config().reconcile.interval_secs)
            .max(1),
    );
    info!(interval_secs = interval.as_secs(), "Starting scheduled reconciliation");
    loop {
        sweep_once(ctx, &forum);
        std::thread::sleep(interval);
    }
}

/// A failed scheduled sweep is retried on the next tick
fn sweep_once(ctx: &Context, forum: &Forum) {
    match forum.reconcile() {
        Ok(report) => {
            if let Err(err) = print_report(ctx, &report) {
                error!(error = %err, "Failed to print reconciliation report");
            }
        }
        Err(err) => error!(error = %err, "Scheduled reconciliation failed"),
    }
}

fn print_report(ctx: &Context, report: &ReconcileReport) -> Result<()> {
    use colored::Colorize;

    if ctx.json {
        return print_json(report);
    }
    if report.is_noop() {
        println!("{} Nothing to clean up", "✓".green());
    } else {
        println!(
            "{} Removed {} empty threads and {} orphaned comments",
            "✓".green(),
            report.threads_removed.to_string().cyan(),
            report.comments_removed.to_string().cyan()
        );
    }
    println!("  Run: {}", report.run_id.to_string().dimmed());
    Ok(())
}
