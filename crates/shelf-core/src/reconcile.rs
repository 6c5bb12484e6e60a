//! Out-of-band repair of thread/comment consistency
//!
//! Two passes, in order:
//! 1. delete threads that have no Active comment;
//! 2. delete comments whose thread no longer exists.
//!
//! Each pass removes rows in bounded batches, one unit of work per batch, so
//! a sweep can be interrupted at any point and simply run again. Running it
//! on consistent data removes nothing.

use crate::error::Result;
use crate::store::Storage;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info};
use uuid::Uuid;

/// Default rows removed per unit of work
pub const DEFAULT_BATCH_SIZE: usize = 500;

/// Rows removed by one sweep
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileReport {
    /// Correlates the log lines of one sweep
    pub run_id: Uuid,
    pub threads_removed: usize,
    pub comments_removed: usize,
}

impl ReconcileReport {
    pub fn is_noop(&self) -> bool {
        self.threads_removed == 0 && self.comments_removed == 0
    }
}

#[derive(Debug, Clone, Copy)]
enum Pass {
    EmptyThreads,
    OrphanComments,
}

impl fmt::Display for Pass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pass::EmptyThreads => write!(f, "empty-threads"),
            Pass::OrphanComments => write!(f, "orphan-comments"),
        }
    }
}

/// Idempotent batch sweep over the store
#[derive(Clone)]
pub struct Reconciler {
    storage: Arc<dyn Storage>,
    batch_size: usize,
}

impl Reconciler {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self {
            storage,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    /// Rows removed per unit of work
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Run both passes
    pub fn run(&self) -> Result<ReconcileReport> {
        let run_id = Uuid::new_v4();
        let threads_removed = self.sweep(run_id, Pass::EmptyThreads)?;
        let comments_removed = self.sweep(run_id, Pass::OrphanComments)?;

        let report = ReconcileReport {
            run_id,
            threads_removed,
            comments_removed,
        };
        info!(
            run = %run_id,
            threads_removed,
            comments_removed,
            "Reconciliation finished"
        );
        Ok(report)
    }

    /// Run both passes, logging instead of returning a failure. A failed
    /// sweep is picked up again by the next run.
    pub fn run_logged(&self) -> Option<ReconcileReport> {
        match self.run() {
            Ok(report) => Some(report),
            Err(err) => {
                error!(error = %err, "Reconciliation failed; will retry on next run");
                None
            }
        }
    }

    fn sweep(&self, run_id: Uuid, pass: Pass) -> Result<usize> {
        let mut total = 0;
        loop {
            let mut uow = self.storage.begin()?;
            let removed = match pass {
                Pass::EmptyThreads => uow.purge_empty_threads(self.batch_size)?,
                Pass::OrphanComments => uow.purge_orphan_comments(self.batch_size)?,
            };
            uow.commit()?;

            total += removed;
            debug!(run = %run_id, pass = %pass, removed, total, "Reconciliation batch committed");
            if removed < self.batch_size {
                return Ok(total);
            }
        }
    }
}
