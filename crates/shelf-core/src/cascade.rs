//! Soft deletion with reply cascade and thread removal
//!
//! ```text
//! Comment:  Active --delete--> Inactive            (terminal)
//! Thread:   Active --last parent deleted--> Removed (row deleted)
//! ```
//!
//! Deleting a top-level comment deactivates its replies and, when no Active
//! top-level comment remains, removes the thread. All of it happens in one
//! unit of work: on any error nothing is written.

use crate::error::{Result, ShelfError};
use crate::store::Storage;
use crate::types::{CommentId, MemberId, ThreadId};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

/// What a deletion changed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteOutcome {
    pub comment: CommentId,
    pub thread: ThreadId,
    /// Replies that went from Active to Inactive with their parent
    pub replies_deactivated: usize,
    /// Whether the owning thread was removed in the same unit of work
    pub thread_removed: bool,
}

impl DeleteOutcome {
    /// Human-readable status for the caller
    pub fn message(&self) -> &'static str {
        if self.thread_removed {
            "Comment deleted; the thread had no remaining comments and was removed"
        } else {
            "Comment deleted"
        }
    }
}

/// Executes comment deletion as a single unit of work
#[derive(Clone)]
pub struct DeletionCascade {
    storage: Arc<dyn Storage>,
}

impl DeletionCascade {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Delete a comment or reply on behalf of its author.
    ///
    /// Deleting an already Inactive comment re-runs the cascade, which is a
    /// no-op on consistent data.
    pub fn delete_comment(&self, comment: CommentId, member: MemberId) -> Result<DeleteOutcome> {
        let mut uow = self.storage.begin()?;

        let target = match uow.get_comment(comment)? {
            Some(target) if target.author == member => target,
            _ => {
                warn!(comment = %comment, member = %member, "Rejected delete by non-author");
                return Err(ShelfError::Authorization(format!(
                    "Only the author can delete comment {}",
                    comment
                )));
            }
        };

        uow.deactivate_comment(target.id)?;

        let mut outcome = DeleteOutcome {
            comment: target.id,
            thread: target.thread_id,
            replies_deactivated: 0,
            thread_removed: false,
        };

        if !target.is_reply() {
            outcome.replies_deactivated = uow.deactivate_replies(target.id)?;
            if uow.count_active_parents(target.thread_id)? == 0 {
                outcome.thread_removed = uow.delete_thread(target.thread_id)?;
            }
        }

        uow.commit()?;

        info!(
            comment = %outcome.comment,
            thread = %outcome.thread,
            replies = outcome.replies_deactivated,
            thread_removed = outcome.thread_removed,
            "Deleted comment"
        );
        Ok(outcome)
    }
}
