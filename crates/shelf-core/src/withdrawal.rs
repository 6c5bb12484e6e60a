//! Member withdrawal: bulk soft-delete of a member's comments
//!
//! Withdrawal bypasses the per-comment deletion cascade, so it finishes by
//! running the reconciler to remove threads left without Active comments.

use crate::directory::{MemberDirectory, MemberStatus};
use crate::error::{Result, ShelfError};
use crate::reconcile::{ReconcileReport, Reconciler};
use crate::store::Storage;
use crate::types::MemberId;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};

/// What a withdrawal changed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawalReport {
    pub member: MemberId,
    /// The member's own comments and replies that were deactivated
    pub comments_deactivated: usize,
    /// Other members' replies under the member's top-level comments
    pub replies_cascaded: usize,
    /// `None` if the follow-up sweep failed; it is retried by the next run
    pub reconcile: Option<ReconcileReport>,
}

/// Deactivates a member and everything they posted
#[derive(Clone)]
pub struct MemberWithdrawal {
    storage: Arc<dyn Storage>,
    directory: Arc<dyn MemberDirectory>,
    reconciler: Reconciler,
}

impl MemberWithdrawal {
    pub fn new(
        storage: Arc<dyn Storage>,
        directory: Arc<dyn MemberDirectory>,
        reconciler: Reconciler,
    ) -> Self {
        Self {
            storage,
            directory,
            reconciler,
        }
    }

    pub fn withdraw(&self, member: MemberId) -> Result<WithdrawalReport> {
        match self.directory.status(member)? {
            None => return Err(ShelfError::NotFound(format!("member {}", member))),
            Some(MemberStatus::Inactive) => {
                return Err(ShelfError::Conflict(format!(
                    "Member {} is already withdrawn",
                    member
                )))
            }
            Some(MemberStatus::Active) => {}
        }

        // Inactive before the sweep so nothing posted meanwhile survives it
        self.directory.set_status(member, MemberStatus::Inactive)?;
        let (comments_deactivated, replies_cascaded) = match self.deactivate_comments(member) {
            Ok(counts) => counts,
            Err(err) => {
                warn!(member = %member, error = %err, "Withdrawal failed, restoring member");
                if let Err(restore) = self.directory.set_status(member, MemberStatus::Active) {
                    error!(member = %member, error = %restore, "Failed to restore member status");
                }
                return Err(err);
            }
        };

        info!(
            member = %member,
            comments = comments_deactivated,
            replies = replies_cascaded,
            "Member withdrawn"
        );

        let reconcile = self.reconciler.run_logged();
        Ok(WithdrawalReport {
            member,
            comments_deactivated,
            replies_cascaded,
            reconcile,
        })
    }

    /// Deactivate the member's comments and the replies under their
    /// top-level comments in one unit of work
    fn deactivate_comments(&self, member: MemberId) -> Result<(usize, usize)> {
        let mut uow = self.storage.begin()?;
        let changed = uow.deactivate_member_comments(member)?;
        let mut cascaded = 0;
        for parent in changed.iter().filter(|c| !c.is_reply()) {
            cascaded += uow.deactivate_replies(parent.id)?;
        }
        uow.commit()?;
        Ok((changed.len(), cascaded))
    }
}
