//! Posting and reading comments and replies

use super::model::{Comment, CommentPage, CommentView, NewComment};
use super::validator::ContentValidator;
use crate::directory::{require_active, MemberGate};
use crate::error::{Result, ShelfError};
use crate::pagination::Cursor;
use crate::store::Storage;
use crate::types::{CommentId, MemberId, ThreadId};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Creates and queries top-level comments and their replies
#[derive(Clone)]
pub struct CommentStore {
    storage: Arc<dyn Storage>,
    members: Arc<dyn MemberGate>,
    validator: ContentValidator,
    max_page_size: u64,
}

impl CommentStore {
    pub fn new(
        storage: Arc<dyn Storage>,
        members: Arc<dyn MemberGate>,
        validator: ContentValidator,
    ) -> Self {
        Self {
            storage,
            members,
            validator,
            max_page_size: 100,
        }
    }

    /// Cap on the limit of any listing
    pub fn with_max_page_size(mut self, max_page_size: u64) -> Self {
        self.max_page_size = max_page_size.max(1);
        self
    }

    /// Post a top-level comment into an existing thread
    pub fn add_comment(&self, thread: ThreadId, member: MemberId, content: &str) -> Result<CommentId> {
        require_active(self.members.as_ref(), member)?;
        self.validator.validate_content(content)?;

        let mut uow = self.storage.begin()?;
        if uow.get_thread(thread)?.is_none() {
            return Err(ShelfError::NotFound(format!("thread {}", thread)));
        }
        let comment = uow.insert_comment(NewComment::top_level(thread, member, content))?;
        uow.commit()?;

        info!(thread = %thread, comment = %comment.id, member = %member, "Added comment");
        Ok(comment.id)
    }

    /// Reply to a top-level comment. The thread is taken from the parent.
    pub fn add_reply(&self, parent: CommentId, member: MemberId, content: &str) -> Result<CommentId> {
        require_active(self.members.as_ref(), member)?;
        self.validator.validate_content(content)?;

        let mut uow = self.storage.begin()?;
        let parent_comment = uow
            .get_comment(parent)?
            .filter(Comment::is_active)
            .ok_or_else(|| ShelfError::NotFound(format!("parent comment {}", parent)))?;
        if parent_comment.is_reply() {
            return Err(ShelfError::Validation(format!(
                "Comment {} is a reply and cannot be replied to",
                parent
            )));
        }
        let thread = parent_comment.thread_id;
        if uow.get_thread(thread)?.is_none() {
            return Err(ShelfError::NotFound(format!("thread {}", thread)));
        }
        let reply = uow.insert_comment(NewComment::reply(thread, parent, member, content))?;
        uow.commit()?;

        info!(thread = %thread, parent = %parent, reply = %reply.id, member = %member, "Added reply");
        Ok(reply.id)
    }

    /// Active top-level comments, newest first, each with its reply count
    pub fn list_parent_comments(&self, thread: ThreadId, cursor: Cursor) -> Result<CommentPage> {
        let cursor = cursor.clamp(self.max_page_size);
        let (rows, total) = {
            let mut uow = self.storage.begin_read()?;
            uow.parent_comments(thread, cursor)?
        };
        debug!(thread = %thread, offset = cursor.offset, limit = cursor.limit, total, "Listed parent comments");

        let nicknames = self.nicknames(rows.iter().map(|r| r.comment.author))?;
        let comments = rows
            .into_iter()
            .map(|row| CommentView {
                nickname: nicknames.get(&row.comment.author).cloned().flatten(),
                comment: row.comment,
                reply_count: Some(row.reply_count),
            })
            .collect();

        Ok(CommentPage {
            comments,
            has_more: cursor.has_more(total),
        })
    }

    /// Active replies of a comment, oldest first
    pub fn list_replies(&self, parent: CommentId) -> Result<Vec<CommentView>> {
        let replies = {
            let mut uow = self.storage.begin_read()?;
            uow.replies(parent)?
        };
        debug!(parent = %parent, count = replies.len(), "Listed replies");

        let nicknames = self.nicknames(replies.iter().map(|r| r.author))?;
        Ok(replies
            .into_iter()
            .map(|comment| CommentView {
                nickname: nicknames.get(&comment.author).cloned().flatten(),
                comment,
                reply_count: None,
            })
            .collect())
    }

    fn nicknames(
        &self,
        authors: impl Iterator<Item = MemberId>,
    ) -> Result<HashMap<MemberId, Option<String>>> {
        let mut nicknames = HashMap::new();
        for author in authors {
            if !nicknames.contains_key(&author) {
                nicknames.insert(author, self.members.nickname(author)?);
            }
        }
        Ok(nicknames)
    }
}
