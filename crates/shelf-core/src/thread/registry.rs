//! Thread creation, existence checks, listing and detail

use super::model::{ThreadDetail, ThreadListing, ThreadPage};
use crate::comment::{ContentValidator, NewComment};
use crate::directory::{require_active, BookCatalog, MemberGate};
use crate::error::{Result, ShelfError};
use crate::pagination::Cursor;
use crate::store::Storage;
use crate::types::{BookId, MemberId, ThreadId};
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info};

/// Creates threads and answers thread-level queries
#[derive(Clone)]
pub struct ThreadRegistry {
    storage: Arc<dyn Storage>,
    members: Arc<dyn MemberGate>,
    catalog: Arc<dyn BookCatalog>,
    validator: ContentValidator,
    max_page_size: u64,
}

impl ThreadRegistry {
    pub fn new(
        storage: Arc<dyn Storage>,
        members: Arc<dyn MemberGate>,
        catalog: Arc<dyn BookCatalog>,
        validator: ContentValidator,
    ) -> Self {
        Self {
            storage,
            members,
            catalog,
            validator,
            max_page_size: 100,
        }
    }

    /// Cap on the limit of any listing
    pub fn with_max_page_size(mut self, max_page_size: u64) -> Self {
        self.max_page_size = max_page_size.max(1);
        self
    }

    /// Whether a thread exists for the book
    pub fn exists(&self, book: BookId) -> Result<bool> {
        let mut uow = self.storage.begin_read()?;
        Ok(uow.thread_for_book(book)?.is_some())
    }

    /// Create a thread together with its opening comment.
    ///
    /// Both rows are written in one unit of work, so a thread is never
    /// visible without an Active comment.
    pub fn create(&self, book: BookId, member: MemberId, content: &str) -> Result<ThreadId> {
        require_active(self.members.as_ref(), member)?;
        self.validator.validate_content(content)?;

        let now = Utc::now();
        let mut uow = self.storage.begin()?;
        if let Some(existing) = uow.thread_for_book(book)? {
            return Err(ShelfError::Conflict(format!(
                "Book {} already has thread {}",
                book, existing.id
            )));
        }
        let thread = uow.insert_thread(book, now)?;
        let opening = uow.insert_comment(NewComment {
            created_at: now,
            ..NewComment::top_level(thread.id, member, content)
        })?;
        uow.commit()?;

        info!(thread = %thread.id, book = %book, comment = %opening.id, member = %member, "Created thread");
        Ok(thread.id)
    }

    /// Threads that still have an Active comment, newest first, optionally
    /// filtered by a substring of the book title or author
    pub fn list(&self, filter: Option<&str>, cursor: Cursor) -> Result<ThreadPage> {
        let cursor = cursor.clamp(self.max_page_size);
        let filter = filter.map(str::trim).filter(|q| !q.is_empty());
        let books = filter.map(|q| self.catalog.search(q)).transpose()?;

        let (live, total_count) = {
            let mut uow = self.storage.begin_read()?;
            uow.live_threads(books.as_deref(), cursor)?
        };

        let ids: Vec<BookId> = live.iter().map(|entry| entry.thread.book_id).collect();
        let mut summaries = self.catalog.summaries(&ids)?;
        let threads: Vec<ThreadListing> = live
            .into_iter()
            .map(|entry| ThreadListing {
                thread_id: entry.thread.id,
                book_id: entry.thread.book_id,
                book: summaries.remove(&entry.thread.book_id),
                participant_count: entry.participant_count,
                created_at: entry.thread.created_at,
            })
            .collect();
        debug!(filter = ?filter, page = cursor.page(), returned = threads.len(), total_count, "Listed threads");

        Ok(ThreadPage {
            threads,
            total_count,
        })
    }

    /// Thread metadata with participant and Active comment counts
    pub fn detail(&self, thread: ThreadId) -> Result<ThreadDetail> {
        let (thread, stats) = {
            let mut uow = self.storage.begin_read()?;
            let thread = uow
                .get_thread(thread)?
                .ok_or_else(|| ShelfError::NotFound(format!("thread {}", thread)))?;
            let stats = uow.thread_stats(thread.id)?;
            (thread, stats)
        };
        let book = self.catalog.summary(thread.book_id)?;

        Ok(ThreadDetail {
            thread,
            book,
            participant_count: stats.participant_count,
            comment_count: stats.comment_count,
        })
    }
}
