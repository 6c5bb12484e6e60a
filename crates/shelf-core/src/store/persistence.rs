//! Storage traits and abstractions

use crate::comment::{Comment, NewComment, ParentRow};
use crate::error::Result;
use crate::pagination::Cursor;
use crate::thread::{LiveThread, Thread, ThreadStats};
use crate::types::{BookId, CommentId, MemberId, ThreadId};
use chrono::{DateTime, Utc};

/// A store of threads and comments that hands out units of work
pub trait Storage: Send + Sync {
    /// Begin a unit of work. Dropping it without [`UnitOfWork::commit`]
    /// discards every change made through it.
    fn begin(&self) -> Result<Box<dyn UnitOfWork + '_>>;

    /// Begin a unit of work that only reads. Stores that distinguish read
    /// transactions override this so readers do not block writers.
    fn begin_read(&self) -> Result<Box<dyn UnitOfWork + '_>> {
        self.begin()
    }
}

/// One atomic, isolated unit of work against the store.
///
/// Implementations serialize units of work against each other, so a read
/// followed by a write inside one unit sees no interleaved commits.
pub trait UnitOfWork {
    /// Thread bound to a book, if any
    fn thread_for_book(&mut self, book: BookId) -> Result<Option<Thread>>;

    /// Insert an Active thread for a book
    fn insert_thread(&mut self, book: BookId, created_at: DateTime<Utc>) -> Result<Thread>;

    fn get_thread(&mut self, id: ThreadId) -> Result<Option<Thread>>;

    /// Delete a thread row. Returns `false` if it was already gone.
    fn delete_thread(&mut self, id: ThreadId) -> Result<bool>;

    /// One page of threads with at least one Active comment, newest id
    /// first, with the total before paging. `books` restricts the result to
    /// threads of those books.
    fn live_threads(
        &mut self,
        books: Option<&[BookId]>,
        cursor: Cursor,
    ) -> Result<(Vec<LiveThread>, u64)>;

    /// Participant and Active comment counts for a thread
    fn thread_stats(&mut self, id: ThreadId) -> Result<ThreadStats>;

    fn insert_comment(&mut self, new: NewComment) -> Result<Comment>;

    fn get_comment(&mut self, id: CommentId) -> Result<Option<Comment>>;

    /// Mark a comment Inactive. Returns `false` if it was not Active.
    fn deactivate_comment(&mut self, id: CommentId) -> Result<bool>;

    /// Mark every Active reply of `parent` Inactive, returning how many changed
    fn deactivate_replies(&mut self, parent: CommentId) -> Result<usize>;

    /// Mark every Active comment by `member` Inactive, returning the
    /// comments that changed
    fn deactivate_member_comments(&mut self, member: MemberId) -> Result<Vec<Comment>>;

    /// Active top-level comments in a thread
    fn count_active_parents(&mut self, thread: ThreadId) -> Result<u64>;

    /// Active top-level comments, newest first, with the total before paging
    fn parent_comments(&mut self, thread: ThreadId, cursor: Cursor) -> Result<(Vec<ParentRow>, u64)>;

    /// Active replies of a comment, oldest first
    fn replies(&mut self, parent: CommentId) -> Result<Vec<Comment>>;

    /// Delete up to `limit` threads that have no Active comment
    fn purge_empty_threads(&mut self, limit: usize) -> Result<usize>;

    /// Delete up to `limit` comments whose thread no longer exists
    fn purge_orphan_comments(&mut self, limit: usize) -> Result<usize>;

    /// Make every change of this unit durable and visible
    fn commit(self: Box<Self>) -> Result<()>;
}
