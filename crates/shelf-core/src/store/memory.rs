//! In-memory store for tests and embedding
//!
//! A unit of work holds the store lock for its whole lifetime and mutates a
//! private copy of the state; commit swaps the copy in. Units of work are
//! therefore fully serialized, and dropping one leaves the state untouched.

use super::persistence::{Storage, UnitOfWork};
use crate::comment::{Comment, CommentStatus, NewComment, ParentRow};
use crate::directory::{BookCatalog, BookSummary, MemberDirectory, MemberGate, MemberStatus};
use crate::error::{Result, ShelfError};
use crate::pagination::Cursor;
use crate::thread::{LiveThread, Thread, ThreadStats, ThreadStatus};
use crate::types::{BookId, CommentId, MemberId, ThreadId};
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug, Clone)]
struct State {
    threads: BTreeMap<ThreadId, Thread>,
    comments: BTreeMap<CommentId, Comment>,
    next_thread_id: i64,
    next_comment_id: i64,
}

impl Default for State {
    fn default() -> Self {
        Self {
            threads: BTreeMap::new(),
            comments: BTreeMap::new(),
            next_thread_id: 1,
            next_comment_id: 1,
        }
    }
}

#[derive(Debug, Clone)]
struct MemberRecord {
    nickname: String,
    status: MemberStatus,
}

#[derive(Debug, Default)]
struct Directory {
    members: HashMap<MemberId, MemberRecord>,
    books: HashMap<BookId, BookSummary>,
}

/// In-memory thread/comment store that also serves as member directory and
/// book catalog
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
    directory: RwLock<Directory>,
    #[cfg(test)]
    fail_on: Mutex<Option<&'static str>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an active member
    pub fn add_member(&self, member: MemberId, nickname: impl Into<String>) -> Result<()> {
        self.write_directory()?.members.insert(
            member,
            MemberRecord {
                nickname: nickname.into(),
                status: MemberStatus::Active,
            },
        );
        Ok(())
    }

    /// Register a book
    pub fn add_book(&self, summary: BookSummary) -> Result<()> {
        self.write_directory()?.books.insert(summary.book_id, summary);
        Ok(())
    }

    /// Make the named unit-of-work operation fail from now on
    #[cfg(test)]
    pub(crate) fn fail_on(&self, op: &'static str) {
        *self.fail_on.lock().unwrap() = Some(op);
    }

    fn read_directory(&self) -> Result<RwLockReadGuard<'_, Directory>> {
        self.directory
            .read()
            .map_err(|_| ShelfError::internal("member directory lock poisoned"))
    }

    fn write_directory(&self) -> Result<RwLockWriteGuard<'_, Directory>> {
        self.directory
            .write()
            .map_err(|_| ShelfError::internal("member directory lock poisoned"))
    }

    fn lock_state(&self) -> Result<MutexGuard<'_, State>> {
        self.state
            .lock()
            .map_err(|_| ShelfError::internal("memory store lock poisoned"))
    }
}

impl Storage for MemoryStore {
    fn begin(&self) -> Result<Box<dyn UnitOfWork + '_>> {
        let guard = self.lock_state()?;
        let work = guard.clone();
        Ok(Box::new(MemoryUnit {
            guard,
            work,
            #[cfg(test)]
            fail_on: *self.fail_on.lock().unwrap(),
        }))
    }
}

struct MemoryUnit<'a> {
    guard: MutexGuard<'a, State>,
    work: State,
    #[cfg(test)]
    fail_on: Option<&'static str>,
}

impl MemoryUnit<'_> {
    #[cfg(test)]
    fn check(&self, op: &'static str) -> Result<()> {
        if self.fail_on == Some(op) {
            return Err(ShelfError::internal(format!("injected failure in {}", op)));
        }
        Ok(())
    }

    #[cfg(not(test))]
    fn check(&self, _op: &'static str) -> Result<()> {
        Ok(())
    }

    fn active_in_thread(&self, thread: ThreadId) -> impl Iterator<Item = &Comment> {
        self.work
            .comments
            .values()
            .filter(move |c| c.thread_id == thread && c.is_active())
    }

    fn stats(&self, thread: ThreadId) -> ThreadStats {
        let mut authors = BTreeSet::new();
        let mut comment_count = 0;
        for comment in self.active_in_thread(thread) {
            authors.insert(comment.author);
            comment_count += 1;
        }
        ThreadStats {
            participant_count: authors.len() as u64,
            comment_count,
        }
    }
}

impl UnitOfWork for MemoryUnit<'_> {
    fn thread_for_book(&mut self, book: BookId) -> Result<Option<Thread>> {
        Ok(self.work.threads.values().find(|t| t.book_id == book).cloned())
    }

    fn insert_thread(&mut self, book: BookId, created_at: DateTime<Utc>) -> Result<Thread> {
        self.check("insert_thread")?;
        if self.work.threads.values().any(|t| t.book_id == book) {
            return Err(ShelfError::Conflict(format!(
                "A thread already exists for book {}",
                book
            )));
        }
        let id = ThreadId(self.work.next_thread_id);
        self.work.next_thread_id += 1;
        let thread = Thread {
            id,
            book_id: book,
            status: ThreadStatus::Active,
            created_at,
        };
        self.work.threads.insert(id, thread.clone());
        Ok(thread)
    }

    fn get_thread(&mut self, id: ThreadId) -> Result<Option<Thread>> {
        Ok(self.work.threads.get(&id).cloned())
    }

    fn delete_thread(&mut self, id: ThreadId) -> Result<bool> {
        self.check("delete_thread")?;
        Ok(self.work.threads.remove(&id).is_some())
    }

    fn live_threads(
        &mut self,
        books: Option<&[BookId]>,
        cursor: Cursor,
    ) -> Result<(Vec<LiveThread>, u64)> {
        let live: Vec<&Thread> = self
            .work
            .threads
            .values()
            .rev()
            .filter(|t| books.map_or(true, |books| books.contains(&t.book_id)))
            .filter(|t| self.active_in_thread(t.id).next().is_some())
            .collect();
        let total = live.len() as u64;

        let page = cursor
            .apply(live)
            .into_iter()
            .map(|thread| LiveThread {
                thread: thread.clone(),
                participant_count: self.stats(thread.id).participant_count,
            })
            .collect();
        Ok((page, total))
    }

    fn thread_stats(&mut self, id: ThreadId) -> Result<ThreadStats> {
        Ok(self.stats(id))
    }

    fn insert_comment(&mut self, new: NewComment) -> Result<Comment> {
        self.check("insert_comment")?;
        let id = CommentId(self.work.next_comment_id);
        self.work.next_comment_id += 1;
        let comment = new.into_comment(id);
        self.work.comments.insert(id, comment.clone());
        Ok(comment)
    }

    fn get_comment(&mut self, id: CommentId) -> Result<Option<Comment>> {
        Ok(self.work.comments.get(&id).cloned())
    }

    fn deactivate_comment(&mut self, id: CommentId) -> Result<bool> {
        self.check("deactivate_comment")?;
        match self.work.comments.get_mut(&id) {
            Some(comment) if comment.is_active() => {
                comment.status = CommentStatus::Inactive;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn deactivate_replies(&mut self, parent: CommentId) -> Result<usize> {
        self.check("deactivate_replies")?;
        let mut changed = 0;
        for comment in self.work.comments.values_mut() {
            if comment.parent == Some(parent) && comment.is_active() {
                comment.status = CommentStatus::Inactive;
                changed += 1;
            }
        }
        Ok(changed)
    }

    fn deactivate_member_comments(&mut self, member: MemberId) -> Result<Vec<Comment>> {
        self.check("deactivate_member_comments")?;
        let mut changed = Vec::new();
        for comment in self.work.comments.values_mut() {
            if comment.author == member && comment.is_active() {
                comment.status = CommentStatus::Inactive;
                changed.push(comment.clone());
            }
        }
        Ok(changed)
    }

    fn count_active_parents(&mut self, thread: ThreadId) -> Result<u64> {
        self.check("count_active_parents")?;
        Ok(self.active_in_thread(thread).filter(|c| !c.is_reply()).count() as u64)
    }

    fn parent_comments(
        &mut self,
        thread: ThreadId,
        cursor: Cursor,
    ) -> Result<(Vec<ParentRow>, u64)> {
        let mut parents: Vec<&Comment> = self
            .active_in_thread(thread)
            .filter(|c| !c.is_reply())
            .collect();
        parents.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        let total = parents.len() as u64;

        let rows = cursor
            .apply(parents)
            .into_iter()
            .map(|comment| ParentRow {
                reply_count: self
                    .work
                    .comments
                    .values()
                    .filter(|r| r.parent == Some(comment.id) && r.is_active())
                    .count() as u64,
                comment: comment.clone(),
            })
            .collect();
        Ok((rows, total))
    }

    fn replies(&mut self, parent: CommentId) -> Result<Vec<Comment>> {
        let mut replies: Vec<Comment> = self
            .work
            .comments
            .values()
            .filter(|c| c.parent == Some(parent) && c.is_active())
            .cloned()
            .collect();
        replies.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(replies)
    }

    fn purge_empty_threads(&mut self, limit: usize) -> Result<usize> {
        self.check("purge_empty_threads")?;
        let empty: Vec<ThreadId> = self
            .work
            .threads
            .keys()
            .copied()
            .filter(|id| self.active_in_thread(*id).next().is_none())
            .take(limit)
            .collect();
        for id in &empty {
            self.work.threads.remove(id);
        }
        Ok(empty.len())
    }

    fn purge_orphan_comments(&mut self, limit: usize) -> Result<usize> {
        self.check("purge_orphan_comments")?;
        let orphans: Vec<CommentId> = self
            .work
            .comments
            .values()
            .filter(|c| !self.work.threads.contains_key(&c.thread_id))
            .map(|c| c.id)
            .take(limit)
            .collect();
        for id in &orphans {
            self.work.comments.remove(id);
        }
        Ok(orphans.len())
    }

    fn commit(self: Box<Self>) -> Result<()> {
        let MemoryUnit {
            mut guard, work, ..
        } = *self;
        *guard = work;
        Ok(())
    }
}

impl MemberGate for MemoryStore {
    fn status(&self, member: MemberId) -> Result<Option<MemberStatus>> {
        Ok(self.read_directory()?.members.get(&member).map(|m| m.status))
    }

    fn nickname(&self, member: MemberId) -> Result<Option<String>> {
        Ok(self
            .read_directory()?
            .members
            .get(&member)
            .map(|m| m.nickname.clone()))
    }
}

impl MemberDirectory for MemoryStore {
    fn set_status(&self, member: MemberId, status: MemberStatus) -> Result<()> {
        let mut dir = self.write_directory()?;
        let record = dir
            .members
            .get_mut(&member)
            .ok_or_else(|| ShelfError::NotFound(format!("member {}", member)))?;
        record.status = status;
        Ok(())
    }
}

impl BookCatalog for MemoryStore {
    fn summary(&self, book: BookId) -> Result<Option<BookSummary>> {
        Ok(self.read_directory()?.books.get(&book).cloned())
    }

    fn search(&self, query: &str) -> Result<Vec<BookId>> {
        Ok(self
            .read_directory()?
            .books
            .values()
            .filter(|b| b.matches(query))
            .map(|b| b.book_id)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with_thread() -> (MemoryStore, Thread) {
        let store = MemoryStore::new();
        let mut uow = store.begin().unwrap();
        let thread = uow.insert_thread(BookId(42), Utc::now()).unwrap();
        uow.insert_comment(NewComment::top_level(thread.id, MemberId(7), "first post"))
            .unwrap();
        uow.commit().unwrap();
        (store, thread)
    }

    #[test]
    fn test_ids_start_at_one() {
        let (store, thread) = store_with_thread();
        assert_eq!(thread.id, ThreadId(1));
        let mut uow = store.begin().unwrap();
        assert!(uow.get_comment(CommentId(1)).unwrap().is_some());
    }

    #[test]
    fn test_drop_without_commit_rolls_back() {
        let (store, thread) = store_with_thread();
        {
            let mut uow = store.begin().unwrap();
            assert!(uow.delete_thread(thread.id).unwrap());
        }
        let mut uow = store.begin().unwrap();
        assert!(uow.get_thread(thread.id).unwrap().is_some());
    }

    #[test]
    fn test_one_thread_per_book() {
        let (store, _) = store_with_thread();
        let mut uow = store.begin().unwrap();
        let err = uow.insert_thread(BookId(42), Utc::now()).unwrap_err();
        assert!(matches!(err, ShelfError::Conflict(_)));
    }

    #[test]
    fn test_delete_thread_is_idempotent() {
        let (store, thread) = store_with_thread();
        let mut uow = store.begin().unwrap();
        assert!(uow.delete_thread(thread.id).unwrap());
        assert!(!uow.delete_thread(thread.id).unwrap());
    }

    #[test]
    fn test_live_threads_skip_empty() {
        let (store, thread) = store_with_thread();
        let all = Cursor::new(0, 10);
        let mut uow = store.begin().unwrap();
        assert_eq!(uow.live_threads(None, all).unwrap().1, 1);
        uow.deactivate_comment(CommentId(1)).unwrap();
        let (page, total) = uow.live_threads(None, all).unwrap();
        assert!(page.is_empty());
        assert_eq!(total, 0);
        assert!(uow.get_thread(thread.id).unwrap().is_some());
    }

    #[test]
    fn test_live_threads_page_and_book_restriction() {
        let store = MemoryStore::new();
        let mut uow = store.begin().unwrap();
        for book in 1..=5 {
            let thread = uow.insert_thread(BookId(book), Utc::now()).unwrap();
            uow.insert_comment(NewComment::top_level(thread.id, MemberId(7), "first post"))
                .unwrap();
        }

        let (page, total) = uow.live_threads(None, Cursor::new(1, 2)).unwrap();
        assert_eq!(total, 5);
        let books: Vec<_> = page.iter().map(|t| t.thread.book_id).collect();
        assert_eq!(books, vec![BookId(4), BookId(3)]);

        let only = [BookId(2), BookId(5), BookId(99)];
        let (page, total) = uow.live_threads(Some(&only), Cursor::new(0, 10)).unwrap();
        assert_eq!(total, 2);
        assert_eq!(page[0].thread.book_id, BookId(5));

        let (page, total) = uow.live_threads(Some(&[]), Cursor::new(0, 10)).unwrap();
        assert!(page.is_empty());
        assert_eq!(total, 0);
    }

    #[test]
    fn test_poisoned_directory_reports_error() {
        let store = std::sync::Arc::new(MemoryStore::new());
        let poisoner = store.clone();
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.directory.write().unwrap();
            panic!("poison the directory lock");
        })
        .join();

        let err = store.add_member(MemberId(7), "reader").unwrap_err();
        assert!(matches!(err, ShelfError::Internal(_)));
        assert!(store.status(MemberId(7)).is_err());
    }

    #[test]
    fn test_directory() {
        let store = MemoryStore::new();
        store.add_member(MemberId(7), "reader").unwrap();
        assert!(store.is_active(MemberId(7)).unwrap());
        assert!(!store.is_active(MemberId(8)).unwrap());

        store.set_status(MemberId(7), MemberStatus::Inactive).unwrap();
        assert!(!store.is_active(MemberId(7)).unwrap());
        assert_eq!(store.nickname(MemberId(7)).unwrap().as_deref(), Some("reader"));
        assert!(store.set_status(MemberId(8), MemberStatus::Active).is_err());
    }
}
