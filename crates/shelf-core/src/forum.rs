//! Single entry point wiring the discussion components to one store

use crate::cascade::{DeleteOutcome, DeletionCascade};
use crate::comment::{CommentPage, CommentStore, CommentView, ContentValidator};
use crate::config::Config;
use crate::directory::{BookCatalog, MemberDirectory, MemberGate};
use crate::error::Result;
use crate::pagination::Cursor;
use crate::reconcile::{ReconcileReport, Reconciler};
use crate::store::Storage;
use crate::thread::{ThreadDetail, ThreadPage, ThreadRegistry};
use crate::types::{BookId, CommentId, MemberId, ThreadId};
use crate::withdrawal::{MemberWithdrawal, WithdrawalReport};
use std::sync::Arc;

/// Threaded discussion over books
///
/// Cheap to clone; every component shares the same store handles.
#[derive(Clone)]
pub struct Forum {
    threads: ThreadRegistry,
    comments: CommentStore,
    cascade: DeletionCascade,
    reconciler: Reconciler,
    withdrawal: MemberWithdrawal,
    config: Config,
}

impl Forum {
    /// Build over a store that is also the member directory and book catalog
    pub fn new<S>(store: Arc<S>, config: Config) -> Self
    where
        S: Storage + MemberDirectory + BookCatalog + 'static,
    {
        Self::with_parts(store.clone(), store.clone(), store.clone(), store, config)
    }

    /// Build from separately provided collaborators
    pub fn with_parts(
        storage: Arc<dyn Storage>,
        members: Arc<dyn MemberGate>,
        directory: Arc<dyn MemberDirectory>,
        catalog: Arc<dyn BookCatalog>,
        config: Config,
    ) -> Self {
        let validator = ContentValidator::from_config(&config.content);
        let max_page_size = config.pagination.max_page_size;

        let threads = ThreadRegistry::new(storage.clone(), members.clone(), catalog, validator)
            .with_max_page_size(max_page_size);
        let comments =
            CommentStore::new(storage.clone(), members, validator).with_max_page_size(max_page_size);
        let cascade = DeletionCascade::new(storage.clone());
        let reconciler =
            Reconciler::new(storage.clone()).with_batch_size(config.reconcile.batch_size);
        let withdrawal = MemberWithdrawal::new(storage, directory, reconciler.clone());

        Self {
            threads,
            comments,
            cascade,
            reconciler,
            withdrawal,
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Thread listing cursor from raw page/limit values, with the limit
    /// capped at `max_page_size` before the page offset is computed
    pub fn thread_cursor(&self, page: Option<&str>, limit: Option<&str>) -> Cursor {
        let pagination = &self.config.pagination;
        let requested = Cursor::parse_page(page, limit, pagination.thread_page_size);
        Cursor::from_page(requested.page(), requested.limit.min(pagination.max_page_size))
    }

    /// Parent comment cursor from raw offset/limit values, capped at
    /// `max_page_size`
    pub fn comment_cursor(&self, offset: Option<&str>, limit: Option<&str>) -> Cursor {
        let pagination = &self.config.pagination;
        Cursor::parse(offset, limit, pagination.comment_page_size).clamp(pagination.max_page_size)
    }

    pub fn thread_exists(&self, book: BookId) -> Result<bool> {
        self.threads.exists(book)
    }

    pub fn create_thread(&self, book: BookId, member: MemberId, content: &str) -> Result<ThreadId> {
        self.threads.create(book, member, content)
    }

    pub fn list_threads(&self, filter: Option<&str>, cursor: Cursor) -> Result<ThreadPage> {
        self.threads.list(filter, cursor)
    }

    pub fn thread_detail(&self, thread: ThreadId) -> Result<ThreadDetail> {
        self.threads.detail(thread)
    }

    pub fn list_parent_comments(&self, thread: ThreadId, cursor: Cursor) -> Result<CommentPage> {
        self.comments.list_parent_comments(thread, cursor)
    }

    pub fn list_replies(&self, parent: CommentId) -> Result<Vec<CommentView>> {
        self.comments.list_replies(parent)
    }

    pub fn add_comment(&self, thread: ThreadId, member: MemberId, content: &str) -> Result<CommentId> {
        self.comments.add_comment(thread, member, content)
    }

    pub fn add_reply(&self, parent: CommentId, member: MemberId, content: &str) -> Result<CommentId> {
        self.comments.add_reply(parent, member, content)
    }

    pub fn delete_comment(&self, comment: CommentId, member: MemberId) -> Result<DeleteOutcome> {
        self.cascade.delete_comment(comment, member)
    }

    pub fn reconcile(&self) -> Result<ReconcileReport> {
        self.reconciler.run()
    }

    pub fn withdraw_member(&self, member: MemberId) -> Result<WithdrawalReport> {
        self.withdrawal.withdraw(member)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ContentConfig;
    use crate::error::ErrorKind;
    use crate::store::MemoryStore;

    #[test]
    fn test_config_flows_into_components() {
        let store = Arc::new(MemoryStore::new());
        store.add_member(MemberId(1), "reader").unwrap();
        let mut config = Config::default();
        config.content = ContentConfig {
            min_length: 2,
            max_length: 5,
        };
        config.pagination.comment_page_size = 3;
        let forum = Forum::new(store, config);

        let thread = forum.create_thread(BookId(1), MemberId(1), "hey").unwrap();
        let err = forum.add_comment(thread, MemberId(1), "too long").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let cursor = forum.comment_cursor(None, Some("abc"));
        assert_eq!(cursor, Cursor::new(0, 3));
        assert_eq!(forum.thread_cursor(Some("2"), None), Cursor::new(6, 6));
    }

    #[test]
    fn test_cursors_respect_max_page_size() {
        let store = Arc::new(MemoryStore::new());
        store.add_member(MemberId(1), "reader").unwrap();
        let mut config = Config::default();
        config.pagination.max_page_size = 2;
        let forum = Forum::new(store, config);

        let cursor = forum.comment_cursor(Some("4"), Some("3"));
        assert_eq!(cursor, Cursor::new(4, 2));
        assert_eq!(forum.thread_cursor(Some("3"), Some("10")), Cursor::new(4, 2));
        assert_eq!(forum.thread_cursor(None, None), Cursor::new(0, 2));

        let thread = forum.create_thread(BookId(1), MemberId(1), "first post").unwrap();
        for n in 2..=5 {
            forum
                .add_comment(thread, MemberId(1), &format!("comment number {}", n))
                .unwrap();
        }
        let cursor = forum.comment_cursor(None, Some("3"));
        let page = forum.list_parent_comments(thread, cursor).unwrap();
        assert_eq!(page.comments.len(), 2);
        assert!(page.has_more);
        let next = forum.comment_cursor(Some(&(cursor.offset + cursor.limit).to_string()), Some("3"));
        let page = forum.list_parent_comments(thread, next).unwrap();
        let ids: Vec<_> = page.comments.iter().map(|v| v.comment.id).collect();
        assert_eq!(ids, vec![CommentId(3), CommentId(2)]);
    }
}
