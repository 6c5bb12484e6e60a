use pretty_assertions::assert_eq;
use shelf_core::{BookId, BookSummary, CommentId, Config, Cursor, ErrorKind, Forum, MemberId};
use shelf_storage::SqliteStore;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

fn forum(temp: &TempDir) -> Forum {
    let store = SqliteStore::open(temp.path().join("shelf.db")).unwrap();
    store.upsert_member(MemberId(7), "first").unwrap();
    store.upsert_member(MemberId(9), "second").unwrap();
    store
        .upsert_book(&BookSummary {
            book_id: BookId(42),
            title: "The Vegetarian".to_string(),
            author: "Han Kang".to_string(),
            publisher: Some("Changbi".to_string()),
            cover: None,
        })
        .unwrap();
    Forum::new(Arc::new(store), Config::default())
}

#[test]
fn test_scenario_on_sqlite() {
    let temp = TempDir::new().unwrap();
    let forum = forum(&temp);

    let thread = forum.create_thread(BookId(42), MemberId(7), "first post").unwrap();
    let reply = forum.add_reply(CommentId(1), MemberId(9), "a reply here").unwrap();
    assert_eq!(reply, CommentId(2));

    let page = forum.list_parent_comments(thread, Cursor::new(0, 5)).unwrap();
    assert_eq!(page.comments.len(), 1);
    assert_eq!(page.comments[0].nickname.as_deref(), Some("first"));
    assert_eq!(page.comments[0].reply_count, Some(1));

    let detail = forum.thread_detail(thread).unwrap();
    assert_eq!(detail.comment_count, 2);
    assert_eq!(detail.book.unwrap().publisher.as_deref(), Some("Changbi"));

    let err = forum.delete_comment(CommentId(1), MemberId(9)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Authorization);

    let outcome = forum.delete_comment(CommentId(1), MemberId(7)).unwrap();
    assert_eq!(outcome.replies_deactivated, 1);
    assert!(outcome.thread_removed);
    assert!(!forum.thread_exists(BookId(42)).unwrap());

    // soft-deleted rows of the removed thread are left for the sweep
    let report = forum.reconcile().unwrap();
    assert_eq!(report.threads_removed, 0);
    assert_eq!(report.comments_removed, 2);
    assert!(forum.reconcile().unwrap().is_noop());
}

#[test]
fn test_pagination_on_sqlite() {
    let temp = TempDir::new().unwrap();
    let forum = forum(&temp);
    let thread = forum.create_thread(BookId(42), MemberId(7), "comment #0").unwrap();
    for i in 1..7 {
        forum
            .add_comment(thread, MemberId(9), &format!("comment #{}", i))
            .unwrap();
    }

    let first = forum.list_parent_comments(thread, Cursor::new(0, 5)).unwrap();
    assert_eq!(first.comments.len(), 5);
    assert!(first.has_more);

    let second = forum.list_parent_comments(thread, Cursor::new(5, 5)).unwrap();
    assert_eq!(second.comments.len(), 2);
    assert!(!second.has_more);
    assert_eq!(second.comments[1].comment.content, "comment #0");
}

#[test]
fn test_withdrawal_on_sqlite() {
    let temp = TempDir::new().unwrap();
    let forum = forum(&temp);
    forum.create_thread(BookId(42), MemberId(7), "first post").unwrap();
    forum.add_reply(CommentId(1), MemberId(9), "a reply here").unwrap();

    let report = forum.withdraw_member(MemberId(7)).unwrap();
    assert_eq!(report.comments_deactivated, 1);
    assert_eq!(report.replies_cascaded, 1);
    let sweep = report.reconcile.unwrap();
    assert_eq!(sweep.threads_removed, 1);
    assert_eq!(sweep.comments_removed, 2);

    let err = forum
        .create_thread(BookId(42), MemberId(7), "coming back")
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Authorization);
}

#[test]
fn test_data_survives_reopen() {
    let temp = TempDir::new().unwrap();
    {
        let forum = forum(&temp);
        forum.create_thread(BookId(42), MemberId(7), "first post").unwrap();
    }
    let forum = forum(&temp);
    assert!(forum.thread_exists(BookId(42)).unwrap());
    let listing = forum.list_threads(Some("vegetarian"), Cursor::new(0, 6)).unwrap();
    assert_eq!(listing.total_count, 1);
}

#[test]
fn test_concurrent_deletes_on_sqlite() {
    let temp = TempDir::new().unwrap();
    let forum = forum(&temp);
    let thread = forum.create_thread(BookId(42), MemberId(7), "first post").unwrap();
    let second = forum.add_comment(thread, MemberId(9), "second post").unwrap();

    let outcomes = std::thread::scope(|s| {
        let a = s.spawn(|| forum.delete_comment(CommentId(1), MemberId(7)));
        let b = s.spawn(|| forum.delete_comment(second, MemberId(9)));
        [a.join().unwrap(), b.join().unwrap()]
    });

    let removed = outcomes
        .iter()
        .filter(|o| o.as_ref().unwrap().thread_removed)
        .count();
    assert_eq!(removed, 1);
    assert!(!forum.thread_exists(BookId(42)).unwrap());
}

#[test]
fn test_cascade_rolls_back_when_thread_delete_fails() {
    let temp = TempDir::new().unwrap();
    let forum = forum(&temp);
    let thread = forum.create_thread(BookId(42), MemberId(7), "first post").unwrap();
    let reply = forum.add_reply(CommentId(1), MemberId(9), "a reply here").unwrap();

    let raw = rusqlite::Connection::open(temp.path().join("shelf.db")).unwrap();
    raw.execute_batch(
        "CREATE TRIGGER refuse_thread_delete BEFORE DELETE ON thread
         BEGIN SELECT RAISE(ABORT, 'thread delete refused'); END;",
    )
    .unwrap();

    let err = forum.delete_comment(CommentId(1), MemberId(7)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Internal);
    assert!(forum.thread_exists(BookId(42)).unwrap());
    let page = forum.list_parent_comments(thread, Cursor::new(0, 5)).unwrap();
    assert_eq!(page.comments.len(), 1);
    assert_eq!(page.comments[0].reply_count, Some(1));
    assert_eq!(forum.list_replies(CommentId(1)).unwrap()[0].comment.id, reply);

    raw.execute_batch("DROP TRIGGER refuse_thread_delete").unwrap();
    let outcome = forum.delete_comment(CommentId(1), MemberId(7)).unwrap();
    assert!(outcome.thread_removed);
    assert_eq!(outcome.replies_deactivated, 1);
}

#[test]
fn test_reconcile_alongside_writers_on_sqlite() {
    let temp = TempDir::new().unwrap();
    let forum = forum(&temp);
    let writing = AtomicBool::new(true);

    let sweeps = std::thread::scope(|s| {
        let sweeper = s.spawn(|| {
            let mut sweeps = 0;
            while writing.load(Ordering::Acquire) {
                forum.reconcile().unwrap();
                sweeps += 1;
            }
            sweeps
        });

        for book in 1..=20 {
            let thread = forum.create_thread(BookId(book), MemberId(7), "first post").unwrap();
            let second = forum.add_comment(thread, MemberId(9), "second post").unwrap();
            if book % 2 == 0 {
                forum.delete_comment(second, MemberId(9)).unwrap();
                let page = forum.list_parent_comments(thread, Cursor::new(0, 5)).unwrap();
                let opening = page.comments[0].comment.id;
                assert!(forum.delete_comment(opening, MemberId(7)).unwrap().thread_removed);
            }
        }
        writing.store(false, Ordering::Release);
        sweeper.join().unwrap()
    });
    assert!(sweeps > 0);

    for book in 1..=20 {
        assert_eq!(forum.thread_exists(BookId(book)).unwrap(), book % 2 == 1);
    }
    let listing = forum.list_threads(None, Cursor::new(0, 100)).unwrap();
    assert_eq!(listing.total_count, 10);
    assert!(listing.threads.iter().all(|t| t.participant_count == 2));

    forum.reconcile().unwrap();
    assert!(forum.reconcile().unwrap().is_noop());
}
