//! SQLite storage for threads, comments, members and books

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use shelf_core::comment::{Comment, CommentStatus, NewComment, ParentRow};
use shelf_core::config::StorageConfig;
use shelf_core::directory::{BookCatalog, BookSummary, MemberDirectory, MemberGate, MemberStatus};
use shelf_core::error::{Result, ShelfError};
use shelf_core::pagination::Cursor;
use shelf_core::store::{Storage, UnitOfWork};
use shelf_core::thread::{LiveThread, Thread, ThreadStats, ThreadStatus};
use shelf_core::types::{BookId, CommentId, MemberId, ThreadId};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Schema version recorded in `PRAGMA user_version`
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

const DATABASE_FILE: &str = "shelftalk.db";

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS member (
        id INTEGER PRIMARY KEY,
        nickname TEXT NOT NULL,
        status TEXT NOT NULL DEFAULT 'active'
    );
    CREATE TABLE IF NOT EXISTS book (
        id INTEGER PRIMARY KEY,
        title TEXT NOT NULL,
        author TEXT NOT NULL,
        publisher TEXT,
        cover TEXT
    );
    CREATE TABLE IF NOT EXISTS thread (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        book_id INTEGER NOT NULL UNIQUE,
        created_at TEXT NOT NULL
    );
    CREATE TABLE IF NOT EXISTS thread_comment (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        thread_id INTEGER NOT NULL,
        member_id INTEGER NOT NULL,
        parent_id INTEGER,
        content TEXT NOT NULL,
        status TEXT NOT NULL DEFAULT 'active',
        created_at TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_comment_thread ON thread_comment(thread_id, status);
    CREATE INDEX IF NOT EXISTS idx_comment_parent ON thread_comment(parent_id, status);
    CREATE INDEX IF NOT EXISTS idx_comment_member ON thread_comment(member_id, status);
";

const COMMENT_COLUMNS: &str =
    "c.id, c.thread_id, c.member_id, c.parent_id, c.content, c.status, c.created_at";

/// Maps driver errors into the core error type
trait DbResultExt<T> {
    fn db(self, context: &str) -> Result<T>;
}

impl<T> DbResultExt<T> for rusqlite::Result<T> {
    fn db(self, context: &str) -> Result<T> {
        self.map_err(|e| ShelfError::internal(format!("{}: {}", context, e)))
    }
}

/// SQLite-backed store. Also serves as member directory and book catalog.
pub struct SqliteStore {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl SqliteStore {
    /// Open or create a database file and bring its schema up to date
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            if !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| {
                    ShelfError::Io(std::io::Error::new(
                        e.kind(),
                        format!("Failed to create database directory: {}", e),
                    ))
                })?;
                debug!("Created database directory: {:?}", parent);
            }
        }

        let conn = Connection::open(path).db("open database")?;
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get::<_, String>(0))
            .db("enable WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")
            .db("set synchronous")?;
        conn.busy_timeout(Duration::from_secs(5)).db("set busy timeout")?;

        let store = Self {
            conn: Mutex::new(conn),
            path: Some(path.to_path_buf()),
        };
        store.migrate()?;
        info!("Opened database at {}", path.display());
        Ok(store)
    }

    /// Private in-memory database, mainly for tests
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().db("open in-memory database")?;
        let store = Self {
            conn: Mutex::new(conn),
            path: None,
        };
        store.migrate()?;
        Ok(store)
    }

    /// Open the database in the platform data directory (~/.shelftalk as fallback)
    pub fn default_location() -> Result<Self> {
        Self::open(default_database_path())
    }

    /// Open the configured database, or the default location when unset
    pub fn from_config(config: &StorageConfig) -> Result<Self> {
        match &config.database {
            Some(path) => Self::open(path),
            None => Self::default_location(),
        }
    }

    /// Database file, `None` for in-memory stores
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Create missing tables and record the schema version
    pub fn migrate(&self) -> Result<()> {
        let conn = self.lock()?;
        let version: i64 = conn
            .pragma_query_value(None, "user_version", |row| row.get(0))
            .db("read schema version")?;

        if version > CURRENT_SCHEMA_VERSION {
            return Err(ShelfError::Config(format!(
                "Database schema version {} is newer than supported version {}",
                version, CURRENT_SCHEMA_VERSION
            )));
        }
        if version < CURRENT_SCHEMA_VERSION {
            info!(
                "Migrating database schema from version {} to {}",
                version, CURRENT_SCHEMA_VERSION
            );
        }

        conn.execute_batch(SCHEMA).db("create schema")?;
        conn.pragma_update(None, "user_version", CURRENT_SCHEMA_VERSION)
            .db("write schema version")?;
        Ok(())
    }

    /// Insert a member as Active, or update the nickname of a known one
    pub fn upsert_member(&self, member: MemberId, nickname: &str) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO member (id, nickname, status) VALUES (?1, ?2, 'active')
             ON CONFLICT(id) DO UPDATE SET nickname = excluded.nickname",
            params![member.get(), nickname],
        )
        .db("upsert member")?;
        debug!(member = %member, "Upserted member");
        Ok(())
    }

    /// Insert or replace a book's display metadata
    pub fn upsert_book(&self, summary: &BookSummary) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO book (id, title, author, publisher, cover) VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                author = excluded.author,
                publisher = excluded.publisher,
                cover = excluded.cover",
            params![
                summary.book_id.get(),
                summary.title,
                summary.author,
                summary.publisher,
                summary.cover,
            ],
        )
        .db("upsert book")?;
        debug!(book = %summary.book_id, "Upserted book");
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| ShelfError::internal("database connection lock poisoned"))
    }
}

/// `<data dir>/shelftalk.db`
pub fn default_database_path() -> PathBuf {
    directories::ProjectDirs::from("org", "shelftalk", "shelftalk")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".shelftalk")
        })
        .join(DATABASE_FILE)
}

impl SqliteStore {
    fn begin_with(&self, statement: &str) -> Result<Box<dyn UnitOfWork + '_>> {
        let conn = self.lock()?;
        conn.execute_batch(statement).db("begin transaction")?;
        Ok(Box::new(SqliteUnit {
            conn,
            finished: false,
        }))
    }
}

impl Storage for SqliteStore {
    fn begin(&self) -> Result<Box<dyn UnitOfWork + '_>> {
        self.begin_with("BEGIN IMMEDIATE")
    }

    /// Deferred, so readers in other processes never hold the write lock
    fn begin_read(&self) -> Result<Box<dyn UnitOfWork + '_>> {
        self.begin_with("BEGIN DEFERRED")
    }
}

/// Book ids as a JSON array for `json_each`, `None` for no restriction
fn book_set(books: Option<&[BookId]>) -> Result<Option<String>> {
    books
        .map(|books| {
            let ids: Vec<i64> = books.iter().map(|b| b.get()).collect();
            serde_json::to_string(&ids).map_err(ShelfError::from)
        })
        .transpose()
}

fn summary_from_row(row: &Row<'_>) -> rusqlite::Result<BookSummary> {
    Ok(BookSummary {
        book_id: BookId(row.get(0)?),
        title: row.get(1)?,
        author: row.get(2)?,
        publisher: row.get(3)?,
        cover: row.get(4)?,
    })
}

/// One transaction, rolled back unless committed
struct SqliteUnit<'a> {
    conn: MutexGuard<'a, Connection>,
    finished: bool,
}

impl Drop for SqliteUnit<'_> {
    fn drop(&mut self) {
        if !self.finished {
            if let Err(err) = self.conn.execute_batch("ROLLBACK") {
                warn!(error = %err, "Rollback failed");
            }
        }
    }
}

fn timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn conversion_error(idx: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, message.into())
}

fn parse_timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|at| at.with_timezone(&Utc))
        .map_err(|e| conversion_error(idx, format!("bad timestamp {}: {}", raw, e)))
}

fn count(raw: i64) -> u64 {
    u64::try_from(raw).unwrap_or(0)
}

fn sql_limit(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn thread_from_row(row: &Row<'_>) -> rusqlite::Result<Thread> {
    Ok(Thread {
        id: ThreadId(row.get(0)?),
        book_id: BookId(row.get(1)?),
        status: ThreadStatus::Active,
        created_at: parse_timestamp(row, 2)?,
    })
}

fn comment_from_row(row: &Row<'_>) -> rusqlite::Result<Comment> {
    let status: String = row.get(5)?;
    Ok(Comment {
        id: CommentId(row.get(0)?),
        thread_id: ThreadId(row.get(1)?),
        author: MemberId(row.get(2)?),
        parent: row.get::<_, Option<i64>>(3)?.map(CommentId),
        content: row.get(4)?,
        status: CommentStatus::parse(&status)
            .ok_or_else(|| conversion_error(5, format!("unknown comment status {}", status)))?,
        created_at: parse_timestamp(row, 6)?,
    })
}

impl SqliteUnit<'_> {
    fn query_comments(
        &self,
        sql: &str,
        args: impl rusqlite::Params,
        context: &str,
    ) -> Result<Vec<Comment>> {
        let mut stmt = self.conn.prepare(sql).db(context)?;
        let rows = stmt.query_map(args, comment_from_row).db(context)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().db(context)
    }
}

impl UnitOfWork for SqliteUnit<'_> {
    fn thread_for_book(&mut self, book: BookId) -> Result<Option<Thread>> {
        self.conn
            .query_row(
                "SELECT id, book_id, created_at FROM thread WHERE book_id = ?1",
                params![book.get()],
                thread_from_row,
            )
            .optional()
            .db("load thread for book")
    }

    fn insert_thread(&mut self, book: BookId, created_at: DateTime<Utc>) -> Result<Thread> {
        if self.thread_for_book(book)?.is_some() {
            return Err(ShelfError::Conflict(format!(
                "A thread already exists for book {}",
                book
            )));
        }
        self.conn
            .execute(
                "INSERT INTO thread (book_id, created_at) VALUES (?1, ?2)",
                params![book.get(), timestamp(&created_at)],
            )
            .db("insert thread")?;
        Ok(Thread {
            id: ThreadId(self.conn.last_insert_rowid()),
            book_id: book,
            status: ThreadStatus::Active,
            created_at,
        })
    }

    fn get_thread(&mut self, id: ThreadId) -> Result<Option<Thread>> {
        self.conn
            .query_row(
                "SELECT id, book_id, created_at FROM thread WHERE id = ?1",
                params![id.get()],
                thread_from_row,
            )
            .optional()
            .db("load thread")
    }

    fn delete_thread(&mut self, id: ThreadId) -> Result<bool> {
        let removed = self
            .conn
            .execute("DELETE FROM thread WHERE id = ?1", params![id.get()])
            .db("delete thread")?;
        Ok(removed > 0)
    }

    fn live_threads(
        &mut self,
        books: Option<&[BookId]>,
        cursor: Cursor,
    ) -> Result<(Vec<LiveThread>, u64)> {
        const LIVE: &str = "EXISTS (SELECT 1 FROM thread_comment c
                 WHERE c.thread_id = t.id AND c.status = 'active')
             AND (?1 IS NULL OR t.book_id IN (SELECT value FROM json_each(?1)))";

        let books = book_set(books)?;
        let total: i64 = self
            .conn
            .query_row(
                &format!("SELECT COUNT(*) FROM thread t WHERE {}", LIVE),
                params![books],
                |row| row.get(0),
            )
            .db("count live threads")?;

        let mut stmt = self
            .conn
            .prepare(&format!(
                "SELECT t.id, t.book_id, t.created_at,
                    (SELECT COUNT(DISTINCT c.member_id) FROM thread_comment c
                     WHERE c.thread_id = t.id AND c.status = 'active')
                 FROM thread t
                 WHERE {}
                 ORDER BY t.id DESC
                 LIMIT ?2 OFFSET ?3",
                LIVE
            ))
            .db("list live threads")?;
        let rows = stmt
            .query_map(
                params![books, sql_limit(cursor.limit), sql_limit(cursor.offset)],
                |row| {
                    Ok(LiveThread {
                        thread: thread_from_row(row)?,
                        participant_count: count(row.get(3)?),
                    })
                },
            )
            .db("list live threads")?;
        let rows = rows
            .collect::<rusqlite::Result<Vec<_>>>()
            .db("list live threads")?;
        Ok((rows, count(total)))
    }

    fn thread_stats(&mut self, id: ThreadId) -> Result<ThreadStats> {
        self.conn
            .query_row(
                "SELECT COUNT(DISTINCT member_id), COUNT(*) FROM thread_comment
                 WHERE thread_id = ?1 AND status = 'active'",
                params![id.get()],
                |row| {
                    Ok(ThreadStats {
                        participant_count: count(row.get(0)?),
                        comment_count: count(row.get(1)?),
                    })
                },
            )
            .db("thread stats")
    }

    fn insert_comment(&mut self, new: NewComment) -> Result<Comment> {
        self.conn
            .execute(
                "INSERT INTO thread_comment (thread_id, member_id, parent_id, content, status, created_at)
                 VALUES (?1, ?2, ?3, ?4, 'active', ?5)",
                params![
                    new.thread_id.get(),
                    new.author.get(),
                    new.parent.map(CommentId::get),
                    new.content,
                    timestamp(&new.created_at),
                ],
            )
            .db("insert comment")?;
        let id = CommentId(self.conn.last_insert_rowid());
        Ok(new.into_comment(id))
    }

    fn get_comment(&mut self, id: CommentId) -> Result<Option<Comment>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM thread_comment c WHERE c.id = ?1", COMMENT_COLUMNS),
                params![id.get()],
                comment_from_row,
            )
            .optional()
            .db("load comment")
    }

    fn deactivate_comment(&mut self, id: CommentId) -> Result<bool> {
        let changed = self
            .conn
            .execute(
                "UPDATE thread_comment SET status = 'inactive' WHERE id = ?1 AND status = 'active'",
                params![id.get()],
            )
            .db("deactivate comment")?;
        Ok(changed > 0)
    }

    fn deactivate_replies(&mut self, parent: CommentId) -> Result<usize> {
        self.conn
            .execute(
                "UPDATE thread_comment SET status = 'inactive'
                 WHERE parent_id = ?1 AND status = 'active'",
                params![parent.get()],
            )
            .db("deactivate replies")
    }

    fn deactivate_member_comments(&mut self, member: MemberId) -> Result<Vec<Comment>> {
        let mut changed = self.query_comments(
            &format!(
                "SELECT {} FROM thread_comment c
                 WHERE c.member_id = ?1 AND c.status = 'active' ORDER BY c.id",
                COMMENT_COLUMNS
            ),
            params![member.get()],
            "load member comments",
        )?;
        self.conn
            .execute(
                "UPDATE thread_comment SET status = 'inactive'
                 WHERE member_id = ?1 AND status = 'active'",
                params![member.get()],
            )
            .db("deactivate member comments")?;
        for comment in &mut changed {
            comment.status = CommentStatus::Inactive;
        }
        Ok(changed)
    }

    fn count_active_parents(&mut self, thread: ThreadId) -> Result<u64> {
        self.conn
            .query_row(
                "SELECT COUNT(*) FROM thread_comment
                 WHERE thread_id = ?1 AND parent_id IS NULL AND status = 'active'",
                params![thread.get()],
                |row| row.get::<_, i64>(0),
            )
            .map(count)
            .db("count active parents")
    }

    fn parent_comments(
        &mut self,
        thread: ThreadId,
        cursor: Cursor,
    ) -> Result<(Vec<ParentRow>, u64)> {
        let total = self.count_active_parents(thread)?;
        let mut stmt = self
            .conn
            .prepare(&format!(
                "SELECT {},
                    (SELECT COUNT(*) FROM thread_comment r
                     WHERE r.parent_id = c.id AND r.status = 'active')
                 FROM thread_comment c
                 WHERE c.thread_id = ?1 AND c.parent_id IS NULL AND c.status = 'active'
                 ORDER BY c.created_at DESC, c.id DESC
                 LIMIT ?2 OFFSET ?3",
                COMMENT_COLUMNS
            ))
            .db("list parent comments")?;
        let rows = stmt
            .query_map(
                params![thread.get(), sql_limit(cursor.limit), sql_limit(cursor.offset)],
                |row| {
                    Ok(ParentRow {
                        comment: comment_from_row(row)?,
                        reply_count: count(row.get(7)?),
                    })
                },
            )
            .db("list parent comments")?;
        let rows = rows
            .collect::<rusqlite::Result<Vec<_>>>()
            .db("list parent comments")?;
        Ok((rows, total))
    }

    fn replies(&mut self, parent: CommentId) -> Result<Vec<Comment>> {
        self.query_comments(
            &format!(
                "SELECT {} FROM thread_comment c
                 WHERE c.parent_id = ?1 AND c.status = 'active'
                 ORDER BY c.created_at ASC, c.id ASC",
                COMMENT_COLUMNS
            ),
            params![parent.get()],
            "list replies",
        )
    }

    fn purge_empty_threads(&mut self, limit: usize) -> Result<usize> {
        self.conn
            .execute(
                "DELETE FROM thread WHERE id IN (
                    SELECT t.id FROM thread t
                    WHERE NOT EXISTS (
                        SELECT 1 FROM thread_comment c
                        WHERE c.thread_id = t.id AND c.status = 'active'
                    )
                    ORDER BY t.id
                    LIMIT ?1
                 )",
                params![sql_limit(limit as u64)],
            )
            .db("purge empty threads")
    }

    fn purge_orphan_comments(&mut self, limit: usize) -> Result<usize> {
        self.conn
            .execute(
                "DELETE FROM thread_comment WHERE id IN (
                    SELECT c.id FROM thread_comment c
                    WHERE NOT EXISTS (SELECT 1 FROM thread t WHERE t.id = c.thread_id)
                    ORDER BY c.id
                    LIMIT ?1
                 )",
                params![sql_limit(limit as u64)],
            )
            .db("purge orphan comments")
    }

    fn commit(mut self: Box<Self>) -> Result<()> {
        self.conn.execute_batch("COMMIT").db("commit")?;
        self.finished = true;
        Ok(())
    }
}

impl MemberGate for SqliteStore {
    fn status(&self, member: MemberId) -> Result<Option<MemberStatus>> {
        let conn = self.lock()?;
        let raw: Option<String> = conn
            .query_row(
                "SELECT status FROM member WHERE id = ?1",
                params![member.get()],
                |row| row.get(0),
            )
            .optional()
            .db("load member status")?;
        raw.map(|s| {
            MemberStatus::parse(&s)
                .ok_or_else(|| ShelfError::internal(format!("unknown member status {}", s)))
        })
        .transpose()
    }

    fn nickname(&self, member: MemberId) -> Result<Option<String>> {
        let conn = self.lock()?;
        conn.query_row(
            "SELECT nickname FROM member WHERE id = ?1",
            params![member.get()],
            |row| row.get(0),
        )
        .optional()
        .db("load member nickname")
    }
}

impl MemberDirectory for SqliteStore {
    fn set_status(&self, member: MemberId, status: MemberStatus) -> Result<()> {
        let conn = self.lock()?;
        let changed = conn
            .execute(
                "UPDATE member SET status = ?2 WHERE id = ?1",
                params![member.get(), status.as_str()],
            )
            .db("update member status")?;
        if changed == 0 {
            return Err(ShelfError::NotFound(format!("member {}", member)));
        }
        Ok(())
    }
}

impl BookCatalog for SqliteStore {
    fn summary(&self, book: BookId) -> Result<Option<BookSummary>> {
        let conn = self.lock()?;
        conn.query_row(
            "SELECT id, title, author, publisher, cover FROM book WHERE id = ?1",
            params![book.get()],
            summary_from_row,
        )
        .optional()
        .db("load book")
    }

    fn search(&self, query: &str) -> Result<Vec<BookId>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(
                "SELECT id FROM book
                 WHERE instr(lower(title), ?1) > 0 OR instr(lower(author), ?1) > 0
                 ORDER BY id",
            )
            .db("search books")?;
        let rows = stmt
            .query_map(params![query.trim().to_lowercase()], |row| {
                Ok(BookId(row.get(0)?))
            })
            .db("search books")?;
        rows.collect::<rusqlite::Result<Vec<_>>>().db("search books")
    }

    fn summaries(&self, books: &[BookId]) -> Result<HashMap<BookId, BookSummary>> {
        let books = book_set(Some(books))?;
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(
                "SELECT id, title, author, publisher, cover FROM book
                 WHERE id IN (SELECT value FROM json_each(?1))",
            )
            .db("load books")?;
        let rows = stmt
            .query_map(params![books], summary_from_row)
            .db("load books")?;
        rows.map(|row| row.map(|summary| (summary.book_id, summary)))
            .collect::<rusqlite::Result<HashMap<_, _>>>()
            .db("load books")
    }
}
