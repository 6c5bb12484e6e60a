//! Thread data models

use crate::directory::BookSummary;
use crate::types::{BookId, ThreadId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Thread lifecycle. `Removed` threads are deleted from the store, so only
/// `Active` is ever read back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ThreadStatus {
    #[default]
    Active,
    Removed,
}

/// A discussion bound to exactly one book
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thread {
    pub id: ThreadId,
    pub book_id: BookId,
    pub status: ThreadStatus,
    pub created_at: DateTime<Utc>,
}

/// Aggregates over a thread's Active comments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ThreadStats {
    /// Distinct authors of Active comments
    pub participant_count: u64,
    /// Active comments, top-level and replies
    pub comment_count: u64,
}

/// Store row for listings: a thread with at least one Active comment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveThread {
    pub thread: Thread,
    pub participant_count: u64,
}

/// Thread entry in a listing page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadListing {
    pub thread_id: ThreadId,
    pub book_id: BookId,
    pub book: Option<BookSummary>,
    pub participant_count: u64,
    pub created_at: DateTime<Utc>,
}

/// One page of threads plus the size of the filtered set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadPage {
    pub threads: Vec<ThreadListing>,
    pub total_count: u64,
}

/// Thread metadata with its counts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadDetail {
    pub thread: Thread,
    pub book: Option<BookSummary>,
    pub participant_count: u64,
    pub comment_count: u64,
}
