//! Collaborator interfaces: member directory and book catalog
//!
//! Members and books are owned by the surrounding platform. The discussion
//! core only reads a member's status and nickname and a book's display
//! metadata; the withdrawal workflow is the single place that writes a
//! member's status.

use crate::error::{Result, ShelfError};
use crate::types::{BookId, MemberId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Membership status as seen by the discussion core
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberStatus {
    Active,
    Inactive,
}

impl MemberStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberStatus::Active => "active",
            MemberStatus::Inactive => "inactive",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(MemberStatus::Active),
            "inactive" => Some(MemberStatus::Inactive),
            _ => None,
        }
    }
}

/// Read access to member identity and status
pub trait MemberGate: Send + Sync {
    /// Status of a member, `None` if unknown
    fn status(&self, member: MemberId) -> Result<Option<MemberStatus>>;

    /// Display nickname of a member
    fn nickname(&self, member: MemberId) -> Result<Option<String>>;

    /// Whether the member is known and active
    fn is_active(&self, member: MemberId) -> Result<bool> {
        Ok(self.status(member)? == Some(MemberStatus::Active))
    }
}

/// Fail with `Authorization` unless the member is known and active
pub fn require_active(members: &dyn MemberGate, member: MemberId) -> Result<()> {
    if members.is_active(member)? {
        Ok(())
    } else {
        tracing::warn!(member = %member, "Rejected request from inactive or unknown member");
        Err(ShelfError::Authorization(format!(
            "Member {} is not an active member",
            member
        )))
    }
}

/// Member directory that can also change a member's status
pub trait MemberDirectory: MemberGate {
    fn set_status(&self, member: MemberId, status: MemberStatus) -> Result<()>;
}

/// Display metadata for a book
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookSummary {
    pub book_id: BookId,
    pub title: String,
    pub author: String,
    #[serde(default)]
    pub publisher: Option<String>,
    #[serde(default)]
    pub cover: Option<String>,
}

impl BookSummary {
    /// Case-insensitive substring match against title or author
    pub fn matches(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return true;
        }
        self.title.to_lowercase().contains(&query) || self.author.to_lowercase().contains(&query)
    }
}

/// Read access to the book catalog
pub trait BookCatalog: Send + Sync {
    fn summary(&self, book: BookId) -> Result<Option<BookSummary>>;

    /// Books whose title or author contains `query`, case-insensitively
    fn search(&self, query: &str) -> Result<Vec<BookId>>;

    /// Summaries for a batch of books; unknown books are absent from the map
    fn summaries(&self, books: &[BookId]) -> Result<HashMap<BookId, BookSummary>> {
        let mut found = HashMap::with_capacity(books.len());
        for &book in books {
            if let Some(summary) = self.summary(book)? {
                found.insert(book, summary);
            }
        }
        Ok(found)
    }
}
