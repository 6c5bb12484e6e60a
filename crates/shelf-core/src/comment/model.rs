//! Comment data models

use crate::types::{CommentId, MemberId, ThreadId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Comment lifecycle; `Inactive` is terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CommentStatus {
    #[default]
    Active,
    Inactive,
}

impl CommentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommentStatus::Active => "active",
            CommentStatus::Inactive => "inactive",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(CommentStatus::Active),
            "inactive" => Some(CommentStatus::Inactive),
            _ => None,
        }
    }
}

/// A top-level comment or a one-level reply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub thread_id: ThreadId,
    pub author: MemberId,
    /// Parent comment for replies, `None` for top-level comments
    pub parent: Option<CommentId>,
    pub content: String,
    pub status: CommentStatus,
    pub created_at: DateTime<Utc>,
}

impl Comment {
    pub fn is_reply(&self) -> bool {
        self.parent.is_some()
    }

    pub fn is_active(&self) -> bool {
        self.status == CommentStatus::Active
    }
}

/// Insert payload; the store assigns the identifier
#[derive(Debug, Clone)]
pub struct NewComment {
    pub thread_id: ThreadId,
    pub author: MemberId,
    pub parent: Option<CommentId>,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl NewComment {
    /// Top-level comment stamped now
    pub fn top_level(thread_id: ThreadId, author: MemberId, content: impl Into<String>) -> Self {
        Self {
            thread_id,
            author,
            parent: None,
            content: content.into(),
            created_at: Utc::now(),
        }
    }

    /// Reply stamped now
    pub fn reply(
        thread_id: ThreadId,
        parent: CommentId,
        author: MemberId,
        content: impl Into<String>,
    ) -> Self {
        Self {
            thread_id,
            author,
            parent: Some(parent),
            content: content.into(),
            created_at: Utc::now(),
        }
    }

    /// Materialize with an assigned id, always Active
    pub fn into_comment(self, id: CommentId) -> Comment {
        Comment {
            id,
            thread_id: self.thread_id,
            author: self.author,
            parent: self.parent,
            content: self.content,
            status: CommentStatus::Active,
            created_at: self.created_at,
        }
    }
}

/// Top-level comment row with its Active reply count
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentRow {
    pub comment: Comment,
    pub reply_count: u64,
}

/// Comment as returned to readers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentView {
    #[serde(flatten)]
    pub comment: Comment,
    pub nickname: Option<String>,
    /// Active replies; only present for top-level comments
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_count: Option<u64>,
}

/// One page of top-level comments
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentPage {
    pub comments: Vec<CommentView>,
    pub has_more: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_comment_materializes_active() {
        let comment = NewComment::reply(ThreadId(1), CommentId(3), MemberId(9), "a reply here")
            .into_comment(CommentId(4));
        assert!(comment.is_reply());
        assert!(comment.is_active());
        assert_eq!(comment.parent, Some(CommentId(3)));
    }

    #[test]
    fn test_status_strings() {
        assert_eq!(CommentStatus::parse("inactive"), Some(CommentStatus::Inactive));
        assert_eq!(CommentStatus::Active.as_str(), "active");
        assert_eq!(CommentStatus::parse("true"), None);
    }

    #[test]
    fn test_view_serialization_flattens_comment() {
        let comment = NewComment::top_level(ThreadId(1), MemberId(7), "first post")
            .into_comment(CommentId(1));
        let view = CommentView {
            comment,
            nickname: Some("reader".to_string()),
            reply_count: Some(2),
        };
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["content"], "first post");
        assert_eq!(json["reply_count"], 2);
        assert_eq!(json["status"], "active");
    }
}
